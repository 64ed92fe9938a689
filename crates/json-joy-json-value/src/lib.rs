//! Tagged-union JSON value model: dual-tag [`Number`], [`Value`], a
//! recoverable recursive-descent [`parser`], and a configurable
//! [`serializer`]. Owned data throughout, `thiserror` error enums, no
//! panics on malformed input.

pub mod error;
pub mod number;
pub mod parser;
pub mod serializer;
pub mod value;

pub use error::{ErrorCode, JsonError, JsonResult, NumberError};
pub use number::{Number, SAFE_INTEGER_MAX, SAFE_INTEGER_MIN};
pub use parser::{parse, parse_with, ParseOptions};
pub use serializer::{serialize, SerializeOptions};
pub use value::{Array, Object, Value};
