//! Facade crate: re-exports the value model, JSON Pointer, and JSONPath
//! engine crates under one name.

pub use json_joy_json_path as json_path;
pub use json_joy_json_pointer as json_pointer;
pub use json_joy_json_value as json_value;

pub use json_joy_json_path::{
    GenState, GeneratorOptions, GeneratorStrategy, JsonFilter, JsonPath, JsonPathException, LazyGenerator,
    PathEvaluator, QueryMatch, QueryOptions, QueryResult,
};
pub use json_joy_json_pointer::{find, get, JsonPointerError};
pub use json_joy_json_value::{parse, serialize, ErrorCode, Number, SerializeOptions, Value};
