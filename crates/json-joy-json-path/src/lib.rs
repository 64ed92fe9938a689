//! Tokenizer, parser, evaluator, filter engine, and lazy generator for
//! JSONPath queries over a [`json_joy_json_value::Value`] tree.

pub mod ast;
pub mod error;
pub mod eval;
pub mod filter;
pub mod json_filter;
pub mod lazy;
pub mod path_parser;
pub mod tokenizer;

pub use ast::{PathNode, UnionKind};
pub use error::{JsonPathException, JsonPathResult};
pub use eval::{MutableQueryResult, PathEvaluator, QueryResult};
pub use filter::{clear_methods, register_method};
pub use json_filter::{JsonFilter, QueryMatch, QueryOptions};
pub use lazy::{GenState, GeneratorOptions, GeneratorStrategy, LazyGenerator};
pub use path_parser::JsonPath;
