//! JSON Pointer (RFC 6901) utilities over `json-joy-json-value::Value`.
//!
//! `find`/`get` are thin wrappers over `Value::at`, which implements RFC
//! 6901 navigation (`~1` -> `/`, `~0` -> `~`, canonical-integer array
//! indices only).

use json_joy_json_value::{ErrorCode, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("json pointer must be absolute or empty")]
    NotAbsolute,
}

/// Unescapes one JSON Pointer token component.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes one JSON Pointer token component.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse RFC6901 absolute pointer into unescaped path components.
///
/// Examples:
/// - `"" -> []`
/// - `"/" -> [""]`
/// - `"/a~1b/~0k/0" -> ["a/b", "~k", "0"]`
pub fn parse_json_pointer(pointer: &str) -> Result<Vec<String>, JsonPointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(JsonPointerError::NotAbsolute);
    }
    Ok(pointer.split('/').skip(1).map(unescape_component).collect())
}

/// Parse pointer with the convenience behavior that relative strings are
/// accepted by prefixing `/`.
pub fn parse_json_pointer_relaxed(pointer: &str) -> Result<Vec<String>, JsonPointerError> {
    if pointer.starts_with('/') || pointer.is_empty() {
        return parse_json_pointer(pointer);
    }
    let mut absolute = String::with_capacity(pointer.len() + 1);
    absolute.push('/');
    absolute.push_str(pointer);
    parse_json_pointer(&absolute)
}

/// Format unescaped path components into an RFC6901 pointer.
pub fn format_json_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Navigate `root` by `pointer`, returning `None` rather than an error on
/// any failure to resolve (missing key, out-of-range index, or navigation
/// into a scalar).
pub fn find<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    root.at(pointer).ok()
}

/// Navigate `root` by `pointer`, surfacing the `(code, message)` on
/// failure, mirroring `Value::at_safe`.
pub fn get<'a>(root: &'a Value, pointer: &str) -> Result<&'a Value, (ErrorCode, String)> {
    root.at(pointer).map_err(|e| (e.code, e.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_matrix() {
        assert_eq!(parse_json_pointer("").unwrap(), Vec::<String>::new());
        assert_eq!(parse_json_pointer("/").unwrap(), vec![String::new()]);
        assert_eq!(
            parse_json_pointer("/a~0b/c~1d/1").unwrap(),
            vec!["a~b".to_string(), "c/d".to_string(), "1".to_string()]
        );
        assert_eq!(
            format_json_pointer(&["a~b".to_string(), "c/d".to_string(), "1".to_string()]),
            "/a~0b/c~1d/1"
        );
        assert_eq!(
            parse_json_pointer_relaxed("foo/bar").unwrap(),
            vec!["foo", "bar"]
        );
    }

    #[test]
    fn find_resolves_nested_value() {
        let mut root = Value::object();
        *root.field_mut("a") = Value::array();
        root.field_mut("a").append(Value::from(1i64));
        assert_eq!(find(&root, "/a/0").and_then(|v| v.get_integer()), Some(1));
        assert_eq!(find(&root, "/a/9"), None);
    }

    #[test]
    fn get_surfaces_error_code() {
        let root = Value::object();
        let err = get(&root, "/missing").unwrap_err();
        assert_eq!(err.0, ErrorCode::OutOfRange);
    }
}
