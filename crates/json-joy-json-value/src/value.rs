//! Tagged-union JSON value: null, bool, number, string, array, object.
//!
//! Object children are kept in an `IndexMap` so that iteration order
//! always matches insertion order.

use crate::error::{ErrorCode, JsonError, JsonResult};
use crate::number::Number;
use indexmap::IndexMap;
use std::sync::OnceLock;

pub type Array = Vec<Value>;
pub type Object = IndexMap<String, Value>;

/// The central sum type: exactly one variant is inhabited at all times.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Array),
    Object(Object),
}

fn null_sentinel() -> &'static Value {
    static NULL: OnceLock<Value> = OnceLock::new();
    NULL.get_or_init(|| Value::Null)
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    // -- type queries --------------------------------------------------

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_integer())
    }
    pub fn is_double(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_double())
    }
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }
    pub fn is_infinity(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_infinity())
    }
    pub fn is_finite(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_finite())
    }

    /// Element/key count; `0` for scalar variants.
    pub fn size(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => true,
        }
    }

    // -- safe accessors (never panic) -----------------------------------

    pub fn get_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_double()),
            _ => None,
        }
    }

    pub fn get_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_integer(),
            _ => None,
        }
    }

    pub fn get_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn get_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn get_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn get_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    // -- defaulted accessors ---------------------------------------------

    pub fn to_bool(&self, default: bool) -> bool {
        self.get_bool().unwrap_or(default)
    }
    pub fn to_int(&self, default: i32) -> i32 {
        self.get_integer()
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(default)
    }
    pub fn to_long_long(&self, default: i64) -> i64 {
        self.get_integer().unwrap_or(default)
    }
    pub fn to_double(&self, default: f64) -> f64 {
        self.get_number().unwrap_or(default)
    }
    pub fn to_string_or(&self, default: &str) -> String {
        self.get_string().map(str::to_string).unwrap_or_else(|| default.to_string())
    }

    // -- array operations --------------------------------------------------

    pub fn append(&mut self, value: Value) {
        if !self.is_array() {
            *self = Value::array();
        }
        if let Value::Array(a) = self {
            a.push(value);
        }
    }

    /// Read-only indexed access; out-of-range reads return the shared null
    /// sentinel rather than panicking.
    pub fn index(&self, i: usize) -> &Value {
        match self {
            Value::Array(a) => a.get(i).unwrap_or_else(|| null_sentinel()),
            _ => null_sentinel(),
        }
    }

    /// Write access that grows the array (replacing a non-array variant
    /// with an empty array first) so that `index_mut(i)` is always valid.
    pub fn index_mut(&mut self, i: usize) -> &mut Value {
        if !self.is_array() {
            *self = Value::array();
        }
        let arr = match self {
            Value::Array(a) => a,
            _ => unreachable!(),
        };
        if i >= arr.len() {
            arr.resize_with(i + 1, || Value::Null);
        }
        &mut arr[i]
    }

    // -- object operations -------------------------------------------------

    /// Read-only key access; missing keys return the shared null sentinel.
    pub fn field(&self, key: &str) -> &Value {
        match self {
            Value::Object(o) => o.get(key).unwrap_or_else(|| null_sentinel()),
            _ => null_sentinel(),
        }
    }

    /// Write access that inserts (replacing a non-object variant with an
    /// empty object first).
    pub fn field_mut(&mut self, key: &str) -> &mut Value {
        if !self.is_object() {
            *self = Value::object();
        }
        let obj = match self {
            Value::Object(o) => o,
            _ => unreachable!(),
        };
        obj.entry(key.to_string()).or_insert(Value::Null)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self, Value::Object(o) if o.contains_key(key))
    }

    pub fn erase(&mut self, key: &str) -> bool {
        match self {
            Value::Object(o) => o.shift_remove(key).is_some(),
            _ => false,
        }
    }

    // -- JSON Pointer navigation (RFC 6901) ---------------------------------

    /// Navigate a `/`-separated pointer; `~1` decodes to `/`, `~0` to `~`.
    pub fn at(&self, pointer: &str) -> JsonResult<&Value> {
        if pointer.is_empty() {
            return Ok(self);
        }
        if !pointer.starts_with('/') {
            return Err(JsonError::new(
                ErrorCode::OutOfRange,
                "JSON pointer must be empty or start with '/'",
            ));
        }
        let mut current = self;
        for raw_token in pointer.split('/').skip(1) {
            let token = unescape_pointer_token(raw_token);
            current = match current {
                Value::Object(o) => o.get(&token).ok_or_else(|| {
                    JsonError::new(ErrorCode::OutOfRange, format!("no such key: {token}"))
                })?,
                Value::Array(a) => {
                    let idx = parse_canonical_array_index(&token).ok_or_else(|| {
                        JsonError::new(
                            ErrorCode::TypeError,
                            format!("not a canonical array index: {token}"),
                        )
                    })?;
                    a.get(idx).ok_or_else(|| {
                        JsonError::new(ErrorCode::OutOfRange, format!("index out of range: {idx}"))
                    })?
                }
                _ => {
                    return Err(JsonError::new(
                        ErrorCode::TypeError,
                        "cannot navigate into a scalar value",
                    ))
                }
            };
        }
        Ok(current)
    }

    /// No-throw variant: returns an error code and message instead of
    /// `Result`'s `Err`, for call sites mirroring the original's
    /// out-parameter API.
    pub fn at_safe(&self, pointer: &str) -> (ErrorCode, Option<&Value>, String) {
        match self.at(pointer) {
            Ok(v) => (ErrorCode::Success, Some(v), String::new()),
            Err(e) => (e.code, None, e.message),
        }
    }
}

fn unescape_pointer_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

fn parse_canonical_array_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    token.parse::<usize>().ok()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}
macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Number(Number::from(v))
            }
        })*
    };
}
impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
