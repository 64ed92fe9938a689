//! evaluates the inner text of a `?( ... )` filter expression against
//! one context (`@`) value.
//!
//! Precedence, highest to lowest: parenthesization, method call, property
//! access, unary predicate, comparison/`=~`/`in`, `&&`, `||`. Unrecognized
//! syntax evaluates to `false` rather than erroring — evaluation of a
//! successfully parsed path never throws.

use json_joy_json_value::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

pub type FilterMethod = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

static REGISTRY: OnceLock<Mutex<HashMap<String, FilterMethod>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, FilterMethod>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers a named filter method, process-wide. Last registration for a
/// given name wins; not intended to race with concurrent evaluation.
pub fn register_method(name: impl Into<String>, f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) {
    registry().lock().unwrap().insert(name.into(), Arc::new(f));
}

pub fn clear_methods() {
    registry().lock().unwrap().clear();
}

fn call_user_method(name: &str, value: &Value) -> Option<Value> {
    registry().lock().unwrap().get(name).and_then(|f| f(value))
}

pub fn eval_filter(expr: &str, context: &Value) -> bool {
    let expr = trim_outer_parens(expr);

    if let Some(pos) = find_top_level(expr, "||") {
        let (left, right) = (&expr[..pos], &expr[pos + 2..]);
        return eval_filter(left, context) || eval_filter(right, context);
    }
    if let Some(pos) = find_top_level(expr, "&&") {
        let (left, right) = (&expr[..pos], &expr[pos + 2..]);
        return eval_filter(left, context) && eval_filter(right, context);
    }
    if let Some(result) = try_nested_filter(expr, context) {
        return result;
    }
    if let Some(pos) = find_top_level(expr, "=~") {
        return eval_regex_match(&expr[..pos], &expr[pos + 2..], context);
    }
    if let Some(pos) = find_top_level(expr, " in ") {
        return eval_membership(&expr[..pos], &expr[pos + 4..], context);
    }
    eval_comparison(expr, context)
}

fn trim_outer_parens(s: &str) -> &str {
    let t = s.trim();
    if t.len() >= 2 && t.starts_with('(') && t.ends_with(')') {
        let bytes = t.as_bytes();
        let mut depth = 0i32;
        for (i, &c) in bytes.iter().enumerate() {
            match c {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 && i != bytes.len() - 1 {
                        return t;
                    }
                }
                _ => {}
            }
        }
        return t[1..t.len() - 1].trim();
    }
    t
}

/// Leftmost occurrence of `needle` at bracket/paren depth 0, outside
/// quoted strings.
fn find_top_level(s: &str, needle: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let nbytes = needle.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' => quote = Some(c),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i + nbytes.len() <= bytes.len() && &bytes[i..i + nbytes.len()] == nbytes {
            return Some(i);
        }
        i += 1;
    }
    None
}

enum AccessSeg {
    Key(String),
    Index(i64),
}

/// Parses `@.a.b['c'][2]` (optionally terminated by `.method()`) into
/// segments plus an optional terminal method name.
fn parse_access(s: &str) -> Option<(Vec<AccessSeg>, Option<String>)> {
    let s = s.trim();
    if !s.starts_with('@') {
        return None;
    }
    let rest = &s[1..];
    let bytes = rest.as_bytes();
    let mut i = 0;
    let mut segs = Vec::new();
    let mut method = None;

    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i] != b'.' && bytes[i] != b'[' && bytes[i] != b'(' {
                    i += 1;
                }
                let name = &rest[start..i];
                if bytes.get(i) == Some(&b'(') {
                    if bytes.get(i + 1) == Some(&b')') {
                        method = Some(name.to_string());
                        i += 2;
                    } else {
                        return None;
                    }
                } else {
                    segs.push(AccessSeg::Key(name.to_string()));
                }
            }
            b'[' => {
                i += 1;
                match bytes.get(i) {
                    Some(b'\'') | Some(b'"') => {
                        let quote = bytes[i];
                        i += 1;
                        let start = i;
                        while i < bytes.len() && bytes[i] != quote {
                            i += 1;
                        }
                        segs.push(AccessSeg::Key(rest[start..i].to_string()));
                        i += 1;
                    }
                    _ => {
                        let start = i;
                        if bytes.get(i) == Some(&b'-') {
                            i += 1;
                        }
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                        let n: i64 = rest[start..i].parse().ok()?;
                        segs.push(AccessSeg::Index(n));
                    }
                }
                if bytes.get(i) != Some(&b']') {
                    return None;
                }
                i += 1;
            }
            _ => return None,
        }
    }
    Some((segs, method))
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let l = len as i64;
    let n = if i < 0 { l + i } else { i };
    (n >= 0 && n < l).then_some(n as usize)
}

/// Resolves an access path against `context`, returning an owned `Value`
/// (terminal methods synthesize a fresh scalar, so this can't stay a
/// borrow of `context`).
fn resolve_access(s: &str, context: &Value) -> Option<Value> {
    let (segs, method) = parse_access(s)?;
    let mut current = context;
    for seg in &segs {
        current = match seg {
            AccessSeg::Key(k) => current.get_object()?.get(k)?,
            AccessSeg::Index(i) => {
                let arr = current.get_array()?;
                &arr[normalize_index(*i, arr.len())?]
            }
        };
    }
    match method {
        Some(name) => apply_method(&name, current),
        None => Some(current.clone()),
    }
}

fn apply_method(name: &str, value: &Value) -> Option<Value> {
    match name {
        "length" => match value {
            Value::String(s) => Some(Value::from(s.chars().count() as i64)),
            Value::Array(a) => Some(Value::from(a.len() as i64)),
            Value::Object(o) => Some(Value::from(o.len() as i64)),
            _ => None,
        },
        "max" => match value {
            Value::Array(a) => {
                let mut best: Option<f64> = None;
                for item in a {
                    if let Some(n) = item.get_number() {
                        best = Some(best.map_or(n, |b| b.max(n)));
                    }
                }
                best.map(Value::from)
            }
            _ => None,
        },
        // Preserved quirk: sum() on a string returns its character length.
        "sum" => match value {
            Value::String(s) => Some(Value::from(s.chars().count() as i64)),
            Value::Array(a) => {
                let mut total = 0.0;
                let mut any = false;
                for item in a {
                    if let Some(n) = item.get_number() {
                        total += n;
                        any = true;
                    }
                }
                any.then(|| Value::from(total))
            }
            _ => None,
        },
        other => call_user_method(other, value),
    }
}

fn parse_literal(s: &str) -> Option<Value> {
    let s = s.trim();
    match s {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }
    if s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')))
    {
        return Some(Value::String(s[1..s.len() - 1].to_string()));
    }
    s.parse::<f64>().ok().map(Value::from)
}

fn compare_values(left: &Value, op: &str, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => match op {
            "==" => a == b,
            "!=" => a != b,
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            ">=" => a >= b,
            _ => false,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            "==" => a == b,
            "!=" => a != b,
            _ => false,
        },
        (Value::Null, Value::Null) => op == "==",
        (Value::Null, _) | (_, Value::Null) => op == "!=",
        _ => {
            let (Some(a), Some(b)) = (left.get_number(), right.get_number()) else {
                return false;
            };
            match op {
                "==" => (a - b).abs() < 1e-9,
                "!=" => (a - b).abs() >= 1e-9,
                "<" => a < b,
                "<=" => a <= b,
                ">" => a > b,
                ">=" => a >= b,
                _ => false,
            }
        }
    }
}

fn eval_comparison(expr: &str, context: &Value) -> bool {
    let expr = expr.trim();
    for op in ["==", "!=", "<=", ">="] {
        if let Some(pos) = find_top_level(expr, op) {
            let resolved = resolve_access(expr[..pos].trim(), context);
            let literal = parse_literal(&expr[pos + op.len()..]);
            return match (resolved, literal) {
                (Some(v), Some(lit)) => compare_values(&v, op, &lit),
                _ => false,
            };
        }
    }
    for op in ["<", ">"] {
        if let Some(pos) = find_top_level(expr, op) {
            let resolved = resolve_access(expr[..pos].trim(), context);
            let literal = parse_literal(&expr[pos + 1..]);
            return match (resolved, literal) {
                (Some(v), Some(lit)) => compare_values(&v, op, &lit),
                _ => false,
            };
        }
    }
    resolve_access(expr, context).is_some()
}

fn eval_regex_match(left: &str, right: &str, context: &Value) -> bool {
    let Some(Value::String(s)) = resolve_access(left.trim(), context) else {
        return false;
    };
    let pattern_raw = right.trim();
    if pattern_raw.len() < 2 || !pattern_raw.starts_with('/') || !pattern_raw.ends_with('/') {
        return false;
    }
    let pattern = pattern_raw[1..pattern_raw.len() - 1].replace("\\/", "/");
    match regex::Regex::new(&pattern) {
        Ok(re) => re.is_match(&s),
        Err(_) => false,
    }
}

fn eval_membership(left: &str, right: &str, context: &Value) -> bool {
    let left = left.trim();
    if left.len() < 2 || !((left.starts_with('\'') && left.ends_with('\'')) || (left.starts_with('"') && left.ends_with('"')))
    {
        return false;
    }
    let needle = &left[1..left.len() - 1];
    match resolve_access(right.trim(), context) {
        Some(Value::Array(items)) => items.iter().any(|item| item.get_string() == Some(needle)),
        _ => false,
    }
}

fn try_nested_filter(expr: &str, context: &Value) -> Option<bool> {
    let t = expr.trim();
    if !t.starts_with('@') {
        return None;
    }
    let idx = t.find("[?(")?;
    let access_str = &t[..idx];
    let rest = &t[idx + 3..];

    let bytes = rest.as_bytes();
    let mut depth = 1i32;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    let mut close_idx = None;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' => quote = Some(c),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close_idx = Some(i);
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    let close_idx = close_idx?;
    let sub_expr = &rest[..close_idx];
    if rest[close_idx + 1..].trim() != "]" {
        return None;
    }

    match resolve_access(access_str, context) {
        Some(Value::Array(items)) => Some(items.iter().any(|item| eval_filter(sub_expr, item))),
        Some(_) => Some(false),
        None => Some(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_json_value::parse;

    #[test]
    fn numeric_comparison_with_tolerance() {
        let ctx = parse(r#"{"price": 10}"#).unwrap();
        assert!(eval_filter("@.price < 20", &ctx));
        assert!(eval_filter("@.price == 10", &ctx));
        assert!(!eval_filter("@.price > 20", &ctx));
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let ctx = parse(r#"{"name": "bob"}"#).unwrap();
        assert!(eval_filter("@.name == 'bob'", &ctx));
        assert!(eval_filter("@.name < 'carl'", &ctx));
    }

    #[test]
    fn existence_check_has_no_operator() {
        let ctx = parse(r#"{"tags": ["a"]}"#).unwrap();
        assert!(eval_filter("@.tags", &ctx));
        assert!(!eval_filter("@.missing", &ctx));
    }

    #[test]
    fn logical_and_or_short_circuit_structure() {
        let ctx = parse(r#"{"a": 1, "b": 2}"#).unwrap();
        assert!(eval_filter("@.a == 1 && @.b == 2", &ctx));
        assert!(eval_filter("@.a == 9 || @.b == 2", &ctx));
        assert!(!eval_filter("@.a == 9 && @.b == 2", &ctx));
    }

    #[test]
    fn membership_and_regex_operators() {
        let ctx = parse(r#"{"tags": ["red", "blue"], "email": "a@b.com"}"#).unwrap();
        assert!(eval_filter("'red' in @.tags", &ctx));
        assert!(!eval_filter("'green' in @.tags", &ctx));
        assert!(eval_filter(r"@.email =~ /^[a-z]+@[a-z]+\.com$/", &ctx));
    }

    #[test]
    fn length_max_and_sum_methods() {
        let ctx = parse(r#"{"tags": ["a", "b", "c"], "nums": [1, 2, 3], "name": "hello"}"#).unwrap();
        assert!(eval_filter("@.tags.length() == 3", &ctx));
        assert!(eval_filter("@.nums.max() == 3", &ctx));
        assert!(eval_filter("@.name.sum() == 5", &ctx));
    }

    #[test]
    fn nested_filter_matches_if_any_element_matches() {
        let ctx = parse(r#"{"items": [{"price": 5}, {"price": 50}]}"#).unwrap();
        assert!(eval_filter("@.items[?(@.price > 10)]", &ctx));
        assert!(!eval_filter("@.items[?(@.price > 100)]", &ctx));
    }

    #[test]
    fn unrecognized_syntax_is_false_not_an_error() {
        let ctx = parse("{}").unwrap();
        assert!(!eval_filter("!!!not a filter!!!", &ctx));
    }

    #[test]
    fn user_registered_method_participates_as_terminal() {
        clear_methods();
        register_method("double_length", |v| v.get_string().map(|s| Value::from((s.chars().count() * 2) as i64)));
        let ctx = parse(r#"{"name": "ab"}"#).unwrap();
        assert!(eval_filter("@.name.double_length() == 4", &ctx));
        clear_methods();
    }
}
