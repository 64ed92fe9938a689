//! level-by-level path evaluation.
//!
//! Keeps a current set of `Value` references and their path strings,
//! narrowed one node at a time as each path segment is applied.
//!
//! Rust's aliasing rules don't allow a `Vec<&mut Value>` of simultaneously
//! live mutable borrows into sibling tree nodes, so the mutable variant
//! here computes the same path set and exposes [`PathEvaluator::resolve_mut`]
//! to re-borrow one result at a time — same node set, different access shape.

use crate::ast::{PathNode, UnionKind};
use crate::filter;
use crate::path_parser::JsonPath;
use json_joy_json_value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub values: Vec<&'a Value>,
    pub paths: Vec<String>,
}

impl<'a> QueryResult<'a> {
    pub fn size(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutableQueryResult {
    pub paths: Vec<String>,
}

impl MutableQueryResult {
    pub fn size(&self) -> usize {
        self.paths.len()
    }
}

pub struct PathEvaluator;

impl PathEvaluator {
    pub fn eval<'a>(path: &JsonPath, root: &'a Value) -> QueryResult<'a> {
        if let [PathNode::Union(UnionKind::Paths(subexprs))] = path.nodes.as_slice() {
            return eval_path_union(subexprs, root);
        }

        let mut values: Vec<&'a Value> = vec![root];
        let mut paths: Vec<String> = vec!["$".to_string()];

        for node in path.nodes.iter().skip(1) {
            let mut next_values = Vec::new();
            let mut next_paths = Vec::new();
            for (value, p) in values.iter().zip(paths.iter()) {
                apply_node(node, value, p, &mut next_values, &mut next_paths);
            }
            values = next_values;
            paths = next_paths;
        }

        QueryResult { values, paths }
    }

    /// Same node set as [`Self::eval`], without holding live `&mut`
    /// borrows; use [`Self::resolve_mut`] to mutate one result at a time.
    pub fn eval_mutable(path: &JsonPath, root: &Value) -> MutableQueryResult {
        MutableQueryResult {
            paths: Self::eval(path, root).paths,
        }
    }

    /// Re-navigates `root` by a path string previously returned from
    /// [`Self::eval`]/[`Self::eval_mutable`] (dot and `[i]` segments only).
    pub fn resolve_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
        let mut current = root;
        for seg in parse_concrete_segments(path) {
            current = match seg {
                ConcreteSeg::Key(k) => current.get_object_mut()?.get_mut(&k)?,
                ConcreteSeg::Index(i) => current.get_array_mut()?.get_mut(i)?,
            };
        }
        Some(current)
    }
}

fn eval_path_union<'a>(subexprs: &[String], root: &'a Value) -> QueryResult<'a> {
    let mut values = Vec::new();
    let mut paths = Vec::new();
    for sub in subexprs {
        if let Ok(subpath) = JsonPath::parse(sub) {
            let r = PathEvaluator::eval(&subpath, root);
            values.extend(r.values);
            paths.extend(r.paths);
        }
    }
    QueryResult { values, paths }
}

fn apply_node<'a>(
    node: &PathNode,
    value: &'a Value,
    path: &str,
    out_values: &mut Vec<&'a Value>,
    out_paths: &mut Vec<String>,
) {
    match node {
        PathNode::Root => {
            out_values.push(value);
            out_paths.push("$".to_string());
        }
        PathNode::Property(name) => {
            if let Some(obj) = value.get_object() {
                if let Some(child) = obj.get(name) {
                    out_values.push(child);
                    out_paths.push(format!("{path}.{name}"));
                }
            }
        }
        PathNode::Index(i) => {
            if let Some(arr) = value.get_array() {
                if let Some(idx) = normalize_index(*i, arr.len()) {
                    out_values.push(&arr[idx]);
                    out_paths.push(format!("{path}[{idx}]"));
                }
            }
        }
        PathNode::Slice { start, end, step } => {
            if let Some(arr) = value.get_array() {
                for idx in slice_indices(*start, *end, *step, arr.len()) {
                    out_values.push(&arr[idx]);
                    out_paths.push(format!("{path}[{idx}]"));
                }
            }
        }
        PathNode::Wildcard => match value {
            Value::Object(obj) => {
                for (k, v) in obj.iter() {
                    out_values.push(v);
                    out_paths.push(format!("{path}.{k}"));
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    out_values.push(v);
                    out_paths.push(format!("{path}[{i}]"));
                }
            }
            _ => {}
        },
        PathNode::Recursive(prop) => {
            collect_recursive(value, path, prop.as_deref(), out_values, out_paths);
        }
        PathNode::Filter(expr) => match value {
            Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    if filter::eval_filter(expr, item) {
                        out_values.push(item);
                        out_paths.push(format!("{path}[{i}]"));
                    }
                }
            }
            Value::Object(_) => {
                if filter::eval_filter(expr, value) {
                    out_values.push(value);
                    out_paths.push(path.to_string());
                }
            }
            _ => {}
        },
        PathNode::Union(UnionKind::Indices(list)) => {
            if let Some(arr) = value.get_array() {
                for &i in list {
                    if let Some(idx) = normalize_index(i, arr.len()) {
                        out_values.push(&arr[idx]);
                        out_paths.push(format!("{path}[{idx}]"));
                    }
                }
            }
        }
        PathNode::Union(UnionKind::Paths(subexprs)) => {
            for sub in subexprs {
                if let Ok(subpath) = JsonPath::parse(sub) {
                    let r = PathEvaluator::eval(&subpath, value);
                    out_values.extend(r.values);
                    out_paths.extend(r.paths);
                }
            }
        }
    }
}

fn collect_recursive<'a>(
    value: &'a Value,
    path: &str,
    prop: Option<&str>,
    out_values: &mut Vec<&'a Value>,
    out_paths: &mut Vec<String>,
) {
    match prop {
        None => {
            out_values.push(value);
            out_paths.push(path.to_string());
        }
        Some(name) => {
            if let Value::Object(obj) = value {
                if let Some(child) = obj.get(name) {
                    out_values.push(child);
                    out_paths.push(format!("{path}.{name}"));
                }
            }
        }
    }
    match value {
        Value::Object(obj) => {
            for (k, v) in obj.iter() {
                collect_recursive(v, &format!("{path}.{k}"), prop, out_values, out_paths);
            }
        }
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                collect_recursive(v, &format!("{path}[{i}]"), prop, out_values, out_paths);
            }
        }
        _ => {}
    }
}

pub(crate) fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let l = len as i64;
    let n = if i < 0 { l + i } else { i };
    if n >= 0 && n < l {
        Some(n as usize)
    } else {
        None
    }
}

/// Omitted bounds default to a conventional (Python-like) full-range or
/// reverse-range slice. An omitted bound is `None` rather than `-1`, since
/// `-1` is also a valid negative index and the two must not collide.
pub(crate) fn slice_indices(start: Option<i64>, end: Option<i64>, step: i64, len: usize) -> Vec<usize> {
    if step == 0 {
        return Vec::new();
    }
    let l = len as i64;
    let norm = |v: i64| if v < 0 { l + v } else { v };

    let (s, e) = if step > 0 {
        let s = start.map(norm).unwrap_or(0).clamp(0, l);
        let e = end.map(norm).unwrap_or(l).clamp(0, l);
        (s, e)
    } else {
        let s = start.map(norm).unwrap_or(l - 1).clamp(-1, l - 1);
        let e = end.map(norm).unwrap_or(-1).clamp(-1, l - 1);
        (s, e)
    };

    let mut out = Vec::new();
    if step > 0 {
        let mut i = s;
        while i < e {
            out.push(i as usize);
            i += step;
        }
    } else {
        let mut i = s;
        while i > e {
            if i >= 0 {
                out.push(i as usize);
            }
            i += step;
        }
    }
    out
}

enum ConcreteSeg {
    Key(String),
    Index(usize),
}

fn parse_concrete_segments(path: &str) -> Vec<ConcreteSeg> {
    let bytes = path.as_bytes();
    let mut i = if bytes.first() == Some(&b'$') { 1 } else { 0 };
    let mut segs = Vec::new();
    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i] != b'.' && bytes[i] != b'[' {
                    i += 1;
                }
                segs.push(ConcreteSeg::Key(path[start..i].to_string()));
            }
            b'[' => {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                if let Ok(n) = path[start..i].parse::<usize>() {
                    segs.push(ConcreteSeg::Index(n));
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    segs
}
