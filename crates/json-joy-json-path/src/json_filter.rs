//! Convenience facade over [`crate::eval::PathEvaluator`] and
//! [`crate::lazy::LazyGenerator`]. Pure sugar: every method here is
//! expressible in terms of `JsonPath::parse` plus evaluation already
//! available elsewhere in this crate.

use crate::eval::PathEvaluator;
use crate::lazy::{GeneratorOptions, LazyGenerator};
use crate::path_parser::JsonPath;
use json_joy_json_value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// 0 means unlimited.
    pub max_results: usize,
    pub stop_on_first_match: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub value: Value,
    pub path: String,
    pub depth: usize,
}

fn depth_of(path: &str) -> usize {
    path.chars().filter(|&c| c == '.' || c == '[').count()
}

pub struct JsonFilter;

impl JsonFilter {
    pub fn query(doc: &Value, expr: &str, options: QueryOptions) -> Vec<QueryMatch> {
        let Ok(path) = JsonPath::parse(expr) else {
            return Vec::new();
        };
        let gen_options = GeneratorOptions {
            max_results: options.max_results,
            stop_on_first_match: options.stop_on_first_match,
            ..GeneratorOptions::default()
        };
        LazyGenerator::new(&path, doc, gen_options)
            .map(|(v, p)| QueryMatch { value: v.clone(), depth: depth_of(&p), path: p })
            .collect()
    }

    pub fn batch_query(doc: &Value, exprs: &[&str]) -> Vec<Vec<QueryMatch>> {
        exprs.iter().map(|expr| Self::query(doc, expr, QueryOptions::default())).collect()
    }

    pub fn select_all(doc: &Value, expr: &str) -> Vec<QueryMatch> {
        Self::query(doc, expr, QueryOptions::default())
    }

    pub fn select_values(doc: &Value, expr: &str) -> Vec<Value> {
        Self::select_all(doc, expr).into_iter().map(|m| m.value).collect()
    }

    pub fn select_first(doc: &Value, expr: &str) -> Option<Value> {
        Self::query(doc, expr, QueryOptions { max_results: 1, ..QueryOptions::default() })
            .into_iter()
            .next()
            .map(|m| m.value)
    }

    pub fn path_exists(doc: &Value, expr: &str) -> bool {
        let Ok(path) = JsonPath::parse(expr) else {
            return false;
        };
        PathEvaluator::eval(&path, doc).size() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_json_value::parse;

    fn doc() -> Value {
        parse(r#"{"store":{"book":[{"title":"A","price":10},{"title":"B","price":20}]}}"#).unwrap()
    }

    #[test]
    fn path_exists_true_and_false() {
        let v = doc();
        assert!(JsonFilter::path_exists(&v, "$.store.book[0].title"));
        assert!(!JsonFilter::path_exists(&v, "$.store.missing"));
    }

    #[test]
    fn select_first_returns_leading_match() {
        let v = doc();
        let first = JsonFilter::select_first(&v, "$.store.book[*].title").unwrap();
        assert_eq!(first, Value::String("A".to_string()));
    }

    #[test]
    fn select_values_strips_paths() {
        let v = doc();
        let values = JsonFilter::select_values(&v, "$.store.book[*].price");
        assert_eq!(values, vec![Value::from(10i64), Value::from(20i64)]);
    }

    #[test]
    fn query_respects_max_results() {
        let v = doc();
        let options = QueryOptions { max_results: 1, stop_on_first_match: false };
        let matches = JsonFilter::query(&v, "$.store.book[*].title", options);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path, "$.store.book[0].title");
    }

    #[test]
    fn batch_query_runs_each_expression_independently() {
        let v = doc();
        let results = JsonFilter::batch_query(&v, &["$.store.book[0].title", "$.store.book[1].price"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0][0].value, Value::String("A".to_string()));
        assert_eq!(results[1][0].value, Value::from(20i64));
    }
}
