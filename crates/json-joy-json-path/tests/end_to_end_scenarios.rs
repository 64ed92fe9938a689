use json_joy_json_path::{GenState, GeneratorOptions, JsonPath, LazyGenerator, PathEvaluator};
use json_joy_json_value::{parse, Value};
use std::collections::HashSet;

#[test]
fn jsonpath_eager_wildcard_over_nested_array() {
    let doc = parse(r#"{"store":{"book":[{"author":"A1"},{"author":"A2"}]}}"#).unwrap();
    let path = JsonPath::parse("$.store.book[*].author").unwrap();
    let result = PathEvaluator::eval(&path, &doc);
    let authors: Vec<&str> = result.values.iter().map(|v| v.get_string().unwrap()).collect();
    assert_eq!(authors, vec!["A1", "A2"]);
    assert_eq!(result.paths, vec!["$.store.book[0].author", "$.store.book[1].author"]);
}

#[test]
fn recursive_property_search_finds_every_depth() {
    let doc = parse(r#"{"a":{"price":1,"b":{"price":2}},"c":[{"price":3}]}"#).unwrap();
    let path = JsonPath::parse("$..price").unwrap();
    let result = PathEvaluator::eval(&path, &doc);
    let prices: HashSet<i64> = result.values.iter().map(|v| v.get_integer().unwrap()).collect();
    assert_eq!(prices, HashSet::from([1, 2, 3]));
}

#[test]
fn filter_with_comparison_and_bracket_quoted_key() {
    let doc = parse(r#"{"users":[{"name":"A","age score":85},{"name":"B","age score":95}]}"#).unwrap();
    let path = JsonPath::parse("$.users[?(@['age score'] > 90)].name").unwrap();
    let result = PathEvaluator::eval(&path, &doc);
    let names: Vec<&str> = result.values.iter().map(|v| v.get_string().unwrap()).collect();
    assert_eq!(names, vec!["B"]);
}

#[test]
fn mutable_evaluation_scales_every_matched_element_in_place() {
    let mut doc = parse(r#"{"p":[100,200,300]}"#).unwrap();
    let path = JsonPath::parse("$.p[*]").unwrap();
    let matches = PathEvaluator::eval_mutable(&path, &doc);
    for p in &matches.paths {
        let target = PathEvaluator::resolve_mut(&mut doc, p).unwrap();
        let scaled = (target.get_number().unwrap() * 0.9).round() as i64;
        *target = Value::from(scaled);
    }
    let result = PathEvaluator::eval(&JsonPath::parse("$.p[*]").unwrap(), &doc);
    let values: Vec<i64> = result.values.iter().map(|v| v.get_integer().unwrap()).collect();
    assert_eq!(values, vec![90, 180, 270]);
}

#[test]
fn lazy_generator_stops_exactly_at_max_results_on_a_large_source() {
    let items: Vec<Value> = (0..5000i64)
        .map(|i| {
            let mut obj = json_joy_json_value::Object::new();
            obj.insert("id".to_string(), Value::from(i));
            obj.insert("active".to_string(), Value::Bool(i % 3 != 0));
            Value::Object(obj)
        })
        .collect();
    let mut root_obj = json_joy_json_value::Object::new();
    root_obj.insert("items".to_string(), Value::Array(items));
    let doc = Value::Object(root_obj);

    let path = JsonPath::parse("$.items[?(@.active == true)].id").unwrap();
    let mut gen = LazyGenerator::new(&path, &doc, GeneratorOptions::default());

    let mut results = Vec::new();
    while results.len() < 100 {
        results.push(gen.next().unwrap());
    }
    gen.terminate();

    assert_eq!(results.len(), 100);
    assert!(!gen.has_next());
    assert!(gen.next().is_none());
    assert_eq!(gen.state(), GenState::Terminated);
}
