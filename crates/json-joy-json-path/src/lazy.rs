//! single-consumer, one-step-at-a-time path evaluator.
//!
//! Holds an explicit stack of [`Frame`]s instead of eval.rs's
//! level-by-level parallel vectors, so a caller can cap the result count,
//! stop early, or interleave generation with other work. A frame for a
//! wildcard/slice/union carries a cursor that consumes one child per
//! `step()`; a `Recursive` frame runs a `SearchingSelf -> SearchingChildren`
//! state machine, pushing one child frame at a time rather than
//! materializing the whole subtree up front.

use crate::ast::{PathNode, UnionKind};
use crate::eval::{normalize_index, slice_indices, PathEvaluator};
use crate::filter;
use crate::path_parser::JsonPath;
use json_joy_json_value::Value;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

const MAX_CACHE_SIZE: usize = 100;
const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorStrategy {
    Simple,
    Filter,
    Advanced,
}

fn choose_strategy(nodes: &[PathNode]) -> GeneratorStrategy {
    let has_recursive = nodes.iter().any(|n| matches!(n, PathNode::Recursive(_)));
    let has_filter = nodes.iter().any(|n| matches!(n, PathNode::Filter(_)));
    if has_recursive {
        GeneratorStrategy::Advanced
    } else if has_filter {
        GeneratorStrategy::Filter
    } else {
        GeneratorStrategy::Simple
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    /// 0 means unlimited.
    pub max_results: usize,
    pub stop_on_first_match: bool,
    pub batch_size: usize,
    pub enable_early_termination: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_results: 0,
            stop_on_first_match: false,
            batch_size: 16,
            enable_early_termination: true,
        }
    }
}

/// Lifecycle state of a [`LazyGenerator`]: `Ready -> Running -> {Completed | Terminated}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenState {
    Ready,
    Running,
    Completed,
    Terminated,
}

struct CacheEntry {
    paths: Vec<String>,
    inserted: Instant,
}

struct ResultCache {
    map: HashMap<(String, String), CacheEntry>,
    hits: u64,
    misses: u64,
    last_cleanup: Instant,
}

impl ResultCache {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
            last_cleanup: Instant::now(),
        }
    }

    fn maybe_cleanup(&mut self) {
        if self.last_cleanup.elapsed() < CACHE_TTL {
            return;
        }
        let now = Instant::now();
        self.map.retain(|_, v| now.duration_since(v.inserted) < CACHE_TTL);
        self.last_cleanup = now;
    }

    fn get(&mut self, key: &(String, String)) -> Option<Vec<String>> {
        self.maybe_cleanup();
        let hit = self.map.get(key).map(|e| e.paths.clone());
        if hit.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        hit
    }

    fn insert(&mut self, key: (String, String), paths: Vec<String>) {
        self.maybe_cleanup();
        if self.map.len() >= MAX_CACHE_SIZE && !self.map.contains_key(&key) {
            if let Some(oldest) = self.map.iter().min_by_key(|(_, v)| v.inserted).map(|(k, _)| k.clone()) {
                self.map.remove(&oldest);
            }
        }
        self.map.insert(key, CacheEntry { paths, inserted: Instant::now() });
    }

    fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }

    fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

enum Frame<'a> {
    Unvisited {
        node_index: usize,
        value: &'a Value,
        path: String,
    },
    Cursor {
        node_index: usize,
        items: Vec<(&'a Value, String)>,
        pos: usize,
    },
    RecursiveSelf {
        node_index: usize,
        value: &'a Value,
        path: String,
        prop: Option<String>,
    },
    RecursiveChildren {
        node_index: usize,
        prop: Option<String>,
        children: Vec<(&'a Value, String)>,
        pos: usize,
    },
}

pub struct LazyGenerator<'a> {
    root: &'a Value,
    nodes: Vec<PathNode>,
    options: GeneratorOptions,
    strategy: GeneratorStrategy,
    stack: Vec<Frame<'a>>,
    ready: VecDeque<(&'a Value, String)>,
    pending: Option<(&'a Value, String)>,
    result_count: usize,
    state: GenState,
    cache: ResultCache,
}

impl<'a> LazyGenerator<'a> {
    pub fn new(path: &JsonPath, root: &'a Value, options: GeneratorOptions) -> Self {
        let nodes = path.nodes.clone();
        let strategy = choose_strategy(&nodes);
        let mut gen = Self {
            root,
            nodes,
            options,
            strategy,
            stack: Vec::new(),
            ready: VecDeque::new(),
            pending: None,
            result_count: 0,
            state: GenState::Ready,
            cache: ResultCache::new(),
        };
        gen.restart();
        gen
    }

    pub fn strategy(&self) -> GeneratorStrategy {
        self.strategy
    }

    /// Current lifecycle state: `Ready`, `Running`, `Completed`, or `Terminated`.
    pub fn state(&self) -> GenState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == GenState::Terminated
    }

    fn restart(&mut self) {
        self.stack.clear();
        self.ready.clear();
        if let [PathNode::Union(UnionKind::Paths(subexprs))] = self.nodes.clone().as_slice() {
            for sub in subexprs {
                if let Ok(subpath) = JsonPath::parse(sub) {
                    let r = PathEvaluator::eval(&subpath, self.root);
                    self.ready.extend(r.values.into_iter().zip(r.paths));
                }
            }
        } else {
            self.push_value(1, self.root, "$".to_string());
        }
    }

    fn push_value(&mut self, node_index: usize, value: &'a Value, path: String) {
        if node_index >= self.nodes.len() {
            self.ready.push_back((value, path));
        } else {
            self.stack.push(Frame::Unvisited { node_index, value, path });
        }
    }

    fn push_cursor(&mut self, node_index: usize, items: Vec<(&'a Value, String)>) {
        if !items.is_empty() {
            self.stack.push(Frame::Cursor { node_index, items, pos: 0 });
        }
    }

    fn expand_unvisited(&mut self, node_index: usize, value: &'a Value, path: String, node: PathNode) {
        match node {
            PathNode::Root => self.push_value(node_index + 1, value, path),
            PathNode::Property(name) => {
                if let Some(child) = value.get_object().and_then(|o| o.get(&name)) {
                    self.push_value(node_index + 1, child, format!("{path}.{name}"));
                }
            }
            PathNode::Index(i) => {
                if let Some(arr) = value.get_array() {
                    if let Some(idx) = normalize_index(i, arr.len()) {
                        self.push_value(node_index + 1, &arr[idx], format!("{path}[{idx}]"));
                    }
                }
            }
            PathNode::Slice { start, end, step } => {
                if let Some(arr) = value.get_array() {
                    let items = slice_indices(start, end, step, arr.len())
                        .into_iter()
                        .map(|idx| (&arr[idx], format!("{path}[{idx}]")))
                        .collect();
                    self.push_cursor(node_index, items);
                }
            }
            PathNode::Wildcard => {
                let items: Vec<(&'a Value, String)> = match value {
                    Value::Object(obj) => obj.iter().map(|(k, v)| (v, format!("{path}.{k}"))).collect(),
                    Value::Array(arr) => arr.iter().enumerate().map(|(i, v)| (v, format!("{path}[{i}]"))).collect(),
                    _ => Vec::new(),
                };
                self.push_cursor(node_index, items);
            }
            PathNode::Recursive(prop) => {
                self.stack.push(Frame::RecursiveSelf { node_index, value, path, prop });
            }
            PathNode::Filter(expr) => match value {
                Value::Array(arr) => {
                    let items = self.filter_array(&path, &expr, arr, node_index);
                    self.push_cursor(node_index, items);
                }
                Value::Object(_) => {
                    if filter::eval_filter(&expr, value) {
                        self.push_value(node_index + 1, value, path);
                    }
                }
                _ => {}
            },
            PathNode::Union(UnionKind::Indices(list)) => {
                if let Some(arr) = value.get_array() {
                    let items = list
                        .iter()
                        .filter_map(|&i| normalize_index(i, arr.len()))
                        .map(|idx| (&arr[idx], format!("{path}[{idx}]")))
                        .collect();
                    self.push_cursor(node_index, items);
                }
            }
            PathNode::Union(UnionKind::Paths(subexprs)) => {
                let mut items = Vec::new();
                for sub in &subexprs {
                    if let Ok(subpath) = JsonPath::parse(sub) {
                        let r = PathEvaluator::eval(&subpath, value);
                        items.extend(r.values.into_iter().zip(r.paths));
                    }
                }
                self.push_cursor(node_index, items);
            }
        }
    }

    fn filter_array(&mut self, path: &str, expr: &str, arr: &'a [Value], _node_index: usize) -> Vec<(&'a Value, String)> {
        if self.strategy != GeneratorStrategy::Advanced {
            return arr
                .iter()
                .enumerate()
                .filter(|(_, item)| filter::eval_filter(expr, item))
                .map(|(i, item)| (item, format!("{path}[{i}]")))
                .collect();
        }
        let key = (path.to_string(), expr.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return cached
                .into_iter()
                .filter_map(|p| extract_last_index(&p).filter(|&idx| idx < arr.len()).map(|idx| (&arr[idx], p)))
                .collect();
        }
        let items: Vec<(&'a Value, String)> = arr
            .iter()
            .enumerate()
            .filter(|(_, item)| filter::eval_filter(expr, item))
            .map(|(i, item)| (item, format!("{path}[{i}]")))
            .collect();
        self.cache.insert(key, items.iter().map(|(_, p)| p.clone()).collect());
        items
    }

    fn step(&mut self) {
        let Some(frame) = self.stack.pop() else { return };
        match frame {
            Frame::Unvisited { node_index, value, path } => {
                let node = self.nodes[node_index].clone();
                self.expand_unvisited(node_index, value, path, node);
            }
            Frame::Cursor { node_index, items, pos } => {
                if pos < items.len() {
                    let (v, p) = items[pos].clone();
                    let next_pos = pos + 1;
                    if next_pos < items.len() {
                        self.stack.push(Frame::Cursor { node_index, items, pos: next_pos });
                    }
                    self.push_value(node_index + 1, v, p);
                }
            }
            Frame::RecursiveSelf { node_index, value, path, prop } => {
                match &prop {
                    None => self.push_value(node_index + 1, value, path.clone()),
                    Some(name) => {
                        if let Some(child) = value.get_object().and_then(|o| o.get(name)) {
                            self.push_value(node_index + 1, child, format!("{path}.{name}"));
                        }
                    }
                }
                let children: Vec<(&'a Value, String)> = match value {
                    Value::Object(obj) => obj.iter().map(|(k, v)| (v, format!("{path}.{k}"))).collect(),
                    Value::Array(arr) => arr.iter().enumerate().map(|(i, v)| (v, format!("{path}[{i}]"))).collect(),
                    _ => Vec::new(),
                };
                if !children.is_empty() {
                    self.stack.push(Frame::RecursiveChildren { node_index, prop, children, pos: 0 });
                }
            }
            Frame::RecursiveChildren { node_index, prop, children, pos } => {
                if pos < children.len() {
                    let (v, p) = children[pos].clone();
                    let next_pos = pos + 1;
                    if next_pos < children.len() {
                        self.stack.push(Frame::RecursiveChildren {
                            node_index,
                            prop: prop.clone(),
                            children,
                            pos: next_pos,
                        });
                    }
                    self.stack.push(Frame::RecursiveSelf { node_index, value: v, path: p, prop });
                }
            }
        }
    }

    fn pull(&mut self) -> Option<(&'a Value, String)> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            if self.stack.is_empty() {
                return None;
            }
            self.step();
        }
    }

    pub fn has_next(&mut self) -> bool {
        if matches!(self.state, GenState::Terminated | GenState::Completed) {
            return false;
        }
        if self.options.max_results != 0 && self.result_count >= self.options.max_results {
            self.state = GenState::Completed;
            return false;
        }
        if self.state == GenState::Ready {
            self.state = GenState::Running;
        }
        if self.pending.is_none() {
            self.pending = self.pull();
        }
        if self.pending.is_none() {
            self.state = GenState::Completed;
            false
        } else {
            true
        }
    }

    pub fn next(&mut self) -> Option<(&'a Value, String)> {
        if !self.has_next() {
            return None;
        }
        let item = self.pending.take();
        if item.is_some() {
            self.result_count += 1;
            if self.options.stop_on_first_match && self.options.enable_early_termination {
                self.state = GenState::Completed;
                self.stack.clear();
                self.ready.clear();
            }
        }
        item
    }

    pub fn next_batch(&mut self, n: usize) -> Vec<(&'a Value, String)> {
        let mut out = Vec::with_capacity(n.min(self.options.batch_size.max(1)));
        while out.len() < n {
            match self.next() {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }

    /// Rewinds to the start of the node list on the same source. The
    /// result cache (and its hit/miss statistics) survive a reset.
    pub fn reset(&mut self) {
        self.pending = None;
        self.result_count = 0;
        self.state = GenState::Ready;
        self.restart();
    }

    pub fn terminate(&mut self) {
        self.state = GenState::Terminated;
        self.stack.clear();
        self.ready.clear();
        self.pending = None;
    }

    pub fn for_each<F: FnMut(&'a Value, &str) -> bool>(&mut self, mut f: F) {
        while let Some((v, p)) = self.next() {
            if !f(v, &p) {
                break;
            }
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.map.len()
    }

    pub fn cache_hit_ratio(&self) -> f64 {
        self.cache.hit_ratio()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl<'a> Iterator for LazyGenerator<'a> {
    type Item = (&'a Value, String);

    fn next(&mut self) -> Option<Self::Item> {
        LazyGenerator::next(self)
    }
}

fn extract_last_index(path: &str) -> Option<usize> {
    if !path.ends_with(']') {
        return None;
    }
    let start = path.rfind('[')?;
    path[start + 1..path.len() - 1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_json_value::parse;

    fn doc() -> Value {
        parse(r#"{"store":{"book":[{"title":"A","price":10},{"title":"B","price":20},{"title":"C","price":30}]}}"#)
            .unwrap()
    }

    #[test]
    fn iterates_same_order_as_eager_eval() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        let mut titles = Vec::new();
        while let Some((val, _)) = gen.next() {
            titles.push(val.get_string().unwrap().to_string());
        }
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn max_results_caps_output() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let options = GeneratorOptions { max_results: 2, ..Default::default() };
        let mut gen = LazyGenerator::new(&path, &v, options);
        let batch = gen.next_batch(10);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn stop_on_first_match_halts_after_one_result() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let options = GeneratorOptions { stop_on_first_match: true, ..Default::default() };
        let mut gen = LazyGenerator::new(&path, &v, options);
        assert!(gen.next().is_some());
        assert!(gen.next().is_none());
    }

    #[test]
    fn reset_replays_from_the_start() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        let first_pass: Vec<String> = gen.by_ref().map(|(v, _)| v.get_string().unwrap().to_string()).collect();
        gen.reset();
        let second_pass: Vec<String> = gen.by_ref().map(|(v, _)| v.get_string().unwrap().to_string()).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn terminate_stops_further_results() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        gen.next();
        gen.terminate();
        assert!(!gen.has_next());
        assert!(gen.next().is_none());
        assert_eq!(gen.state(), GenState::Terminated);
        assert!(gen.is_terminated());
    }

    #[test]
    fn running_to_completion_reaches_completed_not_terminated() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        assert_eq!(gen.state(), GenState::Ready);
        let _: Vec<_> = gen.by_ref().collect();
        assert_eq!(gen.state(), GenState::Completed);
        assert!(!gen.is_terminated());
    }

    #[test]
    fn recursive_descent_matches_eager_evaluator_count() {
        let v = doc();
        let path = JsonPath::parse("$..price").unwrap();
        let lazy_count = LazyGenerator::new(&path, &v, GeneratorOptions::default()).count();
        let eager = PathEvaluator::eval(&path, &v);
        assert_eq!(lazy_count, eager.size());
    }

    #[test]
    fn for_each_callback_can_stop_generation() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        let mut seen = 0;
        gen.for_each(|_, _| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn next_batch_repeated_matches_individual_next_calls() {
        let v = doc();
        let path = JsonPath::parse("$.store.book[*].title").unwrap();
        let mut batched = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        let mut via_batches = Vec::new();
        loop {
            let batch = batched.next_batch(2);
            if batch.is_empty() {
                break;
            }
            via_batches.extend(batch.into_iter().map(|(v, p)| (v.get_string().unwrap().to_string(), p)));
        }

        let mut individual = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        let mut via_next = Vec::new();
        while let Some((val, p)) = individual.next() {
            via_next.push((val.get_string().unwrap().to_string(), p));
        }
        assert_eq!(via_batches, via_next);
    }

    #[test]
    fn advanced_strategy_populates_filter_cache() {
        let v = doc();
        let path = JsonPath::parse("$..book[?(@.price > 10)]").unwrap();
        let mut gen = LazyGenerator::new(&path, &v, GeneratorOptions::default());
        assert_eq!(gen.strategy(), GeneratorStrategy::Advanced);
        let _: Vec<_> = gen.by_ref().collect();
        assert!(gen.cache_len() > 0);
        gen.clear_cache();
        assert_eq!(gen.cache_len(), 0);
    }
}
