//! Path node shapes produced by [`crate::path_parser`] and consumed by
//! [`crate::eval`] and [`crate::lazy`].

/// One step of a parsed path. `Root` always occupies index 0 of a node list,
/// except for a top-level union of whole sub-paths, which is the sole node
/// in its list (each sub-path carries its own leading `$`).
#[derive(Debug, Clone, PartialEq)]
pub enum PathNode {
    Root,
    Property(String),
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    },
    Wildcard,
    /// `None` means "every descendant"; `Some(name)` additionally matches
    /// objects carrying that property at any depth.
    Recursive(Option<String>),
    /// Inner text of `?( ... )`, re-parsed by [`crate::filter`] at evaluation time.
    Filter(String),
    Union(UnionKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnionKind {
    /// `[0,2,4]` — applied to one array input.
    Indices(Vec<i64>),
    /// `$.a,$.b` — each a full path string, re-parsed and evaluated
    /// independently against the document root.
    Paths(Vec<String>),
}
