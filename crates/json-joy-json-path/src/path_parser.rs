//! builds a [`PathNode`] list (or a top-level path union) from the
//! token stream produced by [`crate::tokenizer`].

use crate::ast::{PathNode, UnionKind};
use crate::error::{JsonPathException, JsonPathResult};
use crate::tokenizer::{tokenize, Token};

/// A parsed JSONPath expression: the original text plus its node list.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pub raw: String,
    pub nodes: Vec<PathNode>,
}

impl JsonPath {
    pub fn parse(expr: &str) -> JsonPathResult<Self> {
        let trimmed = expr.trim();
        if !trimmed.starts_with('$') {
            return Err(JsonPathException::new("path must start with '$'", 0));
        }

        let parts = split_top_level_commas(trimmed);
        let nodes = if parts.len() > 1 {
            vec![PathNode::Union(UnionKind::Paths(
                parts.iter().map(|p| p.trim().to_string()).collect(),
            ))]
        } else {
            let tokens = tokenize(trimmed)?;
            build_nodes(&tokens)?
        };

        Ok(JsonPath {
            raw: trimmed.to_string(),
            nodes,
        })
    }

    /// Syntax-validates without building a [`JsonPath`] for evaluation.
    pub fn is_valid_expression(expr: &str) -> bool {
        Self::parse(expr).is_ok()
    }
}

/// Splits on top-level commas only — not inside `[...]`/`(...)` nesting or
/// quoted strings — since a comma there is a union, but a comma inside a
/// bracket union or filter string literal is not.
fn split_top_level_commas(source: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut idx = 0;
    while idx < chars.len() {
        let (byte_pos, c) = chars[idx];
        if let Some(q) = quote {
            if c == '\\' {
                idx += 1;
            } else if c == q {
                quote = None;
            }
        } else {
            match c {
                '\'' | '"' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(source[start..byte_pos].to_string());
                    start = byte_pos + c.len_utf8();
                }
                _ => {}
            }
        }
        idx += 1;
    }
    parts.push(source[start..].to_string());
    parts
}

fn build_nodes(tokens: &[(Token, usize)]) -> JsonPathResult<Vec<PathNode>> {
    let (root_tok, root_pos) = &tokens[0];
    if *root_tok != Token::Root {
        return Err(JsonPathException::new("path must start with '$'", *root_pos));
    }
    let mut nodes = vec![PathNode::Root];
    let mut i = 1;

    loop {
        match &tokens[i].0 {
            Token::End => break,
            Token::Dot => {
                i += 1;
                match &tokens[i].0 {
                    Token::Wildcard => {
                        nodes.push(PathNode::Wildcard);
                        i += 1;
                    }
                    Token::Ident(name) => {
                        nodes.push(PathNode::Property(name.clone()));
                        i += 1;
                    }
                    _ => {
                        return Err(JsonPathException::new(
                            "expected identifier or '*' after '.'",
                            tokens[i].1,
                        ))
                    }
                }
            }
            Token::DotDot => {
                i += 1;
                match &tokens[i].0 {
                    Token::Ident(name) => {
                        nodes.push(PathNode::Recursive(Some(name.clone())));
                        i += 1;
                    }
                    Token::Wildcard => {
                        nodes.push(PathNode::Recursive(None));
                        i += 1;
                    }
                    _ => nodes.push(PathNode::Recursive(None)),
                }
            }
            Token::BracketOpen => {
                let (node, next) = parse_bracket(tokens, i + 1)?;
                nodes.push(node);
                i = next;
            }
            _ => return Err(JsonPathException::new("unexpected token in path", tokens[i].1)),
        }
    }

    Ok(nodes)
}

fn parse_bracket(tokens: &[(Token, usize)], start: usize) -> JsonPathResult<(PathNode, usize)> {
    match &tokens[start].0 {
        Token::Str(name) => {
            expect_bracket_close(tokens, start + 1)?;
            Ok((PathNode::Property(name.clone()), start + 2))
        }
        Token::Wildcard => {
            expect_bracket_close(tokens, start + 1)?;
            Ok((PathNode::Wildcard, start + 2))
        }
        Token::Filter(expr) => {
            expect_bracket_close(tokens, start + 1)?;
            Ok((PathNode::Filter(expr.clone()), start + 2))
        }
        Token::Colon => parse_slice(tokens, start),
        Token::Num(n) => {
            let n = *n;
            match &tokens[start + 1].0 {
                Token::BracketClose => Ok((PathNode::Index(n), start + 2)),
                Token::Colon => parse_slice(tokens, start),
                Token::Comma => parse_union_indices(tokens, start),
                _ => Err(JsonPathException::new("malformed bracket expression", tokens[start + 1].1)),
            }
        }
        _ => Err(JsonPathException::new("malformed bracket expression", tokens[start].1)),
    }
}

fn expect_bracket_close(tokens: &[(Token, usize)], at: usize) -> JsonPathResult<()> {
    if tokens[at].0 == Token::BracketClose {
        Ok(())
    } else {
        Err(JsonPathException::new("expected ']'", tokens[at].1))
    }
}

fn parse_slice(tokens: &[(Token, usize)], start: usize) -> JsonPathResult<(PathNode, usize)> {
    let mut j = start;
    let mut take_num = |j: &mut usize| -> Option<i64> {
        if let Token::Num(n) = &tokens[*j].0 {
            let n = *n;
            *j += 1;
            Some(n)
        } else {
            None
        }
    };

    let start_idx = take_num(&mut j);
    if tokens[j].0 != Token::Colon {
        return Err(JsonPathException::new("expected ':' in slice", tokens[j].1));
    }
    j += 1;
    let end_idx = take_num(&mut j);
    let mut step = 1i64;
    if tokens[j].0 == Token::Colon {
        j += 1;
        if let Some(n) = take_num(&mut j) {
            step = n;
        }
    }
    expect_bracket_close(tokens, j)?;
    Ok((
        PathNode::Slice {
            start: start_idx,
            end: end_idx,
            step,
        },
        j + 1,
    ))
}

fn parse_union_indices(tokens: &[(Token, usize)], start: usize) -> JsonPathResult<(PathNode, usize)> {
    let mut j = start;
    let mut indices = Vec::new();
    loop {
        match &tokens[j].0 {
            Token::Num(n) => {
                indices.push(*n);
                j += 1;
            }
            _ => return Err(JsonPathException::new("expected integer in union", tokens[j].1)),
        }
        match &tokens[j].0 {
            Token::Comma => {
                j += 1;
                continue;
            }
            Token::BracketClose => {
                j += 1;
                break;
            }
            _ => return Err(JsonPathException::new("expected ',' or ']' in union", tokens[j].1)),
        }
    }
    Ok((PathNode::Union(UnionKind::Indices(indices)), j))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_without_dollar() {
        let err = JsonPath::parse("store.book").unwrap_err();
        assert_eq!(err.position, 0);
    }

    #[test]
    fn parses_property_index_and_slice() {
        let p = JsonPath::parse("$.store.book[0:2]").unwrap();
        assert_eq!(
            p.nodes,
            vec![
                PathNode::Root,
                PathNode::Property("store".into()),
                PathNode::Property("book".into()),
                PathNode::Slice {
                    start: Some(0),
                    end: Some(2),
                    step: 1
                },
            ]
        );
    }

    #[test]
    fn parses_bracket_quoted_property_and_wildcard() {
        let p = JsonPath::parse("$['store']['book'][*]").unwrap();
        assert_eq!(
            p.nodes,
            vec![
                PathNode::Root,
                PathNode::Property("store".into()),
                PathNode::Property("book".into()),
                PathNode::Wildcard,
            ]
        );
    }

    #[test]
    fn parses_index_union() {
        let p = JsonPath::parse("$.book[0,2,4]").unwrap();
        assert_eq!(
            p.nodes,
            vec![
                PathNode::Root,
                PathNode::Property("book".into()),
                PathNode::Union(UnionKind::Indices(vec![0, 2, 4])),
            ]
        );
    }

    #[test]
    fn top_level_comma_builds_path_union() {
        let p = JsonPath::parse("$.a,$.b").unwrap();
        assert_eq!(
            p.nodes,
            vec![PathNode::Union(UnionKind::Paths(vec!["$.a".into(), "$.b".into()]))]
        );
    }

    #[test]
    fn comma_inside_union_bracket_is_not_a_top_level_split() {
        let p = JsonPath::parse("$.a[0,1].b").unwrap();
        assert_eq!(
            p.nodes,
            vec![
                PathNode::Root,
                PathNode::Property("a".into()),
                PathNode::Union(UnionKind::Indices(vec![0, 1])),
                PathNode::Property("b".into()),
            ]
        );
    }

    #[test]
    fn parses_recursive_descent_with_and_without_property() {
        let p = JsonPath::parse("$..price").unwrap();
        assert_eq!(p.nodes, vec![PathNode::Root, PathNode::Recursive(Some("price".into()))]);
        let p = JsonPath::parse("$..*").unwrap();
        assert_eq!(p.nodes, vec![PathNode::Root, PathNode::Recursive(None)]);
    }

    #[test]
    fn parses_filter_bracket() {
        let p = JsonPath::parse("$.book[?(@.price < 10)]").unwrap();
        assert_eq!(
            p.nodes,
            vec![
                PathNode::Root,
                PathNode::Property("book".into()),
                PathNode::Filter("@.price < 10".into()),
            ]
        );
    }
}
