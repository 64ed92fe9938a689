//! Recursive-descent JSON parser with configurable leniency.
//!
//! Every construct has a strict form and a `*_with_recovery` form that
//! tolerates malformed input instead of failing the whole parse.

use crate::error::{ErrorCode, JsonError, JsonResult};
use crate::number::Number;
use crate::value::{Object, Value};

/// Parser configuration; defaults match the original's `ParseOptions`.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub allow_comments: bool,
    pub allow_trailing_commas: bool,
    pub strict_mode: bool,
    pub validate_utf8: bool,
    pub allow_special_numbers: bool,
    pub allow_recovery: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 512,
            allow_comments: false,
            allow_trailing_commas: false,
            strict_mode: true,
            validate_utf8: false,
            allow_special_numbers: false,
            allow_recovery: false,
        }
    }
}

/// Parse `source` with the default strict options, throwing on the first
/// error. Thin convenience over [`parse_with`].
pub fn parse(source: &str) -> JsonResult<Value> {
    parse_with(source, ParseOptions::default())
}

/// Parse `source` with explicit options. This is the primary, no-throw-style
/// surface: callers that want the throwing convenience use [`parse`].
pub fn parse_with(source: &str, options: ParseOptions) -> JsonResult<Value> {
    let bytes = source.as_bytes();
    if options.validate_utf8 && std::str::from_utf8(bytes).is_err() {
        return Err(JsonError::new(ErrorCode::Utf8Error, "input is not valid UTF-8"));
    }
    let mut ctx = Context::new(bytes, options);
    ctx.skip_whitespace_and_comments();
    let value = ctx.parse_value()?;
    ctx.skip_whitespace_and_comments();
    if ctx.has_more() {
        return Err(ctx.error_here(ErrorCode::ParseError, "trailing characters after JSON value"));
    }
    Ok(value)
}

struct Context<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
    options: ParseOptions,
}

impl<'a> Context<'a> {
    fn new(source: &'a [u8], options: ParseOptions) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            options,
        }
    }

    fn has_more(&self) -> bool {
        self.pos < self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_here(&self, code: ErrorCode, message: &str) -> JsonError {
        JsonError::at(code, message, self.line, self.column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
                self.advance();
            }
            if self.options.allow_comments && self.peek() == Some(b'/') {
                if self.peek_at(1) == Some(b'/') {
                    while self.has_more() && self.peek() != Some(b'\n') {
                        self.advance();
                    }
                    continue;
                }
                if self.peek_at(1) == Some(b'*') {
                    self.advance();
                    self.advance();
                    while self.has_more() && !(self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/')) {
                        self.advance();
                    }
                    self.advance();
                    self.advance();
                    continue;
                }
            }
            break;
        }
    }

    fn validate_depth(&self) -> JsonResult<()> {
        if self.depth >= self.options.max_depth {
            return Err(self.error_here(
                ErrorCode::DepthExceeded,
                &format!("maximum nesting depth ({}) exceeded", self.options.max_depth),
            ));
        }
        Ok(())
    }

    fn parse_value(&mut self) -> JsonResult<Value> {
        self.skip_whitespace_and_comments();
        match self.peek() {
            None => Err(self.error_here(ErrorCode::UnexpectedEnd, "unexpected end of input")),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'N') if self.options.allow_special_numbers => {
                self.parse_literal("NaN", Value::Number(Number::nan()))
            }
            Some(b'I') if self.options.allow_special_numbers => {
                self.parse_literal("Infinity", Value::Number(Number::infinity()))
            }
            Some(b'-') if self.options.allow_special_numbers && self.peek_at(1) == Some(b'I') => {
                self.advance();
                self.parse_literal("Infinity", Value::Number(Number::neg_infinity()))
            }
            Some(c) if c == b'-' || c.is_ascii_digit() => self.parse_number().map(Value::Number),
            Some(c) => Err(self.error_here(
                ErrorCode::UnexpectedCharacter,
                &format!("unexpected character '{}'", c as char),
            )),
        }
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> JsonResult<Value> {
        for expected in literal.bytes() {
            match self.advance() {
                Some(c) if c == expected => {}
                _ => {
                    return Err(self.error_here(
                        ErrorCode::ParseError,
                        &format!("invalid literal, expected '{literal}'"),
                    ))
                }
            }
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> JsonResult<Number> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.advance();
        }
        let int_start = self.pos;
        match self.peek() {
            Some(b'0') => {
                self.advance();
                if self.options.strict_mode && matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    return Err(self.error_here(ErrorCode::ParseError, "leading zeros are not allowed"));
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
            Some(c) if c.is_ascii_digit() => {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
            _ => {
                return Err(self.error_here(ErrorCode::ParseError, "invalid number literal"));
            }
        }
        if self.pos == int_start {
            return Err(self.error_here(ErrorCode::ParseError, "invalid number literal"));
        }
        let mut is_integer = true;
        if self.peek() == Some(b'.') {
            is_integer = false;
            self.advance();
            let frac_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == frac_start {
                return Err(self.error_here(ErrorCode::ParseError, "expected digit after decimal point"));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_integer = false;
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            let exp_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == exp_start {
                return Err(self.error_here(ErrorCode::ParseError, "expected digit in exponent"));
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        if is_integer {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Number::Integer(i));
            }
        }
        text.parse::<f64>()
            .map(Number::Double)
            .map_err(|_| self.error_here(ErrorCode::ParseError, "invalid number literal"))
    }

    fn parse_string(&mut self) -> JsonResult<String> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error_here(ErrorCode::UnexpectedEnd, "unterminated string")),
                Some(b'"') => return Ok(out),
                Some(b'\\') => match self.advance() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'/') => out.push('/'),
                    Some(b'b') => out.push('\u{0008}'),
                    Some(b'f') => out.push('\u{000C}'),
                    Some(b'n') => out.push('\n'),
                    Some(b'r') => out.push('\r'),
                    Some(b't') => out.push('\t'),
                    Some(b'u') => {
                        let cp = self.parse_hex4()?;
                        if (0xD800..=0xDBFF).contains(&cp) {
                            // high surrogate: require a following \uDC00-\uDFFF
                            if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'u') {
                                self.advance();
                                self.advance();
                                let low = self.parse_hex4()?;
                                if (0xDC00..=0xDFFF).contains(&low) {
                                    let combined = 0x10000
                                        + ((cp - 0xD800) << 10)
                                        + (low - 0xDC00);
                                    if let Some(c) = char::from_u32(combined) {
                                        out.push(c);
                                        continue;
                                    }
                                }
                            }
                            return Err(self.error_here(
                                ErrorCode::Utf8Error,
                                "unpaired UTF-16 surrogate in \\u escape",
                            ));
                        }
                        match char::from_u32(cp) {
                            Some(c) => out.push(c),
                            None => {
                                return Err(self.error_here(
                                    ErrorCode::Utf8Error,
                                    "invalid \\u escape code point",
                                ))
                            }
                        }
                    }
                    Some(other) => {
                        if self.options.strict_mode {
                            return Err(self.error_here(
                                ErrorCode::ParseError,
                                &format!("unknown escape '\\{}'", other as char),
                            ));
                        }
                        out.push('\\');
                        out.push(other as char);
                    }
                    None => return Err(self.error_here(ErrorCode::UnexpectedEnd, "unterminated escape")),
                },
                Some(c) if c < 0x20 => {
                    return Err(self.error_here(
                        ErrorCode::ParseError,
                        "control character in string must be escaped",
                    ))
                }
                Some(c) if c < 0x80 => out.push(c as char),
                Some(lead) => {
                    // Multi-byte UTF-8 sequence: re-decode from the raw bytes.
                    let start = self.pos - 1;
                    let extra = utf8_extra_bytes(lead);
                    for _ in 0..extra {
                        self.advance();
                    }
                    match std::str::from_utf8(&self.source[start..self.pos]) {
                        Ok(s) => out.push_str(s),
                        Err(_) => {
                            return Err(self.error_here(ErrorCode::Utf8Error, "invalid UTF-8 in string"))
                        }
                    }
                }
            }
        }
    }

    fn parse_hex4(&mut self) -> JsonResult<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let c = self
                .advance()
                .ok_or_else(|| self.error_here(ErrorCode::UnexpectedEnd, "truncated \\u escape"))?;
            let digit = (c as char)
                .to_digit(16)
                .ok_or_else(|| self.error_here(ErrorCode::ParseError, "invalid hex digit in \\u escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_array(&mut self) -> JsonResult<Value> {
        if self.options.allow_recovery {
            return self.parse_array_with_recovery();
        }
        self.advance(); // '['
        self.depth += 1;
        self.validate_depth()?;
        let mut items = Vec::new();
        self.skip_whitespace_and_comments();
        if self.peek() == Some(b']') {
            self.advance();
            self.depth -= 1;
            return Ok(Value::Array(items));
        }
        loop {
            let item = self.parse_value()?;
            items.push(item);
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b',') => {
                    self.advance();
                    self.skip_whitespace_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b']') {
                        break;
                    }
                }
                Some(b']') => break,
                _ => {
                    self.depth -= 1;
                    return Err(self.error_here(ErrorCode::ParseError, "expected ',' or ']' in array"));
                }
            }
        }
        self.advance(); // ']'
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_array_with_recovery(&mut self) -> JsonResult<Value> {
        self.advance();
        self.depth += 1;
        self.validate_depth()?;
        let mut items = Vec::new();
        self.skip_whitespace_and_comments();
        loop {
            if self.peek() == Some(b']') || !self.has_more() {
                break;
            }
            match self.parse_value() {
                Ok(v) => items.push(v),
                Err(_) => {
                    items.push(Value::Null);
                    self.synchronize(&[b',', b']', b'}']);
                }
            }
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b',') => {
                    self.advance();
                    self.skip_whitespace_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b']') {
                        break;
                    }
                }
                _ => break,
            }
        }
        if self.peek() == Some(b']') {
            self.advance();
        }
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> JsonResult<Value> {
        if self.options.allow_recovery {
            return self.parse_object_with_recovery();
        }
        self.advance(); // '{'
        self.depth += 1;
        self.validate_depth()?;
        let mut obj = Object::new();
        self.skip_whitespace_and_comments();
        if self.peek() == Some(b'}') {
            self.advance();
            self.depth -= 1;
            return Ok(Value::Object(obj));
        }
        loop {
            self.skip_whitespace_and_comments();
            if self.peek() != Some(b'"') {
                self.depth -= 1;
                return Err(self.error_here(ErrorCode::ParseError, "expected string key in object"));
            }
            let key = self.parse_string()?;
            self.skip_whitespace_and_comments();
            if self.peek() != Some(b':') {
                self.depth -= 1;
                return Err(self.error_here(ErrorCode::ParseError, "expected ':' after object key"));
            }
            self.advance();
            let value = self.parse_value()?;
            obj.insert(key, value);
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b',') => {
                    self.advance();
                    self.skip_whitespace_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b'}') {
                        break;
                    }
                }
                Some(b'}') => break,
                _ => {
                    self.depth -= 1;
                    return Err(self.error_here(ErrorCode::ParseError, "expected ',' or '}' in object"));
                }
            }
        }
        self.advance(); // '}'
        self.depth -= 1;
        Ok(Value::Object(obj))
    }

    fn parse_object_with_recovery(&mut self) -> JsonResult<Value> {
        self.advance();
        self.depth += 1;
        self.validate_depth()?;
        let mut obj = Object::new();
        self.skip_whitespace_and_comments();
        loop {
            if self.peek() == Some(b'}') || !self.has_more() {
                break;
            }
            let pair = (|| -> JsonResult<(String, Value)> {
                if self.peek() != Some(b'"') {
                    return Err(self.error_here(ErrorCode::ParseError, "expected string key in object"));
                }
                let key = self.parse_string()?;
                self.skip_whitespace_and_comments();
                if self.peek() != Some(b':') {
                    return Err(self.error_here(ErrorCode::ParseError, "expected ':' after object key"));
                }
                self.advance();
                let value = self.parse_value()?;
                Ok((key, value))
            })();
            match pair {
                Ok((k, v)) => {
                    obj.insert(k, v);
                }
                Err(_) => {
                    self.synchronize(&[b',', b'}']);
                }
            }
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b',') => {
                    self.advance();
                    self.skip_whitespace_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b'}') {
                        break;
                    }
                }
                _ => break,
            }
        }
        if self.peek() == Some(b'}') {
            self.advance();
        }
        self.depth -= 1;
        Ok(Value::Object(obj))
    }

    /// Skip forward to the next occurrence of one of `targets`, used by the
    /// recovery-mode array/object parsers to resynchronize after a
    /// malformed element. Never crosses the document root.
    fn synchronize(&mut self, targets: &[u8]) {
        let mut local_depth = 0i32;
        while self.has_more() {
            match self.peek() {
                Some(b'[') | Some(b'{') => {
                    local_depth += 1;
                    self.advance();
                }
                Some(b']') | Some(b'}') if local_depth > 0 => {
                    local_depth -= 1;
                    self.advance();
                }
                Some(c) if local_depth == 0 && targets.contains(&c) => break,
                Some(b'"') => {
                    let _ = self.parse_string();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn utf8_extra_bytes(lead: u8) -> usize {
    if lead & 0xE0 == 0xC0 {
        1
    } else if lead & 0xF0 == 0xE0 {
        2
    } else if lead & 0xF8 == 0xF0 {
        3
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_object() {
        let v = parse(r#"{"name":"John","age":30,"city":"New York"}"#).unwrap();
        assert_eq!(v.field("name").get_string(), Some("John"));
        assert_eq!(v.field("age").get_integer(), Some(30));
    }

    #[test]
    fn integer_beyond_f64_precision_stays_exact() {
        let v = parse(r#"{"big": 9007199254740993}"#).unwrap();
        assert_eq!(v.field("big").get_integer(), Some(9_007_199_254_740_993));
    }

    #[test]
    fn leading_zero_rejected_in_strict_mode() {
        assert!(parse("01").is_err());
    }

    #[test]
    fn trailing_comma_requires_option() {
        assert!(parse_with("[1,2,]", ParseOptions::default()).is_err());
        let opts = ParseOptions {
            allow_trailing_commas: true,
            ..Default::default()
        };
        assert!(parse_with("[1,2,]", opts).is_ok());
    }

    #[test]
    fn comments_require_option() {
        assert!(parse_with("// hi\n1", ParseOptions::default()).is_err());
        let opts = ParseOptions {
            allow_comments: true,
            ..Default::default()
        };
        assert_eq!(
            parse_with("/* c */ 1 // trailing\n", opts)
                .unwrap()
                .get_integer(),
            Some(1)
        );
    }

    #[test]
    fn special_numbers_require_option() {
        assert!(parse_with("NaN", ParseOptions::default()).is_err());
        let opts = ParseOptions {
            allow_special_numbers: true,
            ..Default::default()
        };
        assert!(parse_with("NaN", opts).unwrap().is_nan());
        assert_eq!(parse_with("-Infinity", opts).unwrap().get_number(), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn depth_exceeded_fails_exactly_at_configured_depth() {
        let opts = ParseOptions {
            max_depth: 2,
            ..Default::default()
        };
        assert!(parse_with("[[1]]", opts).is_ok());
        assert!(parse_with("[[[1]]]", opts).is_err());
    }

    #[test]
    fn recovery_mode_inserts_null_for_malformed_array_element() {
        let opts = ParseOptions {
            allow_recovery: true,
            ..Default::default()
        };
        let v = parse_with("[1, @, 3]", opts).unwrap();
        let arr = v.get_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert!(arr[1].is_null());
    }

    #[test]
    fn surrogate_pair_merges_into_scalar_code_point() {
        let v = parse(r#""😀""#).unwrap();
        assert_eq!(v.get_string(), Some("\u{1F600}"));
    }

    #[test]
    fn location_is_reported_on_error() {
        let err = parse("{\n  \"a\": ,\n}").unwrap_err();
        assert!(err.message.contains("line"));
        assert!(err.message.contains("column"));
    }
}
