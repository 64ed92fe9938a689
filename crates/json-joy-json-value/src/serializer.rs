//! Pretty/compact JSON writer with key sorting, indent control, and
//! Unicode escape policy.

use crate::number::Number;
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    /// `-1` for compact (no newlines/padding); otherwise indent width.
    pub indent: i32,
    pub sort_keys: bool,
    pub escape_unicode: bool,
    pub compact_arrays: bool,
    pub max_precision: usize,
    pub allow_special_numbers: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: -1,
            sort_keys: true,
            escape_unicode: false,
            compact_arrays: false,
            max_precision: 15,
            allow_special_numbers: false,
        }
    }
}

pub fn serialize(value: &Value, options: SerializeOptions) -> String {
    let mut out = String::new();
    let mut w = Writer { out: &mut out, options };
    w.write_value(value, 0);
    out
}

struct Writer<'a> {
    out: &'a mut String,
    options: SerializeOptions,
}

impl<'a> Writer<'a> {
    fn pretty(&self) -> bool {
        self.options.indent >= 0
    }

    fn newline_indent(&mut self, depth: usize) {
        if self.pretty() {
            self.out.push('\n');
            for _ in 0..(depth * self.options.indent as usize) {
                self.out.push(' ');
            }
        }
    }

    fn write_value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.write_number(n),
            Value::String(s) => self.write_string(s),
            Value::Array(a) => self.write_array(a, depth),
            Value::Object(o) => self.write_object(o, depth),
        }
    }

    fn write_number(&mut self, n: &Number) {
        if (n.is_nan() || n.is_infinity()) && !self.options.allow_special_numbers {
            self.out.push_str("null");
            return;
        }
        if let Number::Double(d) = n {
            self.out.push_str(&format_with_precision(*d, self.options.max_precision));
        } else {
            self.out.push_str(&n.to_display_string());
        }
    }

    fn write_string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\u{0008}' => self.out.push_str("\\b"),
                '\u{000C}' => self.out.push_str("\\f"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c if self.options.escape_unicode && (c as u32) >= 0x80 => {
                    let mut buf = [0u16; 2];
                    for unit in c.encode_utf16(&mut buf) {
                        self.out.push_str(&format!("\\u{:04x}", unit));
                    }
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn write_array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.out.push_str("[]");
            return;
        }
        let compact = !self.pretty() || self.options.compact_arrays;
        self.out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
                if compact && self.pretty() {
                    self.out.push(' ');
                }
            }
            if !compact {
                self.newline_indent(depth + 1);
            }
            self.write_value(item, depth + 1);
        }
        if !compact {
            self.newline_indent(depth);
        }
        self.out.push(']');
    }

    fn write_object(&mut self, obj: &crate::value::Object, depth: usize) {
        if obj.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        let mut keys: Vec<&String> = obj.keys().collect();
        if self.options.sort_keys {
            keys.sort();
        }
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent(depth + 1);
            self.write_string(key);
            self.out.push(':');
            if self.pretty() {
                self.out.push(' ');
            }
            self.write_value(&obj[*key], depth + 1);
        }
        self.newline_indent(depth);
        self.out.push('}');
    }
}

fn format_with_precision(d: f64, precision: usize) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if d == 0.0 {
        return if d.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }
    let precision = precision.max(1);
    for sig in 1..=precision {
        let candidate = format_significant(d, sig, precision);
        if candidate.parse::<f64>() == Ok(d) {
            return candidate;
        }
    }
    format_significant(d, precision, precision)
}

/// Formats `d` with exactly `sig` significant digits, choosing plain decimal
/// notation for ordinary magnitudes and `e`-notation once the exponent falls
/// outside `[-6, precision)`, so plain notation never pads on more zero
/// digits than the configured precision budget allows (e.g. `1e20` with the
/// default 15-digit precision becomes `1e+20` rather than a 21-digit
/// literal, and `1e300` never turns into a 300-digit literal).
fn format_significant(d: f64, sig: usize, precision: usize) -> String {
    let sci = format!("{:.*e}", sig - 1, d);
    let (mantissa, exp) = sci.split_once('e').expect("Rust scientific notation always has an exponent");
    let exponent: i32 = exp.parse().expect("exponent is always a valid integer");
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();

    if exponent >= -6 && exponent < precision as i32 {
        build_plain(negative, &digits, exponent)
    } else {
        build_scientific(negative, &digits, exponent)
    }
}

fn build_plain(negative: bool, digits: &str, exponent: i32) -> String {
    let sign = if negative { "-" } else { "" };
    let body = if exponent >= 0 {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            format!("{digits}{}", "0".repeat(int_len - digits.len()))
        } else {
            let (int_part, frac_part) = digits.split_at(int_len);
            trim_trailing_zeros(format!("{int_part}.{frac_part}"))
        }
    } else {
        let zeros = "0".repeat((-exponent - 1) as usize);
        trim_trailing_zeros(format!("0.{zeros}{digits}"))
    };
    format!("{sign}{body}")
}

fn build_scientific(negative: bool, digits: &str, exponent: i32) -> String {
    let sign = if negative { "-" } else { "" };
    let mantissa = if digits.len() > 1 {
        trim_trailing_zeros(format!("{}.{}", &digits[..1], &digits[1..]))
    } else {
        digits.to_string()
    };
    let exp_sign = if exponent >= 0 { "+" } else { "-" };
    format!("{sign}{mantissa}e{exp_sign}{}", exponent.abs())
}

fn trim_trailing_zeros(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trip_preserves_structure() {
        let input = r#"{"name":"John","age":30,"city":"New York"}"#;
        let v = parse(input).unwrap();
        let out = serialize(
            &v,
            SerializeOptions {
                indent: -1,
                sort_keys: false,
                ..Default::default()
            },
        );
        assert_eq!(out, input);
    }

    #[test]
    fn sorted_keys_are_lexicographic() {
        let v = parse(r#"{"b":1,"a":2}"#).unwrap();
        let out = serialize(&v, SerializeOptions::default());
        assert_eq!(out, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn special_numbers_emit_null_unless_allowed() {
        let v = Value::Number(Number::nan());
        assert_eq!(serialize(&v, SerializeOptions::default()), "null");
        let opts = SerializeOptions {
            allow_special_numbers: true,
            ..Default::default()
        };
        assert_eq!(serialize(&v, opts), "NaN");
    }

    #[test]
    fn control_characters_are_always_escaped() {
        let v = Value::String("a\u{0001}b".to_string());
        assert_eq!(serialize(&v, SerializeOptions::default()), "\"a\\u0001b\"");
    }

    #[test]
    fn pretty_printing_indents_and_newlines() {
        let v = parse(r#"{"a":[1,2]}"#).unwrap();
        let out = serialize(
            &v,
            SerializeOptions {
                indent: 2,
                sort_keys: false,
                ..Default::default()
            },
        );
        assert!(out.contains('\n'));
        assert!(out.contains("  "));
    }

    #[test]
    fn idempotent_serialization() {
        let v = parse(r#"{"x":1,"y":[true,false,null]}"#).unwrap();
        let opts = SerializeOptions::default();
        assert_eq!(serialize(&v, opts), serialize(&v, opts));
    }

    #[test]
    fn large_magnitude_double_uses_scientific_notation_within_precision_budget() {
        let v = Value::Number(Number::Double(1e20));
        let out = serialize(&v, SerializeOptions::default());
        assert_eq!(out, "1e+20");
        assert_eq!(out.parse::<f64>().unwrap(), 1e20);

        let huge = Value::Number(Number::Double(1e300));
        let out = serialize(&huge, SerializeOptions::default());
        assert_eq!(out, "1e+300");
    }

    #[test]
    fn ordinary_magnitude_double_stays_plain() {
        let v = Value::Number(Number::Double(123.456));
        assert_eq!(serialize(&v, SerializeOptions::default()), "123.456");
    }
}
