//! Literal reconstruction: turning source-level expressions into JSON values.
//!
//! Two modes share the same node dispatch:
//!
//! - [`reconstruct_template`] is used for request URLs. Only string literals and template
//!   literals are understood; everything else yields `None`.
//! - [`reconstruct_value`] is used for request bodies. It never fails; expressions it cannot
//!   evaluate statically become the [`VALUE_PLACEHOLDER`] token.
//!
//! Bare identifiers are treated as references to runtime variables and become `{{name}}`
//! placeholders in both modes.

use serde_json::{Map, Number, Value};
use tree_sitter::Node;

/// Stand-in for a body value that cannot be reconstructed.
pub const VALUE_PLACEHOLDER: &str = "{{VALUE}}";

/// Stand-in for a non-identifier expression embedded in a URL template.
pub const VAR_PLACEHOLDER: &str = "{{VAR}}";

/// Key used for object properties whose key is neither an identifier nor a string.
pub const FALLBACK_KEY: &str = "key";

/// Formats a runtime variable reference as a `{{name}}` placeholder.
pub fn variable_placeholder(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Reconstructs a URL template from a string or template literal.
///
/// Template substitutions become `{{name}}` for bare identifiers and [`VAR_PLACEHOLDER`]
/// for any other expression. Returns `None` for every other kind of expression.
pub fn reconstruct_template(node: Node<'_>, source: &str) -> Option<String> {
    let node = unwrap_parens(node);

    match node.kind() {
        "string" => Some(string_value(node, source)),
        "template_string" => Some(template_value(node, source)),
        _ => None,
    }
}

/// Reconstructs a JSON value from a literal expression.
///
/// Objects and arrays are reconstructed recursively. Anything outside the supported subset
/// becomes [`VALUE_PLACEHOLDER`].
pub fn reconstruct_value(node: Node<'_>, source: &str) -> Value {
    let node = unwrap_parens(node);

    match node.kind() {
        "string" => Value::String(string_value(node, source)),
        "number" => number_value(&source[node.byte_range()])
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(VALUE_PLACEHOLDER.to_string())),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        "identifier" | "undefined" => {
            Value::String(variable_placeholder(&source[node.byte_range()]))
        }
        "object" => object_value(node, source),
        "array" => Value::Array(
            named_children(node)
                .into_iter()
                .map(|element| reconstruct_value(element, source))
                .collect(),
        ),
        _ => Value::String(VALUE_PLACEHOLDER.to_string()),
    }
}

/// Builds a map from the `key: value` and shorthand properties of an object literal.
///
/// Spread elements and methods are skipped. When a key repeats, the later property wins.
fn object_value(node: Node<'_>, source: &str) -> Value {
    let mut map = Map::new();

    for property in named_children(node) {
        match property.kind() {
            "pair" => {
                let key = property
                    .child_by_field_name("key")
                    .map(|key| property_key(key, source))
                    .unwrap_or_else(|| FALLBACK_KEY.to_string());
                let value = property
                    .child_by_field_name("value")
                    .map(|value| reconstruct_value(value, source))
                    .unwrap_or_else(|| Value::String(VALUE_PLACEHOLDER.to_string()));
                map.insert(key, value);
            }
            "shorthand_property_identifier" => {
                let name = &source[property.byte_range()];
                map.insert(name.to_string(), Value::String(variable_placeholder(name)));
            }
            _ => {}
        }
    }

    Value::Object(map)
}

fn property_key(key: Node<'_>, source: &str) -> String {
    match key.kind() {
        "property_identifier" => source[key.byte_range()].to_string(),
        "string" => string_value(key, source),
        _ => FALLBACK_KEY.to_string(),
    }
}

/// Decoded contents of a quoted string literal.
fn string_value(node: Node<'_>, source: &str) -> String {
    let text = &source[node.byte_range()];
    if text.len() < 2 {
        return String::new();
    }
    unescape(&text[1..text.len() - 1])
}

/// Concatenates the cooked text of a template literal with placeholders for substitutions.
fn template_value(node: Node<'_>, source: &str) -> String {
    let inner_start = node.start_byte() + 1;
    let inner_end = node.end_byte().saturating_sub(1).max(inner_start);

    let mut raw = String::new();
    let mut cursor = inner_start;

    for child in named_children(node) {
        if child.kind() != "template_substitution" {
            continue;
        }
        raw.push_str(&cook(&source[cursor..child.start_byte()]));
        raw.push_str(&substitution_placeholder(child, source));
        cursor = child.end_byte();
    }
    raw.push_str(&cook(&source[cursor..inner_end]));

    raw
}

fn substitution_placeholder(substitution: Node<'_>, source: &str) -> String {
    match named_children(substitution).first().map(|expr| unwrap_parens(*expr)) {
        Some(expr) if expr.kind() == "identifier" => {
            variable_placeholder(&source[expr.byte_range()])
        }
        _ => VAR_PLACEHOLDER.to_string(),
    }
}

/// Template literal text with line terminators normalized and escapes decoded.
fn cook(raw: &str) -> String {
    unescape(&raw.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Parses a numeric literal the way a JavaScript engine would read it.
///
/// Every literal is read as a double, so integers beyond 2^53 round the same way they do at
/// runtime. The value is then written out as `Number.prototype.toString` would write it
/// (`1000`, `0.000001`, `1e+21`). BigInt literals and values that do not fit a finite double
/// yield `None`.
fn number_value(text: &str) -> Option<Number> {
    if text.ends_with('n') {
        return None;
    }
    let digits = text.replace('_', "");

    let radix = match digits.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };

    let value = match radix {
        Some(radix) => u128::from_str_radix(&digits[2..], radix).ok()? as f64,
        None => digits.parse::<f64>().ok()?,
    };
    if !value.is_finite() {
        return None;
    }

    js_number_text(value).parse::<Number>().ok()
}

/// Formats a finite double like JavaScript's `Number.prototype.toString`.
fn js_number_text(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", js_number_text(-value));
    }

    // shortest round-trip digits, e.g. "1.2345e3"
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    }
}

/// Decodes JavaScript string escape sequences.
///
/// `\u` escapes are collected as UTF-16 code units so that surrogate pairs written as two
/// escapes decode to a single character. Unknown escapes decode to the escaped character.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_units(&mut units, &mut out);
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            break;
        };

        match escaped {
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                match code {
                    Some(code) if code <= 0xFFFF => units.push(code as u16),
                    Some(code) => {
                        flush_units(&mut units, &mut out);
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    None => {
                        flush_units(&mut units, &mut out);
                        out.push(char::REPLACEMENT_CHARACTER);
                    }
                }
                continue;
            }
            _ => flush_units(&mut units, &mut out),
        }

        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => out.push(char::from(byte)),
                    Err(_) => out.push(char::REPLACEMENT_CHARACTER),
                }
            }
            // line continuation
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    flush_units(&mut units, &mut out);
    out
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if !units.is_empty() {
        out.push_str(&String::from_utf16_lossy(units));
        units.clear();
    }
}

/// Strips any number of enclosing parentheses.
pub(crate) fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match named_children(node).first() {
            Some(inner) => node = *inner,
            None => break,
        }
    }
    node
}

/// Named children of `node`, excluding comments.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}
