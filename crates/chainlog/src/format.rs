// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Runtime message formatting for printf-style call sites.
//!
//! Rust formatting is checked at compile time, but callers coming from
//! printf-style interfaces hand over a template and a list of [`Value`]s.
//! The supported verbs are `%v %s %d %f %F %e %t %q %x %X %%`, with optional
//! `-`, `+`, `0` flags, width and precision. Problems are rendered inline
//! (`%!d(MISSING)`, `%!(EXTRA ...)`, `%!(BADWIDTH)`) instead of failing.

use crate::field::Value;
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

/// Largest accepted width or precision
pub const MAX_FORMAT_NUMBER: usize = 1_000_000;

/// Render a leveled message
///
/// With no arguments the message is returned unchanged. With arguments, an
/// empty message concatenates them and a non-empty one is used as a template.
pub fn prepare(message: &str, args: &[Value]) -> String {
    if args.is_empty() {
        message.to_string()
    } else if message.is_empty() {
        sprint(args)
    } else {
        sprintf(message, args)
    }
}

/// Concatenate values, adding a space between operands when neither is text
pub fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (index, arg) in args.iter().enumerate() {
        if index > 0 && !arg.is_string() && !args[index - 1].is_string() {
            out.push(' ');
        }
        let _ = write!(out, "{}", arg);
    }
    out
}

#[derive(Debug, Default, Clone, Copy)]
struct Directive {
    left_align: bool,
    plus: bool,
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Substitute values into a printf-style template
pub fn sprintf(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left_align = true,
                '+' => directive.plus = true,
                '0' => directive.zero_pad = true,
                ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        match take_number(&mut chars) {
            Number::Absent => {}
            Number::Value(width) => directive.width = Some(width),
            Number::TooLarge => out.push_str("%!(BADWIDTH)"),
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            match take_number(&mut chars) {
                Number::Absent => directive.precision = Some(0),
                Number::Value(precision) => directive.precision = Some(precision),
                Number::TooLarge => out.push_str("%!(BADPREC)"),
            }
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        match args.get(next_arg) {
            Some(arg) => {
                next_arg += 1;
                let rendered = render_verb(verb, directive, arg);
                pad_into(&mut out, &rendered, directive, is_numeric(arg));
            }
            None => {
                let _ = write!(out, "%!{}(MISSING)", verb);
            }
        }
    }

    if next_arg < args.len() {
        let extra = args[next_arg..]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "%!(EXTRA {})", extra);
    }
    out
}

enum Number {
    Absent,
    Value(usize),
    TooLarge,
}

/// Consume a run of digits, rejecting values above [`MAX_FORMAT_NUMBER`]
fn take_number(chars: &mut Peekable<Chars<'_>>) -> Number {
    let mut number = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        let value: usize = number.unwrap_or(0);
        number = Some(value.saturating_mul(10).saturating_add(digit as usize));
        chars.next();
    }
    match number {
        None => Number::Absent,
        Some(value) if value > MAX_FORMAT_NUMBER => Number::TooLarge,
        Some(value) => Number::Value(value),
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Uint(_) | Value::Float(_))
}

fn render_verb(verb: char, directive: Directive, arg: &Value) -> String {
    match (verb, arg) {
        ('v' | 's', _) => with_sign(arg.to_string(), directive, arg),
        ('d', Value::Int(_) | Value::Uint(_)) => with_sign(arg.to_string(), directive, arg),
        ('f' | 'F', _) => match as_float(arg) {
            Some(f) => with_sign(format!("{:.*}", directive.precision.unwrap_or(6), f), directive, arg),
            None => bad_verb(verb, arg),
        },
        ('e', _) => match as_float(arg) {
            Some(f) => with_sign(format!("{:.*e}", directive.precision.unwrap_or(6), f), directive, arg),
            None => bad_verb(verb, arg),
        },
        ('t', Value::Bool(b)) => b.to_string(),
        ('q', _) => format!("{:?}", arg.to_string()),
        ('x', Value::Int(i)) => signed_hex(*i, false),
        ('X', Value::Int(i)) => signed_hex(*i, true),
        ('x', Value::Uint(u)) => format!("{:x}", u),
        ('X', Value::Uint(u)) => format!("{:X}", u),
        ('x', Value::String(s)) => hex::encode(s),
        ('X', Value::String(s)) => hex::encode_upper(s),
        ('x', Value::Binary(b) | Value::ByteString(b)) => hex::encode(b),
        ('X', Value::Binary(b) | Value::ByteString(b)) => hex::encode_upper(b),
        _ => bad_verb(verb, arg),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Uint(u) => Some(*u as f64),
        _ => None,
    }
}

fn signed_hex(value: i64, upper: bool) -> String {
    let magnitude = value.unsigned_abs();
    let digits = if upper {
        format!("{:X}", magnitude)
    } else {
        format!("{:x}", magnitude)
    };
    if value < 0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

fn with_sign(rendered: String, directive: Directive, arg: &Value) -> String {
    if directive.plus && is_numeric(arg) && !rendered.starts_with('-') {
        format!("+{}", rendered)
    } else {
        rendered
    }
}

fn bad_verb(verb: char, arg: &Value) -> String {
    format!("%!{}({})", verb, arg)
}

fn pad_into(out: &mut String, rendered: &str, directive: Directive, numeric: bool) {
    let len = rendered.chars().count();
    let padding = directive.width.map_or(0, |width| width.saturating_sub(len));
    if padding == 0 {
        out.push_str(rendered);
    } else if directive.left_align {
        out.push_str(rendered);
        out.push_str(&" ".repeat(padding));
    } else if directive.zero_pad && numeric {
        let (sign, digits) = match rendered.strip_prefix(|c: char| c == '-' || c == '+') {
            Some(rest) => rendered.split_at(rendered.len() - rest.len()),
            None => ("", rendered),
        };
        out.push_str(sign);
        out.push_str(&"0".repeat(padding));
        out.push_str(digits);
    } else {
        out.push_str(&" ".repeat(padding));
        out.push_str(rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_without_args_is_verbatim() {
        assert_eq!(prepare("100% done", &[]), "100% done");
    }

    #[test]
    fn test_prepare_empty_message_concatenates() {
        let values = [Value::from("user="), Value::from(7), Value::from(8)];
        assert_eq!(prepare("", &values), "user=7 8");
    }

    #[test]
    fn test_prepare_formats_template() {
        let values = [Value::from("ada"), Value::from(3)];
        assert_eq!(prepare("user %s has %d items", &values), "user ada has 3 items");
    }

    #[test]
    fn test_sprint_spacing_rules() {
        let values = [Value::from(1), Value::from(2), Value::from("x"), Value::from(3)];
        assert_eq!(sprint(&values), "1 2x3");
    }

    #[test]
    fn test_oversized_width_and_precision_are_inline() {
        assert_eq!(sprintf("%99999999999999d", &[Value::from(1)]), "%!(BADWIDTH)1");
        assert_eq!(
            sprintf("%.99999999999999999999f", &[Value::from(1.5)]),
            "%!(BADPREC)1.500000"
        );
        assert_eq!(sprintf("%1000001s|", &[Value::from("x")]), "%!(BADWIDTH)x|");

        let padded = sprintf("%1000000d", &[Value::from(7)]);
        assert_eq!(padded.len(), MAX_FORMAT_NUMBER);
        assert!(padded.ends_with('7'));
    }

    #[test]
    fn test_width_precision_and_flags() {
        let values = [Value::from(1.23456), Value::from(42), Value::from("id")];
        assert_eq!(sprintf("%.2f|%05d|%-4s|", &values), "1.23|00042|id  |");
        assert_eq!(sprintf("%+d", &[Value::from(5)]), "+5");
        assert_eq!(sprintf("%06.2f", &[Value::from(-1.5)]), "-01.50");
    }

    #[test]
    fn test_missing_and_extra_arguments() {
        assert_eq!(sprintf("%s and %s", &[Value::from("one")]), "one and %!s(MISSING)");
        assert_eq!(
            sprintf("only %d", &[Value::from(1), Value::from(2), Value::from("three")]),
            "only 1%!(EXTRA 2, three)"
        );
    }

    #[test]
    fn test_verb_mismatch_is_inline() {
        assert_eq!(sprintf("%d", &[Value::from("abc")]), "%!d(abc)");
        assert_eq!(sprintf("%t", &[Value::from(true)]), "true");
        assert_eq!(sprintf("%q", &[Value::from("a\"b")]), r#""a\"b""#);
        assert_eq!(sprintf("%x|%X", &[Value::from(255), Value::from(-255)]), "ff|-FF");
        assert_eq!(sprintf("100%%", &[]), "100%");
    }
}
