// src/core/template/format.rs

//! `printf`-style formatting and date layouts, following the conventions template authors
//! already know from Go (`%v`, `%5.2f`, `2006-01-02 15:04`).

use super::value::{Value, format_float};
use chrono::TimeDelta;
use std::fmt::Write;

/// Widths and precisions above this are rejected, as Go's `fmt` does.
const MAX_WIDTH_OR_PRECISION: usize = 1_000_000;

/// Fraction digits past this are always zero for an `f64`.
const MAX_FIXED_DIGITS: usize = 1100;

/// Significant digits past this are always zero for an `f64`.
const MAX_SIGNIFICANT_DIGITS: usize = 800;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Quotes a string with double quotes, escaping control characters.
pub(crate) fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{0b}' => out.push_str("\\v"),
            c if c.is_control() && u32::from(c) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn bad_verb(verb: char, arg: &Value) -> String {
    match arg {
        Value::Nil => format!("%!{}(<nil>)", verb),
        other => format!("%!{}({}={})", verb, other.type_name(), other),
    }
}

fn pad(body: &str, spec: &Spec, numeric: bool) -> String {
    let len = body.chars().count();
    let Some(width) = spec.width.filter(|w| *w > len) else {
        return body.to_string();
    };
    let fill = width - len;
    if spec.minus {
        return format!("{}{}", body, " ".repeat(fill));
    }
    if spec.zero && numeric {
        let (sign, digits) = match body.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (c.to_string(), body.get(1..).unwrap_or_default()),
            _ => (String::new(), body),
        };
        return format!("{}{}{}", sign, "0".repeat(fill), digits);
    }
    format!("{}{}", " ".repeat(fill), body)
}

fn signed(body: String, negative: bool, spec: &Spec) -> String {
    if negative {
        format!("-{}", body)
    } else if spec.plus {
        format!("+{}", body)
    } else if spec.space {
        format!(" {}", body)
    } else {
        body
    }
}

fn format_int(verb: char, i: i64, spec: &Spec) -> Option<String> {
    let magnitude = i.unsigned_abs();
    let mut digits = match verb {
        'd' | 'v' => magnitude.to_string(),
        'x' => format!("{:x}", magnitude),
        'X' => format!("{:X}", magnitude),
        'o' => format!("{:o}", magnitude),
        'O' => format!("0o{:o}", magnitude),
        'b' => format!("{:b}", magnitude),
        _ => return None,
    };
    if let Some(precision) = spec.precision {
        if digits.len() < precision {
            digits = format!("{}{}", "0".repeat(precision - digits.len()), digits);
        }
    }
    if spec.sharp {
        match verb {
            'x' => digits.insert_str(0, "0x"),
            'X' => digits.insert_str(0, "0X"),
            'o' => digits.insert(0, '0'),
            _ => {}
        }
    }
    Some(signed(digits, i < 0, spec))
}

/// `%f` for any precision up to the allowed maximum.
fn format_fixed(f: f64, precision: usize) -> String {
    let mut out = format!("{:.*}", precision.min(MAX_FIXED_DIGITS), f);
    if let Some(zeros) = precision.checked_sub(MAX_FIXED_DIGITS).filter(|z| *z > 0) {
        out.push_str(&"0".repeat(zeros));
    }
    out
}

/// `%e` for any precision up to the allowed maximum, before the exponent sign is fixed up.
fn format_scientific(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision.min(MAX_SIGNIFICANT_DIGITS), f);
    match precision.checked_sub(MAX_SIGNIFICANT_DIGITS).filter(|z| *z > 0) {
        Some(zeros) => match raw.split_once('e') {
            Some((mantissa, exp)) => format!("{}{}e{}", mantissa, "0".repeat(zeros), exp),
            None => raw,
        },
        None => raw,
    }
}

/// `%g` with an explicit precision, counted in significant digits.
fn format_general(f: f64, precision: usize) -> String {
    let precision = precision.clamp(1, MAX_SIGNIFICANT_DIGITS);
    let raw = format!("{:.*e}", precision - 1, f);
    let Some((mantissa, exp)) = raw.split_once('e') else {
        return raw;
    };
    let exponent: i64 = exp.parse().unwrap_or(0);
    let limit = i64::try_from(precision).unwrap_or(i64::MAX);
    if exponent < -4 || exponent >= limit {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
    } else {
        let decimals = usize::try_from(limit - 1 - exponent).unwrap_or(0);
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn with_exponent_sign(raw: &str) -> String {
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => raw.to_string(),
    }
}

fn format_float_verb(verb: char, f: f64, spec: &Spec) -> Option<String> {
    if f.is_nan() {
        return Some("NaN".to_string());
    }
    let negative = f.is_sign_negative() && f != 0.0;
    let magnitude = f.abs();
    if magnitude.is_infinite() {
        return Some(signed("Inf".to_string(), negative, spec));
    }
    let body = match verb {
        'f' | 'F' => format_fixed(magnitude, spec.precision.unwrap_or(6)),
        'e' => with_exponent_sign(&format_scientific(magnitude, spec.precision.unwrap_or(6))),
        'E' => with_exponent_sign(&format_scientific(magnitude, spec.precision.unwrap_or(6)))
            .to_uppercase(),
        'g' | 'v' => match spec.precision {
            Some(p) => format_general(magnitude, p),
            None => format_float(magnitude),
        },
        'G' => match spec.precision {
            Some(p) => format_general(magnitude, p),
            None => format_float(magnitude),
        }
        .to_uppercase(),
        _ => return None,
    };
    Some(signed(body, negative, spec))
}

fn truncate_chars(s: &str, precision: Option<usize>) -> String {
    match precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    }
}

fn format_one(verb: char, arg: &Value, spec: &Spec) -> String {
    let numeric = matches!(arg, Value::Int(_) | Value::Float(_));
    let body = match (verb, arg) {
        ('T', a) => Some(a.type_name().to_string()),
        ('v', Value::Str(s)) if spec.sharp => Some(go_quote(s)),
        ('v', Value::Int(i)) => format_int('d', *i, spec),
        ('v', Value::Float(f)) => format_float_verb('g', *f, spec),
        ('v', a) => Some(a.to_string()),
        ('s', Value::Str(s)) => Some(truncate_chars(s, spec.precision)),
        ('s', a @ (Value::List(_) | Value::Map(_) | Value::Time(_))) => Some(a.to_string()),
        ('q', Value::Str(s)) => Some(go_quote(s)),
        ('q', Value::Int(i)) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .map(|c| format!("'{}'", c)),
        ('t', Value::Bool(b)) => Some(b.to_string()),
        ('c', Value::Int(i)) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .map(String::from),
        ('U', Value::Int(i)) => Some(format!("U+{:04X}", i)),
        ('d' | 'o' | 'O' | 'b', Value::Int(i)) => format_int(verb, *i, spec),
        ('x' | 'X', Value::Int(i)) => format_int(verb, *i, spec),
        ('x', Value::Str(s)) => Some(s.bytes().map(|b| format!("{:02x}", b)).collect()),
        ('X', Value::Str(s)) => Some(s.bytes().map(|b| format!("{:02X}", b)).collect()),
        ('f' | 'F' | 'e' | 'E' | 'g' | 'G', Value::Float(f)) => format_float_verb(verb, *f, spec),
        _ => None,
    };
    match body {
        Some(body) => pad(&body, spec, numeric),
        None => bad_verb(verb, arg),
    }
}

/// Reads the argument consumed by a `*` width or precision.
///
/// Yields `None` when the argument is missing, not an integer or out of range. A missing
/// argument is not consumed.
fn star_argument(args: &[Value], next_arg: &mut usize) -> Option<i64> {
    let arg = args.get(*next_arg)?;
    *next_arg += 1;
    let limit = i64::try_from(MAX_WIDTH_OR_PRECISION).unwrap_or(i64::MAX);
    match arg {
        Value::Int(i) if i.unsigned_abs() <= limit.unsigned_abs() => Some(*i),
        _ => None,
    }
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        let digit = usize::try_from(d).unwrap_or(0);
        number = Some(number.unwrap_or(0).saturating_mul(10).saturating_add(digit));
    }
    number
}

/// Formats `args` according to a Go-style format string.
///
/// Mistakes never fail: they are reported inline (`%!d(string=x)`, `%!s(MISSING)`,
/// `%!(EXTRA int=1)`), so a template always renders something inspectable.
pub(crate) fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut next_arg = 0;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.sharp = true,
                _ => break,
            }
            chars.next();
        }
        let mut too_large = false;
        if chars.peek() == Some(&'*') {
            chars.next();
            match star_argument(args, &mut next_arg) {
                Some(width) => {
                    if width < 0 {
                        spec.minus = true;
                        spec.zero = false;
                    }
                    spec.width = usize::try_from(width.unsigned_abs()).ok();
                }
                None => out.push_str("%!(BADWIDTH)"),
            }
        } else {
            spec.width = read_number(&mut chars);
            too_large |= spec.width.is_some_and(|w| w > MAX_WIDTH_OR_PRECISION);
        }
        if !too_large && chars.peek() == Some(&'.') {
            chars.next();
            if chars.peek() == Some(&'*') {
                chars.next();
                match star_argument(args, &mut next_arg).and_then(|p| usize::try_from(p).ok()) {
                    Some(precision) => spec.precision = Some(precision),
                    None => out.push_str("%!(BADPREC)"),
                }
            } else {
                let precision = read_number(&mut chars).unwrap_or(0);
                too_large = precision > MAX_WIDTH_OR_PRECISION;
                spec.precision = Some(precision);
            }
        }
        if too_large {
            // An oversized literal swallows the rest of the format, leaving no verb.
            chars.by_ref().for_each(drop);
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
            Some(arg) => out.push_str(&format_one(verb, arg, &spec)),
            None => {
                let _ = write!(out, "%!{}(MISSING)", verb);
            }
        }
        next_arg += 1;
    }

    if let Some(extra) = args.get(next_arg..).filter(|rest| !rest.is_empty()) {
        let parts: Vec<String> = extra
            .iter()
            .map(|a| format!("{}={}", a.type_name(), a))
            .collect();
        let _ = write!(out, "%!(EXTRA {})", parts.join(", "));
    }
    out
}

/// Escapes text for HTML the way the `html` builtin does.
pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

/// Escapes text for a JavaScript string literal the way the `js` builtin does.
pub(crate) fn js_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '=' => out.push_str("\\u003D"),
            c if c < ' ' => {
                let _ = write!(out, "\\u00{:02X}", u32::from(c));
            }
            c if !c.is_ascii() && c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// Escapes text for a URL query, with spaces as `+`.
pub(crate) fn query_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b' ' => out.push('+'),
            other => {
                let _ = write!(out, "%{:02X}", other);
            }
        }
    }
    out
}

/// Parses a Go duration string such as `1h30m`, `-1.5h` or `300ms`.
pub(crate) fn parse_go_duration(s: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number: f64 = rest.get(..number_len)?.parse().ok()?;
        rest = rest.get(number_len..)?;
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match rest.get(..unit_len)? {
            "ns" => 1.0,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        nanos += number * scale;
        rest = rest.get(unit_len..)?;
    }
    if negative {
        nanos = -nanos;
    }
    // Go durations are int64 nanoseconds.
    if !nanos.is_finite() || nanos.abs() >= 9.2e18 {
        return None;
    }
    Some(TimeDelta::nanoseconds(float_nanos(nanos)))
}

#[allow(clippy::cast_possible_truncation)]
fn float_nanos(nanos: f64) -> i64 {
    nanos.round() as i64
}

/// Go reference-time chunks and their strftime equivalents, longest first so that
/// `2006` wins over `2` and `January` over `Jan`.
const LAYOUT_CHUNKS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("Z07:00", "%:z"),
    ("-07:00", "%:z"),
    ("Z0700", "%z"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Recognises `.000`, `,999999` and similar fractional-second chunks.
fn fraction_chunk(rest: &str) -> Option<(usize, String)> {
    let mut chars = rest.chars();
    let separator = chars.next().filter(|c| *c == '.' || *c == ',')?;
    let digit = chars.next().filter(|c| *c == '0' || *c == '9')?;
    let run = 1 + chars.clone().take_while(|c| *c == digit).count();
    let after = rest.chars().nth(run + 1);
    if after.is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    let precision = match run {
        1..=3 => 3,
        4..=6 => 6,
        _ => 9,
    };
    let spec = if separator == '.' {
        format!("%.{}f", precision)
    } else {
        format!(",%{}f", precision)
    };
    Some((run + 1, spec))
}

/// Translates a Go reference-time layout (`2006-01-02 15:04:05`) into a strftime string.
pub(crate) fn go_layout_to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    while let Some(c) = rest.chars().next() {
        if let Some((len, spec)) = fraction_chunk(rest) {
            out.push_str(&spec);
            rest = rest.get(len..).unwrap_or_default();
            continue;
        }
        if let Some((chunk, spec)) = LAYOUT_CHUNKS.iter().find(|(chunk, _)| rest.starts_with(chunk)) {
            out.push_str(spec);
            rest = rest.get(chunk.len()..).unwrap_or_default();
            continue;
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = rest.get(c.len_utf8()..).unwrap_or_default();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_verbs() {
        let args = [Value::from("World"), Value::Int(42), Value::Float(3.14159)];
        assert_eq!(sprintf("%s %d %.2f", &args), "World 42 3.14");
    }

    #[test]
    fn test_width_and_flags() {
        assert_eq!(sprintf("[%5d]", &[Value::Int(42)]), "[   42]");
        assert_eq!(sprintf("[%-5s]", &[Value::from("ab")]), "[ab   ]");
        assert_eq!(sprintf("[%05d]", &[Value::Int(-42)]), "[-0042]");
        assert_eq!(sprintf("%+d", &[Value::Int(5)]), "+5");
        assert_eq!(sprintf("%#x", &[Value::Int(255)]), "0xff");
    }

    #[test]
    fn test_value_verb_uses_natural_formatting() {
        let list = Value::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sprintf("%v|%v|%v", &[list, Value::Nil, Value::Bool(true)]), "[a b]|<nil>|true");
    }

    #[test]
    fn test_quote_verb() {
        assert_eq!(sprintf("%q", &[Value::from("a\"b\n")]), "\"a\\\"b\\n\"");
    }

    #[test]
    fn test_mistakes_are_reported_inline() {
        assert_eq!(sprintf("%d", &[Value::from("5")]), "%!d(string=5)");
        assert_eq!(sprintf("%s %s", &[Value::from("a")]), "a %!s(MISSING)");
        assert_eq!(sprintf("%s", &[Value::from("a"), Value::Int(1)]), "a%!(EXTRA int=1)");
        assert_eq!(sprintf("100%%", &[]), "100%");
    }

    #[test]
    fn test_exponent_and_general_verbs() {
        assert_eq!(sprintf("%e", &[Value::Float(1234.5678)]), "1.234568e+03");
        assert_eq!(sprintf("%g", &[Value::Float(0.000012)]), "1.2e-05");
        assert_eq!(sprintf("%.3g", &[Value::Float(3.14159)]), "3.14");
    }

    #[test]
    fn test_star_width_and_precision_come_from_arguments() {
        let pi = Value::Float(3.14159);
        assert_eq!(sprintf("%.*f", &[Value::Int(2), pi.clone()]), "3.14");
        assert_eq!(sprintf("[%*.*f]", &[Value::Int(6), Value::Int(1), pi.clone()]), "[   3.1]");
        assert_eq!(sprintf("[%*d]", &[Value::Int(-4), Value::Int(7)]), "[7   ]");
        assert_eq!(
            sprintf("%.*f", &[Value::from("2"), pi.clone()]),
            "%!(BADPREC)3.141590"
        );
        assert_eq!(sprintf("%.*f", &[Value::Int(-1), pi]), "%!(BADPREC)3.141590");
        assert_eq!(sprintf("%*d", &[Value::from("x"), Value::Int(1)]), "%!(BADWIDTH)1");
    }

    #[test]
    fn test_oversized_width_and_precision_are_rejected() {
        assert_eq!(
            sprintf("%.100000000000f", &[Value::Float(1.0)]),
            "%!(NOVERB)%!(EXTRA float64=1)"
        );
        assert_eq!(
            sprintf("%099999999999d!", &[Value::Int(1)]),
            "%!(NOVERB)%!(EXTRA int=1)"
        );
        assert_eq!(
            sprintf("%*d", &[Value::Int(1_000_001), Value::Int(1)]),
            "%!(BADWIDTH)1"
        );
        assert_eq!(
            sprintf("%.*f", &[Value::Int(99_999_999), Value::Float(1.0)]),
            "%!(BADPREC)1.000000"
        );
    }

    #[test]
    fn test_precision_beyond_float_digits_pads_with_zeros() {
        let wide = sprintf("%.70000f", &[Value::Float(0.5)]);
        assert_eq!(wide.len(), 2 + 70_000);
        assert!(wide.starts_with("0.5000"));
        assert!(wide.ends_with('0'));

        let sci = sprintf("%.70000e", &[Value::Float(1.5)]);
        assert!(sci.starts_with("1.5000"));
        assert!(sci.ends_with("e+00"));

        assert_eq!(sprintf("%.70000g", &[Value::Float(0.25)]), "0.25");
        assert_eq!(sprintf("%1000000d", &[Value::Int(1)]).len(), 1_000_000);
    }

    #[test]
    fn test_html_js_and_query_escaping() {
        assert_eq!(
            html_escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(
            js_escape("it's <b>\"x\"</b>\n"),
            "it\\'s \\u003Cb\\u003E\\\"x\\\"\\u003C/b\\u003E\\u000A"
        );
        assert_eq!(query_escape("a b&c=d/é"), "a+b%26c%3Dd%2F%C3%A9");
    }

    #[test]
    fn test_go_durations() {
        assert_eq!(parse_go_duration("1h30m"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_go_duration("-1.5h"), Some(TimeDelta::minutes(-90)));
        assert_eq!(parse_go_duration("300ms"), Some(TimeDelta::milliseconds(300)));
        assert_eq!(parse_go_duration("0"), Some(TimeDelta::zero()));
        assert_eq!(parse_go_duration("2d"), None);
        assert_eq!(parse_go_duration("h"), None);
        assert_eq!(parse_go_duration(""), None);
    }

    #[test]
    fn test_go_layouts_translate_to_strftime() {
        assert_eq!(go_layout_to_strftime("2006-01-02"), "%Y-%m-%d");
        assert_eq!(go_layout_to_strftime("15:04:05"), "%H:%M:%S");
        assert_eq!(go_layout_to_strftime("Mon Jan _2 2006"), "%a %b %e %Y");
        assert_eq!(go_layout_to_strftime("January 2, 3:04PM"), "%B %-d, %-I:%M%p");
        assert_eq!(go_layout_to_strftime("15:04:05.000 -0700"), "%H:%M:%S%.3f %z");
        assert_eq!(go_layout_to_strftime("15:04 %"), "%H:%M %%");
    }
}
