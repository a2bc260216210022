// src/core/template/funcs.rs

//! The function library available to every template.
//!
//! Go's builtins (`eq`, `index`, `printf`, ...) plus a sprig-like set of string, list, map,
//! math, date, encoding, hashing, random, regex and path helpers. Math helpers are lenient:
//! strings and floats are converted to integers the way sprig does, so `[[ . | add1 ]]`
//! works on a command-line argument.
//!
//! `must*` variants report failures as errors; their plain counterparts swallow the failures
//! sprig swallows (`fromJson` gives nil, `toDate` the zero time, `regexMatch` false).

use super::format::{
    go_layout_to_strftime, go_quote, html_escape, js_escape, parse_go_duration, query_escape,
    sprintf,
};
use super::value::{Value, int_to_float};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use rand::{Rng, seq::SliceRandom};
use regex::{NoExpand, Regex};
use ring::digest;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Upper bound for strings built by `repeat`, `indent` and the random helpers.
const MAX_GENERATED_LEN: usize = 64 * 1024 * 1024;

/// Upper bound for lists built by `until`, `untilStep` and `seq`.
const MAX_SEQUENCE_LEN: usize = 1_000_000;

/// A template function: receives evaluated arguments, returns a value or an error message.
pub(crate) type Func = fn(&[Value]) -> Result<Value, String>;

/// A registered function together with the argument counts it accepts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FuncDef {
    pub(crate) min_args: usize,
    pub(crate) max_args: Option<usize>,
    pub(crate) call: Func,
}

macro_rules! funcs {
    ($($name:literal => ($min:expr, $max:expr, $call:expr)),* $(,)?) => {{
        let mut map: HashMap<&'static str, FuncDef> = HashMap::new();
        $(map.insert($name, FuncDef { min_args: $min, max_args: $max, call: $call });)*
        map
    }};
}

lazy_static! {
    /// Every function a template can call, by name.
    pub(crate) static ref FUNCS: HashMap<&'static str, FuncDef> = funcs! {
        // Go builtins
        "and" => (1, None, and),
        "or" => (1, None, or),
        "not" => (1, Some(1), not),
        "eq" => (2, None, eq),
        "ne" => (2, Some(2), ne),
        "lt" => (2, Some(2), lt),
        "le" => (2, Some(2), le),
        "gt" => (2, Some(2), gt),
        "ge" => (2, Some(2), ge),
        "len" => (1, Some(1), len),
        "index" => (1, None, index),
        "slice" => (1, Some(3), slice),
        "print" => (0, None, print),
        "printf" => (1, None, printf),
        "println" => (0, None, println),
        "html" => (0, None, html),
        "js" => (0, None, js),
        "urlquery" => (0, None, urlquery),
        "call" => (1, None, call),
        // strings
        "upper" => (1, Some(1), upper),
        "lower" => (1, Some(1), lower),
        "title" => (1, Some(1), title),
        "untitle" => (1, Some(1), untitle),
        "trim" => (1, Some(1), trim),
        "trimAll" => (2, Some(2), trim_all),
        "trimPrefix" => (2, Some(2), trim_prefix),
        "trimSuffix" => (2, Some(2), trim_suffix),
        "trunc" => (2, Some(2), trunc),
        "abbrev" => (2, Some(2), abbrev),
        "repeat" => (2, Some(2), repeat),
        "replace" => (3, Some(3), replace),
        "contains" => (2, Some(2), contains),
        "hasPrefix" => (2, Some(2), has_prefix),
        "hasSuffix" => (2, Some(2), has_suffix),
        "quote" => (0, None, quote),
        "squote" => (0, None, squote),
        "cat" => (0, None, cat),
        "indent" => (2, Some(2), indent),
        "nindent" => (2, Some(2), nindent),
        "nospace" => (1, Some(1), nospace),
        "initials" => (1, Some(1), initials),
        "snakecase" => (1, Some(1), snakecase),
        "camelcase" => (1, Some(1), camelcase),
        "kebabcase" => (1, Some(1), kebabcase),
        "swapcase" => (1, Some(1), swapcase),
        "substr" => (3, Some(3), substr),
        "wrap" => (2, Some(2), wrap),
        "plural" => (3, Some(3), plural),
        "toString" => (1, Some(1), to_string),
        // lists
        "list" => (0, None, list),
        "first" => (1, Some(1), first),
        "last" => (1, Some(1), last),
        "rest" => (1, Some(1), rest),
        "initial" => (1, Some(1), initial),
        "reverse" => (1, Some(1), reverse),
        "uniq" => (1, Some(1), uniq),
        "has" => (2, Some(2), has),
        "append" => (2, Some(2), append),
        "prepend" => (2, Some(2), prepend),
        "concat" => (0, None, concat),
        "sortAlpha" => (1, Some(1), sort_alpha),
        "compact" => (1, Some(1), compact),
        "join" => (2, Some(2), join),
        "split" => (2, Some(2), split),
        "splitList" => (2, Some(2), split_list),
        "until" => (1, Some(1), until),
        "untilStep" => (3, Some(3), until_step),
        "seq" => (0, None, seq),
        "mustFirst" => (1, Some(1), first),
        "mustLast" => (1, Some(1), last),
        "mustRest" => (1, Some(1), rest),
        "mustInitial" => (1, Some(1), initial),
        "mustReverse" => (1, Some(1), reverse),
        "mustUniq" => (1, Some(1), uniq),
        "mustHas" => (2, Some(2), has),
        "mustAppend" => (2, Some(2), append),
        "mustPrepend" => (2, Some(2), prepend),
        "mustCompact" => (1, Some(1), compact),
        // maps
        "dict" => (0, None, dict),
        "get" => (2, Some(2), get),
        "hasKey" => (2, Some(2), has_key),
        "keys" => (1, None, keys),
        "values" => (1, Some(1), values),
        "set" => (3, Some(3), set),
        "unset" => (2, Some(2), unset),
        "pick" => (1, None, pick),
        "omit" => (1, None, omit),
        "pluck" => (1, None, pluck),
        "dig" => (3, None, dig),
        "merge" => (1, None, merge),
        "mergeOverwrite" => (1, None, merge_overwrite),
        "mustMerge" => (1, None, merge),
        "mustMergeOverwrite" => (1, None, merge_overwrite),
        // math
        "add" => (0, None, add),
        "add1" => (1, Some(1), add1),
        "sub" => (2, Some(2), sub),
        "mul" => (1, None, mul),
        "div" => (2, Some(2), div),
        "mod" => (2, Some(2), modulo),
        "max" => (1, None, max),
        "min" => (1, None, min),
        "floor" => (1, Some(1), floor),
        "ceil" => (1, Some(1), ceil),
        "round" => (2, Some(3), round),
        "atoi" => (1, Some(1), atoi),
        "int" => (1, Some(1), int),
        "float64" => (1, Some(1), float64),
        "randInt" => (2, Some(2), rand_int),
        // dates
        "now" => (0, Some(0), now),
        "date" => (2, Some(2), date),
        "dateInZone" => (3, Some(3), date_in_zone),
        "htmlDate" => (1, Some(1), html_date),
        "htmlDateInZone" => (2, Some(2), html_date_in_zone),
        "toDate" => (2, Some(2), to_date),
        "mustToDate" => (2, Some(2), must_to_date),
        "dateModify" => (2, Some(2), date_modify),
        "mustDateModify" => (2, Some(2), must_date_modify),
        "unixEpoch" => (1, Some(1), unix_epoch),
        // defaults
        "default" => (1, None, default),
        "empty" => (1, Some(1), empty),
        "coalesce" => (0, None, coalesce),
        "ternary" => (3, Some(3), ternary),
        "fail" => (1, Some(1), fail),
        "required" => (2, Some(2), required),
        // types
        "typeOf" => (1, Some(1), type_of),
        "typeIs" => (2, Some(2), type_is),
        "kindOf" => (1, Some(1), kind_of),
        "kindIs" => (2, Some(2), kind_is),
        // encoding and hashing
        "toJson" => (1, Some(1), to_json),
        "toPrettyJson" => (1, Some(1), to_pretty_json),
        "mustToJson" => (1, Some(1), to_json),
        "mustToPrettyJson" => (1, Some(1), to_pretty_json),
        "fromJson" => (1, Some(1), from_json),
        "mustFromJson" => (1, Some(1), must_from_json),
        "b64enc" => (1, Some(1), b64enc),
        "b64dec" => (1, Some(1), b64dec),
        "sha1sum" => (1, Some(1), sha1sum),
        "sha256sum" => (1, Some(1), sha256sum),
        "sha512sum" => (1, Some(1), sha512sum),
        // random
        "randAlphaNum" => (1, Some(1), rand_alpha_num),
        "randAlpha" => (1, Some(1), rand_alpha),
        "randNumeric" => (1, Some(1), rand_numeric),
        "randAscii" => (1, Some(1), rand_ascii),
        // regex
        "regexMatch" => (2, Some(2), regex_match),
        "mustRegexMatch" => (2, Some(2), must_regex_match),
        "regexFind" => (2, Some(2), regex_find),
        "mustRegexFind" => (2, Some(2), regex_find),
        "regexFindAll" => (3, Some(3), regex_find_all),
        "mustRegexFindAll" => (3, Some(3), regex_find_all),
        "regexReplaceAll" => (3, Some(3), regex_replace_all),
        "mustRegexReplaceAll" => (3, Some(3), regex_replace_all),
        "regexReplaceAllLiteral" => (3, Some(3), regex_replace_all_literal),
        "mustRegexReplaceAllLiteral" => (3, Some(3), regex_replace_all_literal),
        "regexSplit" => (3, Some(3), regex_split),
        "mustRegexSplit" => (3, Some(3), regex_split),
        "regexQuoteMeta" => (1, Some(1), regex_quote_meta),
        // environment and paths
        "env" => (1, Some(1), env),
        "expandenv" => (1, Some(1), expandenv),
        "base" => (1, Some(1), base),
        "dir" => (1, Some(1), dir),
        "ext" => (1, Some(1), ext),
        "clean" => (1, Some(1), clean),
        // misc
        "uuidv4" => (0, Some(0), uuidv4),
    };
}

/// Whether `name` is a registered function.
pub(crate) fn is_function(name: &str) -> bool {
    FUNCS.contains_key(name)
}

// --- argument helpers ---

static NIL: Value = Value::Nil;

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&NIL)
}

fn wrong_type(expected: &str, got: &Value) -> String {
    format!(
        "wrong type for value; expected {}; got {}",
        expected,
        got.type_name()
    )
}

fn string_arg(args: &[Value], i: usize) -> Result<&str, String> {
    match arg(args, i) {
        Value::Str(s) => Ok(s),
        other => Err(wrong_type("string", other)),
    }
}

fn list_arg(args: &[Value], i: usize) -> Result<&[Value], String> {
    match arg(args, i) {
        Value::List(items) => Ok(items),
        other => Err(wrong_type("[]interface {}", other)),
    }
}

fn map_arg(args: &[Value], i: usize) -> Result<&BTreeMap<String, Value>, String> {
    match arg(args, i) {
        Value::Map(map) => Ok(map),
        other => Err(wrong_type("map[string]interface {}", other)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(f: f64) -> i64 {
    f as i64
}

/// Lenient integer conversion: strings are parsed (with `0x`/`0o`/`0b` prefixes), floats
/// truncated, booleans are 0/1 and anything else is 0.
fn to_int64(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        Value::Float(f) => float_to_int(*f),
        Value::Bool(b) => i64::from(*b),
        Value::Str(s) => parse_int_literal(s.trim()).unwrap_or(0),
        _ => 0,
    }
}

fn parse_int_literal(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, body) = if let Some(b) = digits.strip_prefix("0x").or(digits.strip_prefix("0X")) {
        (16, b)
    } else if let Some(b) = digits.strip_prefix("0o").or(digits.strip_prefix("0O")) {
        (8, b)
    } else if let Some(b) = digits.strip_prefix("0b").or(digits.strip_prefix("0B")) {
        (2, b)
    } else {
        (10, digits)
    };
    let value = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -value } else { value })
}

fn to_float64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => int_to_float(*i),
        Value::Float(f) => *f,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Str(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn int_arg(args: &[Value], i: usize) -> i64 {
    to_int64(arg(args, i))
}

/// Converts a count or width to `usize`, treating negatives as zero.
fn count_arg(args: &[Value], i: usize) -> usize {
    usize::try_from(int_arg(args, i)).unwrap_or(0)
}

/// sprig's `strval`: strings stay as they are, everything else uses `%v`.
fn strval(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn str_value(s: impl Into<String>) -> Result<Value, String> {
    Ok(Value::Str(s.into()))
}

/// Checks the size of a string about to be built; `None` means the size overflowed.
fn generated_len(len: Option<usize>) -> Result<usize, String> {
    len.filter(|n| *n <= MAX_GENERATED_LEN)
        .ok_or_else(|| format!("result would exceed {} bytes", MAX_GENERATED_LEN))
}

// --- Go builtins ---

fn and(args: &[Value]) -> Result<Value, String> {
    Ok(args
        .iter()
        .find(|v| !v.is_truthy())
        .or_else(|| args.last())
        .cloned()
        .unwrap_or(Value::Nil))
}

fn or(args: &[Value]) -> Result<Value, String> {
    Ok(args
        .iter()
        .find(|v| v.is_truthy())
        .or_else(|| args.last())
        .cloned()
        .unwrap_or(Value::Nil))
}

fn not(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!arg(args, 0).is_truthy()))
}

fn eq(args: &[Value]) -> Result<Value, String> {
    let first = arg(args, 0);
    for other in args.iter().skip(1) {
        if first.loose_eq(other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!arg(args, 0).loose_eq(arg(args, 1))?))
}

fn lt(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(arg(args, 0).loose_cmp(arg(args, 1))?.is_lt()))
}

fn le(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(arg(args, 0).loose_cmp(arg(args, 1))?.is_le()))
}

fn gt(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(arg(args, 0).loose_cmp(arg(args, 1))?.is_gt()))
}

fn ge(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(arg(args, 0).loose_cmp(arg(args, 1))?.is_ge()))
}

fn length_of(v: &Value) -> Result<usize, String> {
    match v {
        Value::Str(s) => Ok(s.len()),
        Value::List(items) => Ok(items.len()),
        Value::Map(map) => Ok(map.len()),
        other => Err(format!("len of type {}", other.type_name())),
    }
}

fn len(args: &[Value]) -> Result<Value, String> {
    let n = length_of(arg(args, 0))?;
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn position(index: &Value, len: usize) -> Result<usize, String> {
    let i = match index {
        Value::Int(i) => *i,
        other => return Err(format!("cannot index slice/array with type {}", other.type_name())),
    };
    usize::try_from(i)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| format!("index out of range: {}", i))
}

fn index(args: &[Value]) -> Result<Value, String> {
    let mut current = arg(args, 0).clone();
    for key in args.iter().skip(1) {
        current = match &current {
            Value::List(items) => {
                let i = position(key, items.len())?;
                items.get(i).cloned().unwrap_or(Value::Nil)
            }
            Value::Str(s) => {
                let i = position(key, s.len())?;
                s.as_bytes().get(i).map_or(Value::Nil, |b| Value::Int(i64::from(*b)))
            }
            Value::Map(map) => match key {
                Value::Str(k) => map.get(k).cloned().unwrap_or(Value::Nil),
                other => {
                    return Err(format!(
                        "value has type {}; should be string",
                        other.type_name()
                    ));
                }
            },
            Value::Nil => return Err("index of untyped nil".to_string()),
            other => return Err(format!("can't index item of type {}", other.type_name())),
        };
    }
    Ok(current)
}

fn slice_bounds(args: &[Value], len: usize) -> Result<(usize, usize), String> {
    let bound = |i: usize, default: usize| -> Result<usize, String> {
        match args.get(i) {
            None => Ok(default),
            Some(Value::Int(n)) => usize::try_from(*n)
                .ok()
                .filter(|n| *n <= len)
                .ok_or_else(|| format!("index out of range: {}", n)),
            Some(other) => Err(format!("cannot index slice/array with type {}", other.type_name())),
        }
    };
    let start = bound(1, 0)?;
    let end = bound(2, len)?;
    if start > end {
        return Err(format!("invalid slice index: {} > {}", start, end));
    }
    Ok((start, end))
}

fn slice(args: &[Value]) -> Result<Value, String> {
    match arg(args, 0) {
        Value::List(items) => {
            let (start, end) = slice_bounds(args, items.len())?;
            Ok(Value::List(items.get(start..end).unwrap_or_default().to_vec()))
        }
        Value::Str(s) => {
            let (start, end) = slice_bounds(args, s.len())?;
            s.get(start..end)
                .map(Value::from)
                .ok_or_else(|| format!("slice {}:{} splits a character", start, end))
        }
        other => Err(format!("can't slice item of type {}", other.type_name())),
    }
}

/// `fmt.Sprint`: a space goes between operands when neither side is a string.
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, v) in args.iter().enumerate() {
        let is_str = matches!(v, Value::Str(_));
        let prev_is_str = i > 0 && matches!(args.get(i - 1), Some(Value::Str(_)));
        if i > 0 && !is_str && !prev_is_str {
            out.push(' ');
        }
        let _ = write!(out, "{}", v);
    }
    out
}

fn print(args: &[Value]) -> Result<Value, String> {
    str_value(sprint(args))
}

fn printf(args: &[Value]) -> Result<Value, String> {
    let format = string_arg(args, 0)?;
    str_value(sprintf(format, args.get(1..).unwrap_or_default()))
}

fn println(args: &[Value]) -> Result<Value, String> {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    str_value(format!("{}\n", parts.join(" ")))
}

/// The text the escaping builtins work on: a lone string as is, otherwise `fmt.Sprint`.
fn escaper_input(args: &[Value]) -> String {
    match args {
        [Value::Str(s)] => s.clone(),
        _ => sprint(args),
    }
}

fn html(args: &[Value]) -> Result<Value, String> {
    str_value(html_escape(&escaper_input(args)))
}

fn js(args: &[Value]) -> Result<Value, String> {
    str_value(js_escape(&escaper_input(args)))
}

fn urlquery(args: &[Value]) -> Result<Value, String> {
    str_value(query_escape(&escaper_input(args)))
}

/// Templates never hold function values, so `call` can only report what it was given.
fn call(args: &[Value]) -> Result<Value, String> {
    Err(match arg(args, 0) {
        Value::Nil => "call of nil".to_string(),
        other => format!("non-function of type {}", other.type_name()),
    })
}

// --- strings ---

fn upper(args: &[Value]) -> Result<Value, String> {
    str_value(string_arg(args, 0)?.to_uppercase())
}

fn lower(args: &[Value]) -> Result<Value, String> {
    str_value(string_arg(args, 0)?.to_lowercase())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn title(args: &[Value]) -> Result<Value, String> {
    let mut out = String::new();
    let mut prev = ' ';
    for c in string_arg(args, 0)?.chars() {
        if is_word_char(prev) {
            out.push(c);
        } else {
            out.extend(c.to_uppercase());
        }
        prev = c;
    }
    str_value(out)
}

fn untitle(args: &[Value]) -> Result<Value, String> {
    let mut out = String::new();
    let mut prev = ' ';
    for c in string_arg(args, 0)?.chars() {
        if prev.is_whitespace() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = c;
    }
    str_value(out)
}

fn trim(args: &[Value]) -> Result<Value, String> {
    str_value(string_arg(args, 0)?.trim())
}

fn trim_all(args: &[Value]) -> Result<Value, String> {
    let cutset: Vec<char> = string_arg(args, 0)?.chars().collect();
    str_value(string_arg(args, 1)?.trim_matches(cutset.as_slice()))
}

fn trim_prefix(args: &[Value]) -> Result<Value, String> {
    let prefix = string_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    str_value(s.strip_prefix(prefix).unwrap_or(s))
}

fn trim_suffix(args: &[Value]) -> Result<Value, String> {
    let suffix = string_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    str_value(s.strip_suffix(suffix).unwrap_or(s))
}

fn trunc(args: &[Value]) -> Result<Value, String> {
    let n = int_arg(args, 0);
    let chars: Vec<char> = string_arg(args, 1)?.chars().collect();
    let len = i64::try_from(chars.len()).unwrap_or(i64::MAX);
    let kept: String = if n < 0 && len + n > 0 {
        let skip = usize::try_from(len + n).unwrap_or(0);
        chars.iter().skip(skip).collect()
    } else if n >= 0 && len > n {
        chars.iter().take(usize::try_from(n).unwrap_or(0)).collect()
    } else {
        chars.iter().collect()
    };
    str_value(kept)
}

fn abbrev(args: &[Value]) -> Result<Value, String> {
    let width = count_arg(args, 0);
    let s = string_arg(args, 1)?;
    if width < 4 || s.chars().count() <= width {
        return str_value(s);
    }
    let kept: String = s.chars().take(width - 3).collect();
    str_value(format!("{}...", kept))
}

fn repeat(args: &[Value]) -> Result<Value, String> {
    let count = count_arg(args, 0);
    let s = string_arg(args, 1)?;
    generated_len(s.len().checked_mul(count))?;
    str_value(s.repeat(count))
}

fn replace(args: &[Value]) -> Result<Value, String> {
    let old = string_arg(args, 0)?;
    let new = string_arg(args, 1)?;
    str_value(string_arg(args, 2)?.replace(old, new))
}

fn contains(args: &[Value]) -> Result<Value, String> {
    let needle = string_arg(args, 0)?;
    Ok(Value::Bool(string_arg(args, 1)?.contains(needle)))
}

fn has_prefix(args: &[Value]) -> Result<Value, String> {
    let prefix = string_arg(args, 0)?;
    Ok(Value::Bool(string_arg(args, 1)?.starts_with(prefix)))
}

fn has_suffix(args: &[Value]) -> Result<Value, String> {
    let suffix = string_arg(args, 0)?;
    Ok(Value::Bool(string_arg(args, 1)?.ends_with(suffix)))
}

fn quote(args: &[Value]) -> Result<Value, String> {
    let parts: Vec<String> = args
        .iter()
        .filter(|v| !matches!(v, Value::Nil))
        .map(|v| go_quote(&strval(v)))
        .collect();
    str_value(parts.join(" "))
}

fn squote(args: &[Value]) -> Result<Value, String> {
    let parts: Vec<String> = args
        .iter()
        .filter(|v| !matches!(v, Value::Nil))
        .map(|v| format!("'{}'", strval(v)))
        .collect();
    str_value(parts.join(" "))
}

fn cat(args: &[Value]) -> Result<Value, String> {
    let parts: Vec<String> = args
        .iter()
        .filter(|v| !matches!(v, Value::Nil))
        .map(strval)
        .collect();
    str_value(parts.join(" "))
}

fn indent_text(spaces: usize, s: &str) -> Result<String, String> {
    let lines = s.matches('\n').count() + 1;
    generated_len(
        spaces
            .checked_mul(lines)
            .and_then(|pad| pad.checked_add(s.len())),
    )?;
    let pad = " ".repeat(spaces);
    Ok(format!("{}{}", pad, s.replace('\n', &format!("\n{}", pad))))
}

fn indent(args: &[Value]) -> Result<Value, String> {
    str_value(indent_text(count_arg(args, 0), string_arg(args, 1)?)?)
}

fn nindent(args: &[Value]) -> Result<Value, String> {
    str_value(format!("\n{}", indent_text(count_arg(args, 0), string_arg(args, 1)?)?))
}

fn nospace(args: &[Value]) -> Result<Value, String> {
    str_value(
        string_arg(args, 0)?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>(),
    )
}

fn initials(args: &[Value]) -> Result<Value, String> {
    str_value(
        string_arg(args, 0)?
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect::<String>(),
    )
}

/// Splits identifiers into words at separators and case changes:
/// `HTTPServer_name` becomes `HTTP`, `Server`, `name`.
fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, c) in chars.iter().copied().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        let boundary = c.is_uppercase()
            && prev.is_some_and(|p| {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            });
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn snakecase(args: &[Value]) -> Result<Value, String> {
    let words: Vec<String> = words(string_arg(args, 0)?)
        .iter()
        .map(|w| w.to_lowercase())
        .collect();
    str_value(words.join("_"))
}

fn kebabcase(args: &[Value]) -> Result<Value, String> {
    let words: Vec<String> = words(string_arg(args, 0)?)
        .iter()
        .map(|w| w.to_lowercase())
        .collect();
    str_value(words.join("-"))
}

fn camelcase(args: &[Value]) -> Result<Value, String> {
    str_value(
        words(string_arg(args, 0)?)
            .iter()
            .map(|w| capitalize(w))
            .collect::<String>(),
    )
}

fn swapcase(args: &[Value]) -> Result<Value, String> {
    let mut out = String::new();
    for c in string_arg(args, 0)?.chars() {
        if c.is_uppercase() {
            out.extend(c.to_lowercase());
        } else if c.is_lowercase() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    str_value(out)
}

fn substr(args: &[Value]) -> Result<Value, String> {
    let start = int_arg(args, 0);
    let end = int_arg(args, 1);
    let chars: Vec<char> = string_arg(args, 2)?.chars().collect();
    let len = chars.len();
    let to_index = |n: i64| usize::try_from(n).unwrap_or(0).min(len);
    let range = if start < 0 {
        0..to_index(end)
    } else if end < 0 || to_index(end) >= len {
        to_index(start)..len
    } else {
        to_index(start)..to_index(end)
    };
    let picked = chars.get(range).unwrap_or_default();
    str_value(picked.iter().collect::<String>())
}

fn wrap_text(width: usize, s: &str) -> String {
    let width = width.max(1);
    let mut lines = Vec::new();
    for line in s.split('\n') {
        let mut current = String::new();
        for word in line.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines.join("\n")
}

fn wrap(args: &[Value]) -> Result<Value, String> {
    str_value(wrap_text(count_arg(args, 0), string_arg(args, 1)?))
}

fn plural(args: &[Value]) -> Result<Value, String> {
    let one = string_arg(args, 0)?;
    let many = string_arg(args, 1)?;
    str_value(if int_arg(args, 2) == 1 { one } else { many })
}

fn to_string(args: &[Value]) -> Result<Value, String> {
    str_value(strval(arg(args, 0)))
}

// --- lists ---

fn list(args: &[Value]) -> Result<Value, String> {
    Ok(Value::List(args.to_vec()))
}

fn first(args: &[Value]) -> Result<Value, String> {
    Ok(list_arg(args, 0)?.first().cloned().unwrap_or(Value::Nil))
}

fn last(args: &[Value]) -> Result<Value, String> {
    Ok(list_arg(args, 0)?.last().cloned().unwrap_or(Value::Nil))
}

fn rest(args: &[Value]) -> Result<Value, String> {
    Ok(match list_arg(args, 0)?.split_first() {
        Some((_, tail)) => Value::List(tail.to_vec()),
        None => Value::Nil,
    })
}

fn initial(args: &[Value]) -> Result<Value, String> {
    Ok(match list_arg(args, 0)?.split_last() {
        Some((_, head)) => Value::List(head.to_vec()),
        None => Value::Nil,
    })
}

fn reverse(args: &[Value]) -> Result<Value, String> {
    Ok(Value::List(list_arg(args, 0)?.iter().rev().cloned().collect()))
}

fn uniq(args: &[Value]) -> Result<Value, String> {
    let mut seen: Vec<Value> = Vec::new();
    for item in list_arg(args, 0)? {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    Ok(Value::List(seen))
}

fn has(args: &[Value]) -> Result<Value, String> {
    let needle = arg(args, 0);
    Ok(Value::Bool(match arg(args, 1) {
        Value::List(items) => items.contains(needle),
        Value::Nil => false,
        other => return Err(wrong_type("[]interface {}", other)),
    }))
}

fn append(args: &[Value]) -> Result<Value, String> {
    let mut items = list_arg(args, 0)?.to_vec();
    items.push(arg(args, 1).clone());
    Ok(Value::List(items))
}

fn prepend(args: &[Value]) -> Result<Value, String> {
    let mut items = vec![arg(args, 1).clone()];
    items.extend_from_slice(list_arg(args, 0)?);
    Ok(Value::List(items))
}

fn concat(args: &[Value]) -> Result<Value, String> {
    let mut items = Vec::new();
    for i in 0..args.len() {
        items.extend_from_slice(list_arg(args, i)?);
    }
    Ok(Value::List(items))
}

fn sort_alpha(args: &[Value]) -> Result<Value, String> {
    let mut items: Vec<String> = match arg(args, 0) {
        Value::List(items) => items.iter().map(strval).collect(),
        other => vec![strval(other)],
    };
    items.sort();
    Ok(Value::from(items))
}

fn compact(args: &[Value]) -> Result<Value, String> {
    Ok(Value::List(
        list_arg(args, 0)?
            .iter()
            .filter(|v| v.is_truthy())
            .cloned()
            .collect(),
    ))
}

fn join(args: &[Value]) -> Result<Value, String> {
    let sep = string_arg(args, 0)?;
    let parts: Vec<String> = match arg(args, 1) {
        Value::List(items) => items
            .iter()
            .filter(|v| !matches!(v, Value::Nil))
            .map(strval)
            .collect(),
        Value::Nil => Vec::new(),
        other => vec![strval(other)],
    };
    str_value(parts.join(sep))
}

fn split(args: &[Value]) -> Result<Value, String> {
    let sep = string_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    let map = s
        .split(sep)
        .enumerate()
        .map(|(i, part)| (format!("_{}", i), Value::from(part)))
        .collect();
    Ok(Value::Map(map))
}

fn split_list(args: &[Value]) -> Result<Value, String> {
    let sep = string_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    Ok(Value::List(s.split(sep).map(Value::from).collect()))
}

/// The integers from `start` towards `stop` (exclusive) in steps of `step`. Counting down
/// needs a negative step and counting up a positive one; anything else is empty.
fn step_range(start: i64, stop: i64, step: i64) -> Result<Vec<i64>, String> {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let count = if (stop < start && step < 0) || (stop > start && step > 0) {
        ((stop - start).abs() + step.abs() - 1) / step.abs()
    } else {
        0
    };
    if usize::try_from(count).map_or(true, |n| n > MAX_SEQUENCE_LEN) {
        return Err(format!("sequence of {} items is too long", count));
    }
    Ok((0..count)
        .filter_map(|k| i64::try_from(start + k * step).ok())
        .collect())
}

fn int_list(items: Vec<i64>) -> Value {
    Value::List(items.into_iter().map(Value::Int).collect())
}

fn until(args: &[Value]) -> Result<Value, String> {
    let count = int_arg(args, 0);
    let step = if count < 0 { -1 } else { 1 };
    Ok(int_list(step_range(0, count, step)?))
}

fn until_step(args: &[Value]) -> Result<Value, String> {
    Ok(int_list(step_range(
        int_arg(args, 0),
        int_arg(args, 1),
        int_arg(args, 2),
    )?))
}

/// Like the `seq` utility: `seq 3`, `seq 2 5` or `seq 10 -2 1`, inclusive of the end.
fn seq(args: &[Value]) -> Result<Value, String> {
    let params: Vec<i64> = args.iter().map(to_int64).collect();
    let numbers = match params.as_slice() {
        [end] => {
            let step = if *end < 1 { -1 } else { 1 };
            step_range(1, end.wrapping_add(step), step)?
        }
        [start, end] => {
            let step = if end < start { -1 } else { 1 };
            step_range(*start, end.wrapping_add(step), step)?
        }
        [start, step, end] => {
            let towards = if end < start { -1 } else { 1 };
            if end < start && *step > 0 {
                Vec::new()
            } else {
                step_range(*start, end.wrapping_add(towards), *step)?
            }
        }
        _ => Vec::new(),
    };
    let parts: Vec<String> = numbers.iter().map(ToString::to_string).collect();
    str_value(parts.join(" "))
}

// --- maps ---

fn dict(args: &[Value]) -> Result<Value, String> {
    let mut map = BTreeMap::new();
    for pair in args.chunks(2) {
        let (key, value) = match pair {
            [key, value] => (key, value.clone()),
            [key] => (key, Value::from("")),
            _ => continue,
        };
        map.insert(strval(key), value);
    }
    Ok(Value::Map(map))
}

fn get(args: &[Value]) -> Result<Value, String> {
    let key = string_arg(args, 1)?;
    Ok(map_arg(args, 0)?
        .get(key)
        .cloned()
        .unwrap_or_else(|| Value::from("")))
}

fn has_key(args: &[Value]) -> Result<Value, String> {
    let key = string_arg(args, 1)?;
    Ok(Value::Bool(map_arg(args, 0)?.contains_key(key)))
}

fn keys(args: &[Value]) -> Result<Value, String> {
    let mut all = Vec::new();
    for i in 0..args.len() {
        all.extend(map_arg(args, i)?.keys().cloned());
    }
    Ok(Value::from(all))
}

fn values(args: &[Value]) -> Result<Value, String> {
    Ok(Value::List(map_arg(args, 0)?.values().cloned().collect()))
}

/// Returns the updated map; the executor stores it back into a variable operand.
fn set(args: &[Value]) -> Result<Value, String> {
    let mut map = map_arg(args, 0)?.clone();
    map.insert(string_arg(args, 1)?.to_string(), arg(args, 2).clone());
    Ok(Value::Map(map))
}

fn unset(args: &[Value]) -> Result<Value, String> {
    let mut map = map_arg(args, 0)?.clone();
    map.remove(string_arg(args, 1)?);
    Ok(Value::Map(map))
}

fn key_args(args: &[Value]) -> Result<Vec<&str>, String> {
    (1..args.len()).map(|i| string_arg(args, i)).collect()
}

fn pick(args: &[Value]) -> Result<Value, String> {
    let map = map_arg(args, 0)?;
    let keys = key_args(args)?;
    Ok(Value::Map(
        map.iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    ))
}

fn omit(args: &[Value]) -> Result<Value, String> {
    let map = map_arg(args, 0)?;
    let keys = key_args(args)?;
    Ok(Value::Map(
        map.iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    ))
}

fn pluck(args: &[Value]) -> Result<Value, String> {
    let key = string_arg(args, 0)?;
    let mut found = Vec::new();
    for i in 1..args.len() {
        if let Some(v) = map_arg(args, i)?.get(key) {
            found.push(v.clone());
        }
    }
    Ok(Value::List(found))
}

/// `dig "a" "b" "fallback" $map`: walks nested maps, giving the fallback on any miss.
fn dig(args: &[Value]) -> Result<Value, String> {
    let Some((Value::Map(map), rest)) = args.split_last() else {
        return Err(wrong_type("map[string]interface {}", args.last().unwrap_or(&NIL)));
    };
    let Some((fallback, keys)) = rest.split_last() else {
        return Ok(Value::Nil);
    };
    let mut current = map;
    for (i, key) in keys.iter().enumerate() {
        let Value::Str(key) = key else {
            return Err(wrong_type("string", key));
        };
        match current.get(key) {
            Some(found) if i + 1 == keys.len() => return Ok(found.clone()),
            Some(Value::Map(inner)) => current = inner,
            _ => break,
        }
    }
    Ok(fallback.clone())
}

/// Deep merge: nested maps merge key by key; other values are copied over when the
/// destination is empty, or when `overwrite` is set and the source is not empty.
fn merge_into(dst: &mut BTreeMap<String, Value>, src: &BTreeMap<String, Value>, overwrite: bool) {
    for (key, value) in src {
        let Some(existing) = dst.get_mut(key) else {
            dst.insert(key.clone(), value.clone());
            continue;
        };
        match (existing, value) {
            (Value::Map(inner), Value::Map(from)) => merge_into(inner, from, overwrite),
            (existing, _) => {
                if !existing.is_truthy() || (overwrite && value.is_truthy()) {
                    *existing = value.clone();
                }
            }
        }
    }
}

fn merge_maps(args: &[Value], overwrite: bool) -> Result<Value, String> {
    let mut merged = map_arg(args, 0)?.clone();
    for i in 1..args.len() {
        merge_into(&mut merged, map_arg(args, i)?, overwrite);
    }
    Ok(Value::Map(merged))
}

fn merge(args: &[Value]) -> Result<Value, String> {
    merge_maps(args, false)
}

fn merge_overwrite(args: &[Value]) -> Result<Value, String> {
    merge_maps(args, true)
}

// --- math ---

fn add(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(
        args.iter().map(to_int64).fold(0_i64, i64::wrapping_add),
    ))
}

fn add1(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(int_arg(args, 0).wrapping_add(1)))
}

fn sub(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(int_arg(args, 0).wrapping_sub(int_arg(args, 1))))
}

fn mul(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(
        args.iter().map(to_int64).fold(1_i64, i64::wrapping_mul),
    ))
}

fn div(args: &[Value]) -> Result<Value, String> {
    let divisor = int_arg(args, 1);
    if divisor == 0 {
        return Err("integer divide by zero".to_string());
    }
    Ok(Value::Int(int_arg(args, 0).wrapping_div(divisor)))
}

fn modulo(args: &[Value]) -> Result<Value, String> {
    let divisor = int_arg(args, 1);
    if divisor == 0 {
        return Err("integer divide by zero".to_string());
    }
    Ok(Value::Int(int_arg(args, 0).wrapping_rem(divisor)))
}

fn max(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(args.iter().map(to_int64).max().unwrap_or(0)))
}

fn min(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(args.iter().map(to_int64).min().unwrap_or(0)))
}

fn floor(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Float(to_float64(arg(args, 0)).floor()))
}

fn ceil(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Float(to_float64(arg(args, 0)).ceil()))
}

fn round(args: &[Value]) -> Result<Value, String> {
    let value = to_float64(arg(args, 0));
    let places = to_float64(arg(args, 1));
    let round_on = args.get(2).map_or(0.5, to_float64);
    let pow = 10_f64.powf(places);
    let digit = pow * value;
    let rounded = if digit.fract() >= round_on {
        digit.ceil()
    } else {
        digit.floor()
    };
    Ok(Value::Float(rounded / pow))
}

fn atoi(args: &[Value]) -> Result<Value, String> {
    let s = string_arg(args, 0)?;
    Ok(Value::Int(s.trim().parse().unwrap_or(0)))
}

fn int(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Int(int_arg(args, 0)))
}

fn float64(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Float(to_float64(arg(args, 0))))
}

fn rand_int(args: &[Value]) -> Result<Value, String> {
    let low = int_arg(args, 0);
    let high = int_arg(args, 1);
    if high <= low {
        return Err("invalid argument to Intn".to_string());
    }
    Ok(Value::Int(rand::thread_rng().gen_range(low..high)))
}

// --- dates ---

fn now(_args: &[Value]) -> Result<Value, String> {
    Ok(Value::Time(Local::now()))
}

/// The date argument of `date` and friends: a time, Unix seconds, or anything else for now.
fn time_value(v: &Value) -> Result<DateTime<Local>, String> {
    match v {
        Value::Time(t) => Ok(*t),
        Value::Int(secs) => Local
            .timestamp_opt(*secs, 0)
            .single()
            .ok_or_else(|| format!("timestamp {} is out of range", secs)),
        _ => Ok(Local::now()),
    }
}

fn time_arg(args: &[Value], i: usize) -> Result<DateTime<Local>, String> {
    match arg(args, i) {
        Value::Time(t) => Ok(*t),
        other => Err(wrong_type("time.Time", other)),
    }
}

fn format_time<Tz: TimeZone>(time: &DateTime<Tz>, layout: &str) -> Result<Value, String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", time.format(&go_layout_to_strftime(layout)))
        .map_err(|_| format!("invalid date layout {:?}", layout))?;
    str_value(out)
}

/// Only `Local` selects the local zone; `UTC`, the empty name and unknown names give UTC.
fn format_in_zone(time: &DateTime<Local>, layout: &str, zone: &str) -> Result<Value, String> {
    if zone == "Local" {
        format_time(time, layout)
    } else {
        format_time(&time.with_timezone(&Utc), layout)
    }
}

fn date(args: &[Value]) -> Result<Value, String> {
    let layout = string_arg(args, 0)?;
    format_time(&time_value(arg(args, 1))?, layout)
}

fn date_in_zone(args: &[Value]) -> Result<Value, String> {
    let layout = string_arg(args, 0)?;
    let zone = string_arg(args, 2)?;
    format_in_zone(&time_value(arg(args, 1))?, layout, zone)
}

fn html_date(args: &[Value]) -> Result<Value, String> {
    format_time(&time_value(arg(args, 0))?, "2006-01-02")
}

fn html_date_in_zone(args: &[Value]) -> Result<Value, String> {
    let zone = string_arg(args, 1)?;
    format_in_zone(&time_value(arg(args, 0))?, "2006-01-02", zone)
}

/// Parses `s` with a Go layout, in the local zone unless the layout carries an offset.
fn parse_time(layout: &str, s: &str) -> Result<DateTime<Local>, String> {
    let format = go_layout_to_strftime(layout);
    if let Ok(time) = DateTime::parse_from_str(s, &format) {
        return Ok(time.with_timezone(&Local));
    }
    let naive = match NaiveDateTime::parse_from_str(s, &format) {
        Ok(naive) => naive,
        Err(err) => NaiveDate::parse_from_str(s, &format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                format!("parsing time {} as {}: {}", go_quote(s), go_quote(layout), err)
            })?,
    };
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("parsing time {}: no such local time", go_quote(s)))
}

/// Go's zero `time.Time`, January 1 of year 1, UTC.
fn zero_time() -> Value {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(Value::Nil, |naive| {
            Value::Time(Utc.from_utc_datetime(&naive).with_timezone(&Local))
        })
}

fn to_date(args: &[Value]) -> Result<Value, String> {
    let layout = string_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    Ok(parse_time(layout, s).map_or_else(|_| zero_time(), Value::Time))
}

fn must_to_date(args: &[Value]) -> Result<Value, String> {
    let layout = string_arg(args, 0)?;
    parse_time(layout, string_arg(args, 1)?).map(Value::Time)
}

fn modify_time(args: &[Value]) -> Result<Option<DateTime<Local>>, String> {
    let modifier = string_arg(args, 0)?;
    let time = time_arg(args, 1)?;
    let Some(delta) = parse_go_duration(modifier) else {
        return Ok(None);
    };
    time.checked_add_signed(delta)
        .map(Some)
        .ok_or_else(|| format!("time {} plus {} is out of range", time, modifier))
}

/// An unparseable duration leaves the time unchanged.
fn date_modify(args: &[Value]) -> Result<Value, String> {
    let modified = modify_time(args)?;
    Ok(Value::Time(modified.unwrap_or(time_arg(args, 1)?)))
}

fn must_date_modify(args: &[Value]) -> Result<Value, String> {
    modify_time(args)?.map(Value::Time).ok_or_else(|| {
        format!("time: invalid duration {}", go_quote(&strval(arg(args, 0))))
    })
}

fn unix_epoch(args: &[Value]) -> Result<Value, String> {
    match arg(args, 0) {
        Value::Time(t) => Ok(Value::Int(t.timestamp())),
        other => Err(wrong_type("time.Time", other)),
    }
}

// --- defaults ---

fn default(args: &[Value]) -> Result<Value, String> {
    Ok(match args.get(1) {
        Some(given) if given.is_truthy() => given.clone(),
        _ => arg(args, 0).clone(),
    })
}

fn empty(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!arg(args, 0).is_truthy()))
}

fn coalesce(args: &[Value]) -> Result<Value, String> {
    Ok(args
        .iter()
        .find(|v| v.is_truthy())
        .cloned()
        .unwrap_or(Value::Nil))
}

fn ternary(args: &[Value]) -> Result<Value, String> {
    Ok(if arg(args, 2).is_truthy() {
        arg(args, 0).clone()
    } else {
        arg(args, 1).clone()
    })
}

fn fail(args: &[Value]) -> Result<Value, String> {
    Err(string_arg(args, 0)?.to_string())
}

/// Passes the value through, failing with `message` when it is nil or an empty string.
fn required(args: &[Value]) -> Result<Value, String> {
    let message = string_arg(args, 0)?;
    match arg(args, 1) {
        Value::Nil => Err(message.to_string()),
        Value::Str(s) if s.is_empty() => Err(message.to_string()),
        given => Ok(given.clone()),
    }
}

// --- types ---

fn type_of_value(v: &Value) -> &'static str {
    match v {
        Value::Nil => "<nil>",
        other => other.type_name(),
    }
}

fn type_of(args: &[Value]) -> Result<Value, String> {
    str_value(type_of_value(arg(args, 0)))
}

fn type_is(args: &[Value]) -> Result<Value, String> {
    let target = string_arg(args, 0)?;
    Ok(Value::Bool(target == type_of_value(arg(args, 1))))
}

fn kind_of(args: &[Value]) -> Result<Value, String> {
    str_value(arg(args, 0).kind_name())
}

fn kind_is(args: &[Value]) -> Result<Value, String> {
    let target = string_arg(args, 0)?;
    Ok(Value::Bool(target == arg(args, 1).kind_name()))
}

// --- encoding ---

fn to_json(args: &[Value]) -> Result<Value, String> {
    serde_json::to_string(&arg(args, 0).to_json())
        .map(Value::Str)
        .map_err(|e| e.to_string())
}

fn to_pretty_json(args: &[Value]) -> Result<Value, String> {
    serde_json::to_string_pretty(&arg(args, 0).to_json())
        .map(Value::Str)
        .map_err(|e| e.to_string())
}

fn decode_json(args: &[Value]) -> Result<Value, String> {
    serde_json::from_str::<serde_json::Value>(string_arg(args, 0)?)
        .map(|json| Value::from_json(&json))
        .map_err(|e| e.to_string())
}

/// Malformed JSON decodes to nil.
fn from_json(args: &[Value]) -> Result<Value, String> {
    string_arg(args, 0)?;
    Ok(decode_json(args).unwrap_or(Value::Nil))
}

fn must_from_json(args: &[Value]) -> Result<Value, String> {
    decode_json(args)
}

fn b64enc(args: &[Value]) -> Result<Value, String> {
    str_value(BASE64.encode(string_arg(args, 0)?))
}

/// Invalid input is not an error: the decoding error becomes the result, as in sprig.
fn b64dec(args: &[Value]) -> Result<Value, String> {
    let s = string_arg(args, 0)?;
    match BASE64.decode(s) {
        Ok(bytes) => str_value(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            let offset = match err {
                base64::DecodeError::InvalidByte(offset, _)
                | base64::DecodeError::InvalidLastSymbol(offset, _) => offset,
                base64::DecodeError::InvalidLength(len) => len,
                _ => s.len(),
            };
            str_value(format!("illegal base64 data at input byte {}", offset))
        }
    }
}

fn hex_digest(algorithm: &'static digest::Algorithm, args: &[Value]) -> Result<Value, String> {
    let s = string_arg(args, 0)?;
    str_value(hex::encode(digest::digest(algorithm, s.as_bytes())))
}

fn sha1sum(args: &[Value]) -> Result<Value, String> {
    hex_digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, args)
}

fn sha256sum(args: &[Value]) -> Result<Value, String> {
    hex_digest(&digest::SHA256, args)
}

fn sha512sum(args: &[Value]) -> Result<Value, String> {
    hex_digest(&digest::SHA512, args)
}

// --- random ---

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHA_NUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NUMERIC: &[u8] = b"0123456789";

/// `count` characters drawn from `pool`; a negative count gives the empty string.
fn random_string(args: &[Value], pool: &[u8]) -> Result<Value, String> {
    let count = generated_len(Some(count_arg(args, 0)))?;
    let mut rng = rand::thread_rng();
    str_value(
        (0..count)
            .filter_map(|_| pool.choose(&mut rng))
            .map(|b| char::from(*b))
            .collect::<String>(),
    )
}

fn rand_alpha_num(args: &[Value]) -> Result<Value, String> {
    random_string(args, ALPHA_NUM)
}

fn rand_alpha(args: &[Value]) -> Result<Value, String> {
    random_string(args, ALPHA)
}

fn rand_numeric(args: &[Value]) -> Result<Value, String> {
    random_string(args, NUMERIC)
}

/// Printable ASCII, space through tilde.
fn rand_ascii(args: &[Value]) -> Result<Value, String> {
    let printable: Vec<u8> = (b' '..=b'~').collect();
    random_string(args, &printable)
}

// --- regex ---

fn regex_arg(args: &[Value], i: usize) -> Result<Regex, String> {
    let pattern = string_arg(args, i)?;
    Regex::new(pattern).map_err(|e| e.to_string())
}

/// A pattern that does not compile matches nothing.
fn regex_match(args: &[Value]) -> Result<Value, String> {
    let s = string_arg(args, 1)?;
    Ok(Value::Bool(
        regex_arg(args, 0).is_ok_and(|re| re.is_match(s)),
    ))
}

fn must_regex_match(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    Ok(Value::Bool(re.is_match(string_arg(args, 1)?)))
}

fn regex_find(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    str_value(re.find(s).map_or("", |m| m.as_str()))
}

fn regex_find_all(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    let limit = usize::try_from(int_arg(args, 2)).unwrap_or(usize::MAX);
    Ok(Value::List(
        re.find_iter(s)
            .take(limit)
            .map(|m| Value::from(m.as_str()))
            .collect(),
    ))
}

fn regex_replace_all(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    let replacement = string_arg(args, 2)?;
    str_value(re.replace_all(s, replacement).into_owned())
}

/// Like `regexReplaceAll`, but `$1` in the replacement is not expanded.
fn regex_replace_all_literal(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    let replacement = string_arg(args, 2)?;
    str_value(re.replace_all(s, NoExpand(replacement)).into_owned())
}

/// At most `n` pieces; a negative `n` splits everywhere and zero gives no pieces.
fn regex_split(args: &[Value]) -> Result<Value, String> {
    let re = regex_arg(args, 0)?;
    let s = string_arg(args, 1)?;
    let pieces: Vec<Value> = match usize::try_from(int_arg(args, 2)) {
        Ok(0) => Vec::new(),
        Ok(n) => re.splitn(s, n).map(Value::from).collect(),
        Err(_) => re.split(s).map(Value::from).collect(),
    };
    Ok(Value::List(pieces))
}

fn regex_quote_meta(args: &[Value]) -> Result<Value, String> {
    str_value(regex::escape(string_arg(args, 0)?))
}

// --- environment and paths ---

fn env(args: &[Value]) -> Result<Value, String> {
    str_value(std::env::var(string_arg(args, 0)?).unwrap_or_default())
}

fn expandenv(args: &[Value]) -> Result<Value, String> {
    let s = string_arg(args, 0)?;
    let expanded =
        shellexpand::env_with_context_no_errors(s, |name| Some(std::env::var(name).unwrap_or_default()));
    str_value(expanded.into_owned())
}

/// Lexically cleans a slash-separated path: collapses `//`, removes `.` and resolves `..`.
fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn base_name(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

fn base(args: &[Value]) -> Result<Value, String> {
    str_value(base_name(string_arg(args, 0)?))
}

fn dir(args: &[Value]) -> Result<Value, String> {
    let path = string_arg(args, 0)?;
    let parent = path.rfind('/').map_or("", |i| path.get(..=i).unwrap_or_default());
    str_value(clean_path(parent))
}

fn ext(args: &[Value]) -> Result<Value, String> {
    let path = string_arg(args, 0)?;
    let last = path.rsplit('/').next().unwrap_or(path);
    str_value(last.rfind('.').map_or("", |i| last.get(i..).unwrap_or_default()))
}

fn clean(args: &[Value]) -> Result<Value, String> {
    str_value(clean_path(string_arg(args, 0)?))
}

// --- misc ---

fn uuidv4(_args: &[Value]) -> Result<Value, String> {
    str_value(uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let def = FUNCS.get(name).unwrap();
        (def.call)(args)
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    fn call_str(name: &str, args: &[Value]) -> String {
        call(name, args).unwrap().to_string()
    }

    #[test]
    fn test_and_or_return_operands() {
        assert_eq!(call("and", &[s("a"), s(""), s("b")]).unwrap(), s(""));
        assert_eq!(call("and", &[s("a"), s("b")]).unwrap(), s("b"));
        assert_eq!(call("or", &[s(""), s("x")]).unwrap(), s("x"));
    }

    #[test]
    fn test_eq_accepts_several_candidates() {
        assert_eq!(call("eq", &[s("b"), s("a"), s("b")]).unwrap(), Value::Bool(true));
        assert!(call("eq", &[s("1"), Value::Int(1)]).is_err());
    }

    #[test]
    fn test_len_index_and_slice() {
        let list = Value::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(call("len", &[list.clone()]).unwrap(), Value::Int(3));
        assert_eq!(call("index", &[list.clone(), Value::Int(1)]).unwrap(), s("b"));
        assert!(call("index", &[list.clone(), Value::Int(5)]).is_err());
        assert_eq!(call_str("slice", &[list, Value::Int(1)]), "[b c]");
        assert_eq!(call("slice", &[s("hello"), Value::Int(1), Value::Int(3)]).unwrap(), s("el"));
    }

    #[test]
    fn test_print_spacing() {
        assert_eq!(call_str("print", &[s("a"), s("b")]), "ab");
        assert_eq!(call_str("print", &[Value::Int(1), Value::Int(2)]), "1 2");
        assert_eq!(call_str("println", &[s("a"), s("b")]), "a b\n");
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(call_str("title", &[s("hello wide world")]), "Hello Wide World");
        assert_eq!(call_str("untitle", &[s("Hello World")]), "hello world");
        assert_eq!(call_str("trimAll", &[s("$"), s("$5.00$")]), "5.00");
        assert_eq!(call_str("trunc", &[Value::Int(3), s("abcdef")]), "abc");
        assert_eq!(call_str("trunc", &[Value::Int(-2), s("abcdef")]), "ef");
        assert_eq!(call_str("abbrev", &[Value::Int(5), s("hello world")]), "he...");
        assert_eq!(call_str("replace", &[s(" "), s("-"), s("a b c")]), "a-b-c");
        assert_eq!(call_str("quote", &[s("a"), s("b")]), "\"a\" \"b\"");
        assert_eq!(call_str("squote", &[s("a")]), "'a'");
        assert_eq!(call_str("cat", &[s("a"), Value::Nil, Value::Int(3)]), "a 3");
        assert_eq!(call_str("nindent", &[Value::Int(2), s("a\nb")]), "\n  a\n  b");
        assert_eq!(call_str("initials", &[s("First Try")]), "FT");
        assert_eq!(call_str("substr", &[Value::Int(0), Value::Int(5), s("hello world")]), "hello");
        assert_eq!(call_str("plural", &[s("one"), s("many"), s("2")]), "many");
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(call_str("snakecase", &[s("FirstName")]), "first_name");
        assert_eq!(call_str("snakecase", &[s("HTTPServer")]), "http_server");
        assert_eq!(call_str("kebabcase", &[s("FirstName")]), "first-name");
        assert_eq!(call_str("camelcase", &[s("http_server")]), "HttpServer");
        assert_eq!(call_str("swapcase", &[s("Hello")]), "hELLO");
    }

    #[test]
    fn test_string_functions_reject_other_types() {
        let err = call("upper", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err, "wrong type for value; expected string; got int");
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(call_str("wrap", &[Value::Int(10), s("the quick brown fox")]), "the quick\nbrown fox");
    }

    #[test]
    fn test_list_helpers() {
        let list = call("list", &[s("b"), s("a"), s("b"), s("")]).unwrap();
        assert_eq!(call_str("first", &[list.clone()]), "b");
        assert_eq!(call_str("rest", &[list.clone()]), "[a b ]");
        assert_eq!(call_str("uniq", &[list.clone()]), "[b a ]");
        assert_eq!(call_str("compact", &[list.clone()]), "[b a b]");
        assert_eq!(call_str("sortAlpha", &[list.clone()]), "[ a b b]");
        assert_eq!(call_str("join", &[s(","), list.clone()]), "b,a,b,");
        assert_eq!(call("has", &[s("a"), list]).unwrap(), Value::Bool(true));
        assert_eq!(call_str("splitList", &[s(","), s("x,y")]), "[x y]");
        assert_eq!(call_str("split", &[s(","), s("x,y")]), "map[_0:x _1:y]");
    }

    #[test]
    fn test_dict_and_keys() {
        let map = call("dict", &[s("b"), Value::Int(2), s("a"), Value::Int(1)]).unwrap();
        assert_eq!(map.to_string(), "map[a:1 b:2]");
        assert_eq!(call_str("keys", &[map.clone()]), "[a b]");
        assert_eq!(call("get", &[map.clone(), s("a")]).unwrap(), Value::Int(1));
        assert_eq!(call("hasKey", &[map, s("z")]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_math_is_lenient_with_strings() {
        assert_eq!(call("add", &[s("2"), Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(call("add1", &[s("41")]).unwrap(), Value::Int(42));
        assert_eq!(call("mul", &[Value::Int(2), Value::Int(3), Value::Int(4)]).unwrap(), Value::Int(24));
        assert_eq!(call("max", &[Value::Int(2), s("9"), Value::Int(4)]).unwrap(), Value::Int(9));
        assert!(call("div", &[Value::Int(1), Value::Int(0)]).is_err());
        assert_eq!(call_str("round", &[Value::Float(3.14159), Value::Int(2)]), "3.14");
        assert_eq!(call("atoi", &[s("x")]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(call_str("default", &[s("foo"), s("")]), "foo");
        assert_eq!(call_str("default", &[s("foo"), s("bar")]), "bar");
        assert_eq!(call_str("coalesce", &[s(""), Value::Nil, s("x")]), "x");
        assert_eq!(call_str("ternary", &[s("yes"), s("no"), Value::Bool(false)]), "no");
    }

    #[test]
    fn test_json_encoding() {
        let list = Value::from(vec!["a".to_string()]);
        assert_eq!(call_str("toJson", &[list]), "[\"a\"]");
        let map = call("dict", &[s("k"), Value::Int(1)]).unwrap();
        assert_eq!(call_str("toPrettyJson", &[map]), "{\n  \"k\": 1\n}");
    }

    #[test]
    fn test_regex_helpers() {
        assert_eq!(call("regexMatch", &[s("^a.c$"), s("abc")]).unwrap(), Value::Bool(true));
        assert_eq!(call_str("regexFind", &[s("[0-9]+"), s("ab12cd34")]), "12");
        assert_eq!(call_str("regexFindAll", &[s("[0-9]"), s("a1b2c3"), Value::Int(-1)]), "[1 2 3]");
        assert_eq!(call_str("regexReplaceAll", &[s("a(x*)b"), s("-ab-axxb-"), s("${1}W")]), "-W-xxW-");
        assert_eq!(call_str("regexSplit", &[s("z+"), s("pizza"), Value::Int(-1)]), "[pi a]");
        assert_eq!(call_str("regexSplit", &[s(","), s("a,b,c"), Value::Int(2)]), "[a b,c]");
        assert_eq!(call_str("regexReplaceAllLiteral", &[s("a"), s("banana"), s("$1")]), "b$1n$1n$1");
        assert_eq!(call_str("regexQuoteMeta", &[s("1.5+")]), "1\\.5\\+");
    }

    #[test]
    fn test_bad_pattern_only_fails_the_must_variant() {
        assert_eq!(call("regexMatch", &[s("("), s("x")]).unwrap(), Value::Bool(false));
        assert!(call("mustRegexMatch", &[s("("), s("x")]).is_err());
        assert!(call("regexFind", &[s("("), s("x")]).is_err());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(call_str("base", &[s("/a/b/c.txt")]), "c.txt");
        assert_eq!(call_str("dir", &[s("/a/b/c.txt")]), "/a/b");
        assert_eq!(call_str("dir", &[s("c.txt")]), ".");
        assert_eq!(call_str("ext", &[s("/a/b/c.tar.gz")]), ".gz");
        assert_eq!(call_str("clean", &[s("a//b/./../c/")]), "a/c");
        assert_eq!(call_str("clean", &[s("/../x")]), "/x");
    }

    #[test]
    fn test_date_formats_timestamps() {
        let epoch = Value::Int(0);
        let year = call_str("date", &[s("2006"), epoch]);
        assert!(year == "1970" || year == "1969");
    }

    #[test]
    fn test_date_in_zone_and_html_date() {
        let epoch = Value::Int(0);
        assert_eq!(
            call_str("dateInZone", &[s("2006-01-02 15:04"), epoch.clone(), s("UTC")]),
            "1970-01-01 00:00"
        );
        assert_eq!(
            call_str("htmlDateInZone", &[epoch.clone(), s("")]),
            "1970-01-01"
        );
        let local = call_str("htmlDate", &[epoch]);
        assert!(local == "1970-01-01" || local == "1969-12-31");
    }

    #[test]
    fn test_to_date_parses_layouts() {
        let parsed = call("toDate", &[s("2006-01-02"), s("2017-12-31")]).unwrap();
        assert_eq!(call_str("date", &[s("2006/01/02"), parsed]), "2017/12/31");
        let zero = call("toDate", &[s("2006-01-02"), s("not a date")]).unwrap();
        assert_eq!(call_str("dateInZone", &[s("2006"), zero, s("UTC")]), "0001");
        assert!(call("mustToDate", &[s("2006-01-02"), s("not a date")]).is_err());
    }

    #[test]
    fn test_date_modify_adds_durations() {
        let start = call("toDate", &[s("2006-01-02 15:04"), s("2020-05-01 10:00")]).unwrap();
        let later = call("dateModify", &[s("1h30m"), start.clone()]).unwrap();
        assert_eq!(call_str("date", &[s("15:04"), later]), "11:30");
        let earlier = call("dateModify", &[s("-24h"), start.clone()]).unwrap();
        assert_eq!(call_str("date", &[s("2006-01-02"), earlier]), "2020-04-30");
        assert_eq!(call("dateModify", &[s("soon"), start.clone()]).unwrap(), start);
        let err = call("mustDateModify", &[s("soon"), start]).unwrap_err();
        assert_eq!(err, "time: invalid duration \"soon\"");
        assert!(call("dateModify", &[s("1h"), s("2020")]).is_err());
    }

    #[test]
    fn test_sequences() {
        assert_eq!(call_str("until", &[Value::Int(3)]), "[0 1 2]");
        assert_eq!(call_str("until", &[Value::Int(-2)]), "[0 -1]");
        assert_eq!(call_str("untilStep", &[Value::Int(3), Value::Int(6), Value::Int(2)]), "[3 5]");
        assert_eq!(call_str("untilStep", &[Value::Int(5), Value::Int(0), Value::Int(2)]), "[]");
        assert_eq!(call_str("untilStep", &[Value::Int(0), Value::Int(5), Value::Int(0)]), "[]");
        assert_eq!(call_str("seq", &[Value::Int(3)]), "1 2 3");
        assert_eq!(call_str("seq", &[Value::Int(2), Value::Int(-1)]), "2 1 0 -1");
        assert_eq!(call_str("seq", &[Value::Int(0), Value::Int(2), Value::Int(5)]), "0 2 4");
        assert_eq!(call_str("seq", &[Value::Int(5), Value::Int(2), Value::Int(0)]), "");
        assert_eq!(call_str("seq", &[]), "");
    }

    #[test]
    fn test_generated_sizes_are_capped() {
        assert!(call("until", &[Value::Int(i64::MAX)]).is_err());
        assert!(call("seq", &[Value::Int(i64::MIN), Value::Int(0)]).is_err());
        assert!(call("repeat", &[Value::Int(i64::MAX), s("ab")]).is_err());
        assert!(call("indent", &[Value::Int(1 << 40), s("a\nb")]).is_err());
        assert!(call("randAlphaNum", &[Value::Int(1 << 40)]).is_err());
        assert_eq!(call_str("repeat", &[Value::Int(3), s("ab")]), "ababab");
    }

    #[test]
    fn test_map_helpers() {
        let map = call("dict", &[s("a"), Value::Int(1), s("b"), Value::Int(2)]).unwrap();
        assert_eq!(call_str("set", &[map.clone(), s("c"), Value::Int(3)]), "map[a:1 b:2 c:3]");
        assert_eq!(call_str("unset", &[map.clone(), s("a")]), "map[b:2]");
        assert_eq!(call_str("pick", &[map.clone(), s("b"), s("z")]), "map[b:2]");
        assert_eq!(call_str("omit", &[map.clone(), s("b")]), "map[a:1]");
        assert_eq!(call_str("values", &[map.clone()]), "[1 2]");
        let other = call("dict", &[s("a"), Value::Int(9)]).unwrap();
        assert_eq!(call_str("pluck", &[s("a"), map.clone(), other.clone()]), "[1 9]");
        assert_eq!(call_str("merge", &[other.clone(), map.clone()]), "map[a:9 b:2]");
        assert_eq!(call_str("mergeOverwrite", &[other, map.clone()]), "map[a:1 b:2]");
        let nested = call("dict", &[s("outer"), map]).unwrap();
        assert_eq!(call_str("dig", &[s("outer"), s("b"), s("none"), nested.clone()]), "2");
        assert_eq!(call_str("dig", &[s("outer"), s("z"), s("none"), nested]), "none");
    }

    #[test]
    fn test_json_decoding() {
        let decoded = call("fromJson", &[s(r#"{"a": [1, "x"]}"#)]).unwrap();
        assert_eq!(decoded.to_string(), "map[a:[1 x]]");
        assert_eq!(call("fromJson", &[s("{")]).unwrap(), Value::Nil);
        assert!(call("mustFromJson", &[s("{")]).is_err());
    }

    #[test]
    fn test_types_and_kinds() {
        assert_eq!(call_str("typeOf", &[Value::Int(1)]), "int");
        assert_eq!(call_str("typeOf", &[Value::Nil]), "<nil>");
        assert_eq!(call_str("kindOf", &[Value::List(vec![])]), "slice");
        assert_eq!(call("kindIs", &[s("map"), Value::Map(BTreeMap::new())]).unwrap(), Value::Bool(true));
        assert_eq!(call("typeIs", &[s("string"), Value::Int(1)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_base64_and_hashes() {
        assert_eq!(call_str("b64enc", &[s("hello")]), "aGVsbG8=");
        assert_eq!(call_str("b64dec", &[s("aGVsbG8=")]), "hello");
        assert_eq!(call_str("b64dec", &[s("!!!!")]), "illegal base64 data at input byte 0");
        assert_eq!(
            call_str("sha256sum", &[s("abc")]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(call_str("sha1sum", &[s("abc")]), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(call_str("sha512sum", &[s("")]).len(), 128);
    }

    #[test]
    fn test_random_helpers() {
        let id = call_str("randAlphaNum", &[Value::Int(16)]);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(call_str("randNumeric", &[Value::Int(8)]).chars().all(|c| c.is_ascii_digit()));
        assert!(call_str("randAlpha", &[Value::Int(8)]).chars().all(|c| c.is_ascii_alphabetic()));
        assert_eq!(call_str("randAscii", &[Value::Int(-1)]), "");
        let Value::Int(n) = call("randInt", &[Value::Int(5), Value::Int(7)]).unwrap() else {
            panic!("expected an int");
        };
        assert!((5..7).contains(&n));
        assert!(call("randInt", &[Value::Int(3), Value::Int(3)]).is_err());
    }

    #[test]
    fn test_escaping_builtins() {
        assert_eq!(call_str("html", &[s("<a href='x'>")]), "&lt;a href=&#39;x&#39;&gt;");
        assert_eq!(call_str("js", &[s("it's")]), "it\\'s");
        assert_eq!(call_str("urlquery", &[s("a b&c")]), "a+b%26c");
        assert_eq!(call_str("html", &[Value::Int(1), Value::Int(2)]), "1 2");
    }

    #[test]
    fn test_call_rejects_non_functions() {
        assert_eq!(call("call", &[Value::Nil]).unwrap_err(), "call of nil");
        assert_eq!(
            call("call", &[s("upper"), s("x")]).unwrap_err(),
            "non-function of type string"
        );
    }

    #[test]
    fn test_fail_and_required() {
        assert_eq!(call("fail", &[s("boom")]).unwrap_err(), "boom");
        assert_eq!(call("required", &[s("need it"), s("")]).unwrap_err(), "need it");
        assert_eq!(call("required", &[s("need it"), Value::Nil]).unwrap_err(), "need it");
        assert_eq!(call("required", &[s("need it"), Value::Int(0)]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_uuidv4_has_canonical_shape() {
        let id = call_str("uuidv4", &[]);
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().nth(14), Some('4'));
    }
}
