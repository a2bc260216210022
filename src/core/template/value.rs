// src/core/template/value.rs

use chrono::{DateTime, Local};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A value flowing through template execution.
///
/// Command-line arguments always arrive as strings; the other variants are produced by
/// literals and by the function library (`list`, `dict`, `now`, arithmetic, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value (`nil`, a missing map key).
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// An ordered list.
    List(Vec<Value>),
    /// A string-keyed map, iterated in key order.
    Map(BTreeMap<String, Value>),
    /// A point in time in the local timezone.
    Time(DateTime<Local>),
}

impl Value {
    /// Template truthiness: `false`, `0`, `nil` and empty strings, lists and maps are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
            Self::Time(_) => true,
        }
    }

    /// The name used in error messages, spelled the way template authors know it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float64",
            Self::Str(_) => "string",
            Self::List(_) => "[]interface {}",
            Self::Map(_) => "map[string]interface {}",
            Self::Time(_) => "time.Time",
        }
    }

    /// The reflection kind reported by `kindOf`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "invalid",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float64",
            Self::Str(_) => "string",
            Self::List(_) => "slice",
            Self::Map(_) => "map",
            Self::Time(_) => "struct",
        }
    }

    /// Builds a value from decoded JSON. Every number becomes a float, as in Go.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Nil,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => n.as_f64().map_or(Self::Nil, Self::Float),
            JsonValue::String(s) => Self::Str(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts the value into JSON for `toJson`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Nil => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => JsonNumber::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Self::Str(s) => JsonValue::String(s.clone()),
            Self::List(l) => JsonValue::Array(l.iter().map(Self::to_json).collect()),
            Self::Map(m) => JsonValue::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<JsonMap<_, _>>(),
            ),
            Self::Time(t) => JsonValue::String(t.to_rfc3339()),
        }
    }

    /// Equality as the `eq` builtin sees it: numbers compare across int/float,
    /// other kinds must match exactly. Lists and maps are not comparable.
    pub fn loose_eq(&self, other: &Self) -> Result<bool, String> {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                Ok(int_to_float(*a) == *b)
            }
            (Self::List(_), _) | (_, Self::List(_)) | (Self::Map(_), _) | (_, Self::Map(_)) => Err(
                format!("non-comparable types {} and {}", self.type_name(), other.type_name()),
            ),
            (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => Ok(a == b),
            (a, b) => Err(format!(
                "incompatible types for comparison: {} and {}",
                a.type_name(),
                b.type_name()
            )),
        }
    }

    /// Ordering for `lt`, `le`, `gt` and `ge`: numbers and strings only.
    pub fn loose_cmp(&self, other: &Self) -> Result<Ordering, String> {
        let ordering = match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => int_to_float(*a).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&int_to_float(*b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            _ => {
                return Err(format!(
                    "incompatible types for comparison: {} and {}",
                    self.type_name(),
                    other.type_name()
                ));
            }
        };
        ordering.ok_or_else(|| "invalid comparison with NaN".to_string())
    }
}

/// Widens an integer for mixed arithmetic and comparisons.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn int_to_float(i: i64) -> f64 {
    i as f64
}

/// Formats a float the way `%v` does: the shortest representation, switching to exponent
/// notation when the decimal exponent is below -4 or at least 6 (`1e+06`, `1e-05`).
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let raw = format!("{:e}", f);
    let Some((mantissa, exp)) = raw.split_once('e') else {
        return raw;
    };
    let exponent: i32 = exp.parse().unwrap_or(0);
    if f != 0.0 && (exponent < -4 || exponent >= 6) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs());
    }
    format!("{}", f)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "<nil>"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Str(s) => write!(f, "{}", s),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "map[")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "]")
            }
            Self::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f %z")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::Str).collect())
    }
}
