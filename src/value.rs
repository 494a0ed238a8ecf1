//! Dynamic values compared by the assertion library
//!
//! Assertions in exercise files compare loosely typed data: numbers against
//! numeric strings, arrays against array literals, objects whose keys were
//! inserted in a different order. [`Value`] is the common currency for those
//! comparisons. Arrays and objects are reference counted, so cloning a value
//! keeps its identity the way passing an object reference around would;
//! [`Value::equals`] and [`Value::strict_equals`] compare composites by
//! identity while [`Value::deep_equals`] compares them by structure.

use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// A dynamically typed value
#[derive(Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Ordered sequence
    Array(Rc<Vec<Value>>),
    /// Keyed mapping; key order is not significant
    Object(Rc<HashMap<String, Value>>),
}

impl Value {
    /// Build an array from anything convertible to values
    pub fn array<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object from key/value pairs
    pub fn object<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is nullish (null or undefined)
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Convert to boolean (truthiness)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Convert to number
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) | Value::Object(_) => Value::String(self.to_js_string()).to_number(),
        }
    }

    /// String coercion, as used when a composite meets a primitive under `==`
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                    .collect();
                parts.join(",")
            }
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Get the typeof string
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
        }
    }

    /// Strict equality (===): no coercion, composites by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Abstract equality (==)
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            // Same types use strict equality
            (Value::Undefined, Value::Undefined)
            | (Value::Null, Value::Null)
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_)) => self.strict_equals(other),

            // null == undefined, and neither equals anything else
            (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,
            (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,

            (Value::Number(_), Value::String(_)) => {
                self.strict_equals(&Value::Number(other.to_number()))
            }
            (Value::String(_), Value::Number(_)) => {
                Value::Number(self.to_number()).strict_equals(other)
            }

            // Boolean comparisons
            (Value::Boolean(b), _) => Value::Number(if *b { 1.0 } else { 0.0 }).equals(other),
            (_, Value::Boolean(b)) => self.equals(&Value::Number(if *b { 1.0 } else { 0.0 })),

            // Composite meets primitive: compare its string form
            (a, b) if a.is_composite() => Value::String(a.to_js_string()).equals(b),
            (a, b) if b.is_composite() => a.equals(&Value::String(b.to_js_string())),

            _ => false,
        }
    }

    /// Structural equality: arrays element-wise in order, objects by key set
    /// and values regardless of insertion order, primitives without coercion.
    /// `NaN` equals `NaN`; `0` and `-0` differ.
    pub fn deep_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => same_value(*a, *b),
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_equals(y)))
            }
            (Value::Object(a), Value::Object(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter()
                            .all(|(k, v)| b.get(k).is_some_and(|w| v.deep_equals(w))))
            }
            _ => self.strict_equals(other),
        }
    }
}

/// Numeric value of a string the way `==` sees it: surrounding whitespace
/// ignored, empty is zero, `0x`/`0o`/`0b` integer literals, and `Infinity`
/// as the only spelled-out number.
fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        // Folded in f64 so literals wider than 64 bits still round.
        return digits
            .chars()
            .try_fold(0.0, |acc, c| {
                c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
            })
            .unwrap_or(f64::NAN);
    }

    // Rust's float grammar also takes "inf" and "nan" in any case.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn same_value(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    a == b && a.is_sign_negative() == b.is_sign_negative()
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        if n.is_sign_negative() { "-0" } else { "0" }.to_string()
    } else {
        format!("{}", n)
    }
}

/// Inspection form used in diagnostics: strings are quoted, composites are
/// expanded, object keys are listed in sorted order so output is stable.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Value::Array(items) => {
                if items.is_empty() {
                    return write!(f, "[]");
                }
                write!(f, "[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, " ]")
            }
            Value::Object(map) => {
                if map.is_empty() {
                    return write!(f, "{{}}");
                }
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                write!(f, "{{ ")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, map[key])?;
                }
                write!(f, " }}")
            }
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}
