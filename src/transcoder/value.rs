use serde_json::Value;

/// Kinds of value a CSV field can be inferred as.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// 64-bit signed integers
    Integer,
    /// Double-precision floating point numbers
    Double,
    /// Boolean values (true/false)
    Boolean,
    /// Raw text
    String,
}

/// A typed value derived from one raw CSV field.
///
/// Each field is classified on its own. Two rows may yield different kinds for
/// the same column.
#[derive(Clone, Debug, PartialEq)]
pub enum InferredValue {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl InferredValue {
    /// Classifies a raw field in the fixed order integer, boolean, double, string.
    ///
    /// Integer must be tried before double, otherwise `"42"` would lose its
    /// integral type. Numeric text outside the `i64` range falls through to
    /// double.
    pub fn infer(field: &str) -> Self {
        if let Some(value) = parse_integer(field) {
            InferredValue::Integer(value)
        } else if let Some(value) = parse_boolean(field) {
            InferredValue::Boolean(value)
        } else if let Some(value) = parse_double(field) {
            InferredValue::Double(value)
        } else {
            InferredValue::String(field.to_owned())
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            InferredValue::Integer(_) => ValueKind::Integer,
            InferredValue::Double(_) => ValueKind::Double,
            InferredValue::Boolean(_) => ValueKind::Boolean,
            InferredValue::String(_) => ValueKind::String,
        }
    }
}

impl From<InferredValue> for Value {
    fn from(value: InferredValue) -> Self {
        match value {
            InferredValue::Integer(value) => Value::from(value),
            InferredValue::Double(value) => Value::from(value),
            InferredValue::Boolean(value) => Value::Bool(value),
            InferredValue::String(value) => Value::String(value),
        }
    }
}

/// Returns true if the whole field is an optionally signed base-10 `i64`.
#[inline]
pub fn is_integer(field: &str) -> bool {
    parse_integer(field).is_some()
}

/// Returns true if the field is `true` or `false`, ignoring case.
#[inline]
pub fn is_boolean(field: &str) -> bool {
    parse_boolean(field).is_some()
}

/// Returns true if the whole field is a finite decimal number.
#[inline]
pub fn is_double(field: &str) -> bool {
    parse_double(field).is_some()
}

fn parse_integer(field: &str) -> Option<i64> {
    field.parse::<i64>().ok()
}

fn parse_boolean(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// f64's grammar also accepts "inf" and "NaN", which have no JSON form.
fn parse_double(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| value.is_finite())
}
