//! Final-value coercions for projections.
//!
//! A coercion runs once, on the fully navigated value. It never sees a default
//! produced by a tolerant short-circuit.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::BoxError;
use crate::value::{Record, Value};
use crate::view::{ObjectView, ViewSchema};

type CoerceFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;

/// A shareable value-to-value conversion that may fail.
#[derive(Clone)]
pub struct Coerce(Arc<CoerceFn>);

impl Coerce {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Coerce(Arc::new(f))
    }

    pub fn apply(&self, value: Value) -> Result<Value, BoxError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Coerce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coerce(..)")
    }
}

/// Error raised by the built-in coercions.
#[derive(Debug, Error)]
#[error("cannot convert {found} to {target}")]
pub struct CoercionError {
    pub target: &'static str,
    pub found: String,
}

impl CoercionError {
    fn new(target: &'static str, value: &Value) -> Self {
        CoercionError {
            target,
            found: format!("{value:?}"),
        }
    }
}

/// Turns a sequence of pairs into a mapping keyed by the first element's text.
pub fn to_map() -> Coerce {
    Coerce::new(|value| {
        let Some(items) = value.as_items() else {
            return Err(CoercionError::new("mapping", &value).into());
        };
        let mut map = Record::new();
        for pair in items {
            match pair.as_items() {
                Some([key, val]) => {
                    let key = key
                        .to_text()
                        .ok_or_else(|| CoercionError::new("mapping key", key))?;
                    map.insert(key, val.clone());
                }
                _ => return Err(CoercionError::new("pair", pair).into()),
            }
        }
        Ok(Value::Map(map))
    })
}

/// Loose boolean: empty values are false, booleans pass through, anything else
/// is true when its text is `yes`, `true` or `1` (case-insensitive).
pub fn to_bool() -> Coerce {
    Coerce::new(|value| Ok(Value::Bool(truthy_text(&value))))
}

fn truthy_text(value: &Value) -> bool {
    if !value.is_truthy() {
        return false;
    }
    if let Value::Bool(b) = value {
        return *b;
    }
    match value.to_text() {
        Some(text) => matches!(text.to_lowercase().as_str(), "yes" | "true" | "1"),
        None => false,
    }
}

pub fn to_int() -> Coerce {
    Coerce::new(|value| match &value {
        Value::Int(_) => Ok(value),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CoercionError::new("int", &value).into()),
        _ => Err(CoercionError::new("int", &value).into()),
    })
}

pub fn to_float() -> Coerce {
    Coerce::new(|value| match &value {
        Value::Float(_) => Ok(value),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CoercionError::new("float", &value).into()),
        _ => Err(CoercionError::new("float", &value).into()),
    })
}

pub fn to_text() -> Coerce {
    Coerce::new(|value| {
        value
            .to_text()
            .map(Value::Str)
            .ok_or_else(|| CoercionError::new("text", &value).into())
    })
}

/// Wraps the value in an [`ObjectView`] of `schema` and materializes its record.
pub fn view(schema: Arc<ViewSchema>) -> Coerce {
    Coerce::new(move |value| {
        let view = ObjectView::new(&schema, value);
        let record = view.as_dict().map_err(BoxError::from)?;
        Ok(Value::Map(record.clone()))
    })
}
