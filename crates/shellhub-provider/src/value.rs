//! Declared value types and conversion of incoming values.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use shellhub_kernel::ShellhubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Double,
    Boolean,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
        }
    }

    /// Convert `value` to this type, or fail with a validation error.
    pub fn coerce(self, value: &Value) -> Result<Value, ShellhubError> {
        let converted = match (self, value) {
            (Self::String, Value::String(s)) => Some(Value::String(s.clone())),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (Self::Integer, Value::Number(n)) => n.as_i64().map(Value::from),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (Self::Double, Value::Number(n)) => n.as_f64().and_then(double),
            (Self::Double, Value::String(s)) => {
                s.trim().parse::<f64>().ok().and_then(double)
            }

            (Self::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Self::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },

            _ => None,
        };

        converted.ok_or_else(|| {
            ShellhubError::validation(format!(
                "value {value} is not convertible to {}",
                self.as_str()
            ))
        })
    }
}

fn double(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}
