//! Value bindings: how a property reads and writes its live value.

use serde_json::Value;
use shellhub_kernel::ShellhubError;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Live get/set handlers behind a property.
///
/// Reads may have side effects (counters, sensors); callers must not read
/// speculatively.
pub trait ValueBinding: Send + Sync {
    fn read(&self) -> Result<Value, ShellhubError>;

    fn write(&self, value: Value) -> Result<(), ShellhubError> {
        let _ = value;
        Err(ShellhubError::validation("property is read-only"))
    }

    fn writable(&self) -> bool {
        false
    }
}

/// A plain stored value. Writes replace it.
#[derive(Debug, Default)]
pub struct StoredValue {
    value: Mutex<Value>,
}

impl StoredValue {
    pub fn new(value: Value) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

impl ValueBinding for StoredValue {
    fn read(&self) -> Result<Value, ShellhubError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, value: Value) -> Result<(), ShellhubError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }
}

type Getter = Box<dyn Fn() -> Value + Send + Sync>;
type Setter = Box<dyn Fn(Value) + Send + Sync>;

/// Closure-backed binding, for values computed from shared state.
pub struct FnBinding {
    getter: Getter,
    setter: Option<Setter>,
}

impl FnBinding {
    pub fn new(
        getter: impl Fn() -> Value + Send + Sync + 'static,
        setter: impl Fn(Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            getter: Box::new(getter),
            setter: Some(Box::new(setter)),
        }
    }

    pub fn read_only(getter: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            getter: Box::new(getter),
            setter: None,
        }
    }
}

impl fmt::Debug for FnBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBinding")
            .field("writable", &self.setter.is_some())
            .finish_non_exhaustive()
    }
}

impl ValueBinding for FnBinding {
    fn read(&self) -> Result<Value, ShellhubError> {
        Ok((self.getter)())
    }

    fn write(&self, value: Value) -> Result<(), ShellhubError> {
        match &self.setter {
            Some(setter) => {
                setter(value);
                Ok(())
            }
            None => Err(ShellhubError::validation("property is read-only")),
        }
    }

    fn writable(&self) -> bool {
        self.setter.is_some()
    }
}
