use crate::{
    error::{RuntimeError, ValueKind},
    runtime::Value,
    tokenizer::STRING_SUFFIX,
};
use std::collections::HashMap;

/// Variable storage for one run. A name ending in `$` always holds text,
/// every other name holds a number.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    numbers: HashMap<String, f64>,
    strings: HashMap<String, String>,
}

pub fn kind_of(name: &str) -> ValueKind {
    if name.as_bytes().last() == Some(&STRING_SUFFIX) {
        ValueKind::String
    } else {
        ValueKind::Number
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unset variables read as `0` or `""`.
    pub fn get(&self, name: &str) -> Value {
        let name = name.to_ascii_uppercase();
        match kind_of(&name) {
            ValueKind::String => {
                Value::String(self.strings.get(&name).cloned().unwrap_or_default())
            }
            ValueKind::Number => {
                Value::Number(self.numbers.get(&name).copied().unwrap_or_default())
            }
        }
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let name = name.to_ascii_uppercase();
        match (kind_of(&name), value) {
            (ValueKind::Number, Value::Number(n)) => {
                self.numbers.insert(name, n);
            }
            (ValueKind::String, Value::String(s)) => {
                self.strings.insert(name, s);
            }
            (expected, _) => return Err(RuntimeError::VariableType { name, expected }),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.numbers.len() + self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
