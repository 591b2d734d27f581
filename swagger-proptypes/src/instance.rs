/// The data side of validation: anything that looks like a JSON value.
///
/// Access to children goes through callbacks so implementations backed by
/// shared, interior-mutable storage can lend out borrows without handing
/// out guards.
use serde_json::Value;
use std::fmt;

/// Coarse runtime type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    /// Arrays and objects; everything else is a primitive.
    pub fn is_container(&self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value the validator can walk.
pub trait Instance {
    fn kind(&self) -> ValueKind;

    /// Identity of a container, stable for the duration of one validation
    /// call. Two handles to the same container must return the same
    /// identity. `None` for primitives.
    fn identity(&self) -> Option<usize>;

    /// Strict equality against an enum literal. Containers never match.
    fn equals_literal(&self, literal: &Value) -> bool;

    /// Visit array elements in index order. No-op for non-arrays.
    fn try_for_each_element<E>(
        &self,
        f: impl FnMut(usize, &Self) -> Result<(), E>,
    ) -> Result<(), E>;

    /// Visit object entries in insertion order. No-op for non-objects.
    fn try_for_each_entry<E>(&self, f: impl FnMut(&str, &Self) -> Result<(), E>)
        -> Result<(), E>;

    /// Look up an object key. `f` receives `None` when the key is absent or
    /// the value is not an object.
    fn with_field<R>(&self, key: &str, f: impl FnOnce(Option<&Self>) -> R) -> R;

    /// Object keys in insertion order.
    fn keys(&self) -> Vec<String>;

    /// Short rendering for violation messages.
    fn preview(&self) -> String;
}

/// Strict equality of a JSON scalar and a literal, numbers compared by value.
pub(crate) fn scalar_equals(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => false,
    }
}

const PREVIEW_LIMIT: usize = 40;

pub(crate) fn truncate_preview(mut text: String) -> String {
    if text.chars().count() > PREVIEW_LIMIT {
        text = text.chars().take(PREVIEW_LIMIT).collect();
        text.push('…');
    }
    text
}

impl Instance for Value {
    fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    fn identity(&self) -> Option<usize> {
        if self.kind().is_container() {
            Some(self as *const Value as usize)
        } else {
            None
        }
    }

    fn equals_literal(&self, literal: &Value) -> bool {
        scalar_equals(self, literal)
    }

    fn try_for_each_element<E>(
        &self,
        mut f: impl FnMut(usize, &Self) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Value::Array(items) = self {
            for (i, item) in items.iter().enumerate() {
                f(i, item)?;
            }
        }
        Ok(())
    }

    fn try_for_each_entry<E>(
        &self,
        mut f: impl FnMut(&str, &Self) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Value::Object(entries) = self {
            for (key, value) in entries {
                f(key, value)?;
            }
        }
        Ok(())
    }

    fn with_field<R>(&self, key: &str, f: impl FnOnce(Option<&Self>) -> R) -> R {
        f(self.as_object().and_then(|obj| obj.get(key)))
    }

    fn keys(&self) -> Vec<String> {
        self.as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn preview(&self) -> String {
        truncate_preview(self.to_string())
    }
}
