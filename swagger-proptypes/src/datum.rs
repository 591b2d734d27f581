/// Shared JSON-like values that may form cycles.
///
/// `serde_json::Value` is a tree, so it cannot express a node that lists
/// itself as its own ancestor. `Datum` containers are reference-counted and
/// interior-mutable: cloning a container clones the handle, and the same
/// container can be reachable from several places, itself included.
/// Cyclic graphs leak unless broken by the caller; they are meant for
/// short-lived validation input.
use crate::instance::{scalar_equals, truncate_preview, Instance, ValueKind};
use serde_json::{Number, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Datum {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<RefCell<Vec<Datum>>>),
    Object(Rc<RefCell<Vec<(String, Datum)>>>),
}

impl Datum {
    pub fn array(items: impl IntoIterator<Item = Datum>) -> Datum {
        Datum::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Datum)>) -> Datum {
        let obj = Datum::Object(Rc::new(RefCell::new(Vec::new())));
        for (key, value) in entries {
            obj.insert(key, value);
        }
        obj
    }

    /// Set `key` on an object, replacing any previous value. Returns
    /// `false` when `self` is not an object.
    pub fn insert(&self, key: impl Into<String>, value: Datum) -> bool {
        let Datum::Object(cell) = self else {
            return false;
        };
        let key = key.into();
        let mut entries = cell.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        true
    }

    /// Append to an array. Returns `false` when `self` is not an array.
    pub fn push(&self, value: Datum) -> bool {
        let Datum::Array(cell) = self else {
            return false;
        };
        cell.borrow_mut().push(value);
        true
    }

    /// Clone of the value under `key`, if `self` is an object that has it.
    pub fn get(&self, key: &str) -> Option<Datum> {
        self.with_field(key, |v| v.cloned())
    }

    /// Whether two handles point at the same container.
    pub fn ptr_eq(&self, other: &Datum) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn scalar(&self) -> Option<Value> {
        match self {
            Datum::Null => Some(Value::Null),
            Datum::Bool(b) => Some(Value::Bool(*b)),
            Datum::Number(n) => Some(Value::Number(n.clone())),
            Datum::String(s) => Some(Value::String(s.clone())),
            Datum::Array(_) | Datum::Object(_) => None,
        }
    }
}

impl Instance for Datum {
    fn kind(&self) -> ValueKind {
        match self {
            Datum::Null => ValueKind::Null,
            Datum::Bool(_) => ValueKind::Boolean,
            Datum::Number(_) => ValueKind::Number,
            Datum::String(_) => ValueKind::String,
            Datum::Array(_) => ValueKind::Array,
            Datum::Object(_) => ValueKind::Object,
        }
    }

    fn identity(&self) -> Option<usize> {
        match self {
            Datum::Array(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            Datum::Object(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            _ => None,
        }
    }

    fn equals_literal(&self, literal: &Value) -> bool {
        self.scalar()
            .is_some_and(|value| scalar_equals(&value, literal))
    }

    fn try_for_each_element<E>(
        &self,
        mut f: impl FnMut(usize, &Self) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Datum::Array(cell) = self {
            let items = cell.borrow();
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
        if let Datum::Object(cell) = self {
            let entries = cell.borrow();
            for (key, value) in entries.iter() {
                f(key, value)?;
            }
        }
        Ok(())
    }

    fn with_field<R>(&self, key: &str, f: impl FnOnce(Option<&Self>) -> R) -> R {
        match self {
            Datum::Object(cell) => {
                let entries = cell.borrow();
                f(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v))
            }
            _ => f(None),
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            Datum::Object(cell) => cell.borrow().iter().map(|(k, _)| k.clone()).collect(),
            _ => Vec::new(),
        }
    }

    fn preview(&self) -> String {
        match self {
            Datum::Array(cell) => format!("[array of {}]", cell.borrow().len()),
            Datum::Object(cell) => format!("{{object with {} keys}}", cell.borrow().len()),
            other => truncate_preview(other.scalar().unwrap_or(Value::Null).to_string()),
        }
    }
}

// Containers are printed shallowly: a derived impl would not terminate on
// cycles.
impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("Null"),
            Datum::Bool(b) => write!(f, "Bool({b})"),
            Datum::Number(n) => write!(f, "Number({n})"),
            Datum::String(s) => write!(f, "String({s:?})"),
            Datum::Array(cell) => write!(f, "Array(len={})", cell.borrow().len()),
            Datum::Object(cell) => {
                let entries = cell.borrow();
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                write!(f, "Object({keys:?})")
            }
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            Value::Bool(b) => Datum::Bool(b),
            Value::Number(n) => Datum::Number(n),
            Value::String(s) => Datum::String(s),
            Value::Array(items) => Datum::array(items.into_iter().map(Datum::from)),
            Value::Object(entries) => {
                Datum::object(entries.into_iter().map(|(k, v)| (k, Datum::from(v))))
            }
        }
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::Number(n.into())
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::Number(n.into())
    }
}

impl From<f64> for Datum {
    /// Non-finite floats have no JSON number form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Datum::Null, Datum::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let d = Datum::from(json!({"name": "Rex", "tags": [1, 2]}));
        assert_eq!(d.kind(), ValueKind::Object);
        assert_eq!(d.keys(), ["name", "tags"]);
        assert!(d.with_field("name", |v| v.unwrap().equals_literal(&json!("Rex"))));
        assert_eq!(d.get("tags").unwrap().kind(), ValueKind::Array);
    }

    #[test]
    fn test_insert_replaces_and_keeps_position() {
        let d = Datum::object([("a", Datum::from(1)), ("b", Datum::from(2))]);
        assert!(d.insert("a", Datum::from("x")));
        assert_eq!(d.keys(), ["a", "b"]);
        assert!(d.get("a").unwrap().equals_literal(&json!("x")));
        assert!(!Datum::Null.insert("a", Datum::Null));
    }

    #[test]
    fn test_clones_share_identity() {
        let node = Datum::object([("name", Datum::from("n"))]);
        let alias = node.clone();
        assert!(node.ptr_eq(&alias));
        assert!(!node.ptr_eq(&Datum::object([("name", Datum::from("n"))])));
        assert!(!Datum::from(1).ptr_eq(&Datum::from(1)));
    }

    #[test]
    fn test_self_cycle_is_walkable_and_printable() {
        let node = Datum::object([("name", Datum::from("loop"))]);
        let ancestors = Datum::array([node.clone()]);
        node.insert("ancestors", ancestors);

        let inner = node.get("ancestors").unwrap();
        let mut same = false;
        inner
            .try_for_each_element(|_, child| {
                same = child.ptr_eq(&node);
                Ok::<_, ()>(())
            })
            .unwrap();
        assert!(same);
        assert_eq!(format!("{node:?}"), "Object([\"name\", \"ancestors\"])");
    }

    #[test]
    fn test_scalar_conversions() {
        assert!(Datum::from(true).equals_literal(&json!(true)));
        assert!(Datum::from(2.0).equals_literal(&json!(2)));
        assert_eq!(Datum::from(f64::NAN).kind(), ValueKind::Null);
        assert!(!Datum::array([]).equals_literal(&json!([])));
    }
}
