use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bindings::NativeBlock;
use crate::evaluator::Interpreter;

/// Host data visible to templates.
#[derive(Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Rendered as one fragment per element.
    List(Vec<Value>),
    /// Reachable through dotted names: `[user.nickname]`.
    Map(BTreeMap<String, Value>),
    /// A block implemented by the host.
    Native(Arc<dyn NativeBlock>),
}

impl Value {
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&mut Interpreter<'_>) -> Vec<Fragment> + Send + Sync + 'static,
    {
        Value::Native(Arc::new(f))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Native(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "Text",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Native(_) => "Native",
        }
    }

    /// Walk a dotted path (`address.city`) through nested maps.
    ///
    /// A one-element list met on the way stands for its only element.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            if let Value::List(items) = current {
                if let [only] = items.as_slice() {
                    current = only;
                }
            }
            match current {
                Value::Map(entries) => current = entries.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Split into output fragments: a list yields one fragment per element.
    pub fn into_fragments(self) -> Vec<Fragment> {
        match self {
            Value::List(items) => items.into_iter().map(Fragment::from_value).collect(),
            other => vec![Fragment::from_value(other)],
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Native(_) => f.write_str("Native(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_finite() && *n == n.floor() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Native(_) => write!(f, "<native>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

// ----- Conversions -----

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

// ----- Fragments -----

/// One unit of evaluator output.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    /// Host data, rendered through its `Display` impl.
    Value(Value),
    /// An inline error marker, already formatted.
    Error(String),
}

impl Fragment {
    pub fn text(s: impl Into<String>) -> Self {
        Fragment::Text(s.into())
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Text(s) => Fragment::Text(s),
            other => Fragment::Value(other),
        }
    }

    /// Error markers are false even though they render as text.
    pub fn is_truthy(&self) -> bool {
        match self {
            Fragment::Text(s) => !s.is_empty(),
            Fragment::Value(value) => value.is_truthy(),
            Fragment::Error(_) => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Fragment::Error(_))
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(s) | Fragment::Error(s) => write!(f, "{}", s),
            Fragment::Value(value) => write!(f, "{}", value),
        }
    }
}

/// Concatenate fragments into the final text.
pub fn concat(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(s) | Fragment::Error(s) => out.push_str(s),
            Fragment::Value(value) => out.push_str(&value.to_string()),
        }
    }
    out
}

/// A fragment list is true when it is non-empty and every fragment is true.
pub fn all_truthy(fragments: &[Fragment]) -> bool {
    !fragments.is_empty() && fragments.iter().all(Fragment::is_truthy)
}
