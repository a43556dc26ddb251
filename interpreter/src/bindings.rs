use std::collections::BTreeMap;
use std::sync::Arc;

use crate::evaluator::Interpreter;
use crate::runtime_value::{Fragment, Value};

/// A block implemented by the host.
///
/// The interpreter passes itself in; the block reads its own call site
/// through [`Interpreter::get_value`] and friends.
pub trait NativeBlock: Send + Sync {
    fn call(&self, interpreter: &mut Interpreter<'_>) -> Vec<Fragment>;
}

impl<F> NativeBlock for F
where
    F: Fn(&mut Interpreter<'_>) -> Vec<Fragment> + Send + Sync,
{
    fn call(&self, interpreter: &mut Interpreter<'_>) -> Vec<Fragment> {
        self(interpreter)
    }
}

/// Named values handed to a render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_native<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Interpreter<'_>) -> Vec<Fragment> + Send + Sync + 'static,
    {
        self.insert_native(name, f);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn insert_native<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Interpreter<'_>) -> Vec<Fragment> + Send + Sync + 'static,
    {
        self.values.insert(name.into(), Value::Native(Arc::new(f)));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolve a block name, following dots into nested maps when the
    /// whole name is not bound itself.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value);
        }
        let (head, path) = name.split_once('.')?;
        self.values.get(head)?.get_path(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add every binding of `other`, replacing existing names.
    pub fn extend(&mut self, other: Bindings) {
        self.values.extend(other.values);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Bindings {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
