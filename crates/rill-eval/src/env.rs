//! Evaluation environment.

use crate::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// An environment for variable bindings.
///
/// Scopes form a chain: lookups walk from the innermost scope outwards,
/// so inner bindings shadow outer ones. A scope is only written to while
/// it is being constructed (mutual recursion in `let` requires the
/// bindings to close over the scope that contains them); once
/// evaluation proceeds, sub-evaluations see it read-only. New bindings
/// always go into a fresh child scope, never into an existing one.
#[derive(Default)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Create a new root environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope of `parent`.
    pub fn child(parent: Rc<Environment>) -> Self {
        Self {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Define a variable in this scope. Only called while the scope is
    /// under construction.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Look up a variable, walking outwards through parent scopes.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.get(name);
        }
        None
    }
}
