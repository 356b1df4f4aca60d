//! Chained lexical scopes.
//!
//! Each [`Environment`] maps names to values and points at the scope that
//! encloses it, forming a singly‑linked chain from the innermost block out to
//! the global scope.  Scopes are shared (`Rc<RefCell<_>>`) because closures
//! and bound methods keep their defining scope alive after control leaves it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::{HexError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A fresh global scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope.  The resolver rejects duplicate local
    /// declarations, so a repeat only happens at global scope, where it
    /// replaces the previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up, walking outward through enclosing scopes.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(undefined(name)),
        }
    }

    /// Overwrite an existing binding, walking outward through enclosing
    /// scopes.  Never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> HexError {
    HexError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

/// The scope `distance` hops outward from `env` (`0` is `env` itself).
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` exactly `distance` scopes out, as computed by the resolver.
/// No search is made; `None` means the resolution was wrong.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    let scope = ancestor(env, distance)?;
    let value = scope.borrow().values.get(name).cloned();
    value
}

/// Overwrite `name` exactly `distance` scopes out.  Returns `false` if no
/// such scope exists.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(scope) => {
            scope
                .borrow_mut()
                .values
                .insert(name.lexeme.clone(), value);
            true
        }
        None => false,
    }
}
