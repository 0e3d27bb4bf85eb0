use gc::{Finalize, Trace};
use rustc_hash::FxHashMap;

use crate::error::RuntimeError;
use crate::interpreter::Value;
use crate::scanner::Token;
use crate::types::{create_shared, Shared};

/// One lexical scope: a name table plus a link to the enclosing scope.
/// The chain is rooted at the globals environment, whose `enclosing`
/// is `None`.
#[derive(Trace, Finalize)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    enclosing: Option<Shared<Environment>>,
}

impl Environment {
    pub fn new(enclosing: Option<Shared<Environment>>) -> Shared<Environment> {
        create_shared(Environment {
            values: FxHashMap::default(),
            enclosing,
        })
    }

    /// Introduces (or overwrites) a name in this scope. Shadowing only
    /// happens across scopes, never within one.
    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            RuntimeError::new(name, &format!("Undefined variable '{}'.", name.lexeme))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            RuntimeError::new(name, &format!("Undefined variable '{}'.", name.lexeme))
        }
    }

    /// Reads a name a fixed number of scopes up the chain. The resolver
    /// guarantees both the distance and the name; a miss here is a bug
    /// in resolution, not a user error.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            return self
                .values
                .get(name)
                .cloned()
                .unwrap_or_else(|| unreachable!("resolved variable '{}' missing from scope", name));
        }
        self.ancestor(distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| unreachable!("resolved variable '{}' missing from scope", name))
    }

    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Value) {
        if distance == 0 {
            self.values.insert(name.lexeme.clone(), value);
            return;
        }
        self.ancestor(distance)
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }

    fn ancestor(&self, distance: usize) -> Shared<Environment> {
        let mut env = self
            .enclosing
            .clone()
            .unwrap_or_else(|| unreachable!("environment chain shorter than resolved depth"));
        for _ in 1..distance {
            let next = env
                .borrow()
                .enclosing
                .clone()
                .unwrap_or_else(|| unreachable!("environment chain shorter than resolved depth"));
            env = next;
        }
        env
    }
}
