//! Flat declaration table.
//!
//! There is exactly one scope: a name declared anywhere stays visible for
//! the rest of the compilation, blocks included.

use std::collections::HashSet;

use crate::error::CoreError;

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    names: HashSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn declare(&mut self, name: &str) -> Result<(), CoreError> {
        if self.names.contains(name) {
            return Err(CoreError::DuplicateDeclaration(name.to_string()));
        }
        self.names.insert(name.to_string());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<(), CoreError> {
        if self.names.contains(name) {
            Ok(())
        } else {
            Err(CoreError::UndeclaredVariable(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
