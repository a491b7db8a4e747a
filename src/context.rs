//! # Call Context
//!
//! Dynamic argument bag for guards that take loosely-typed input: positional values plus
//! keyword values, both stored as JSON.
//!
//! Guards are generic over their argument type, so strongly-typed tuples or structs work
//! just as well; `CallContext` is for callers wiring guards to configuration, scripting,
//! or FFI input where the shape is only known at runtime.

use crate::error::{GuardError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Positional and keyword arguments captured for one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    positionals: Vec<Value>,
    keywords: HashMap<String, Value>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positionals.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn positionals(&self) -> &[Value] {
        &self.positionals
    }

    pub fn keywords(&self) -> &HashMap<String, Value> {
        &self.keywords
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positionals.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    /// Read positional `index` as `V`
    pub fn positional_as<V: DeserializeOwned>(&self, index: usize) -> Result<V> {
        let argument = format!("#{index}");
        let value = self
            .positional(index)
            .ok_or_else(|| missing_argument(&argument))?;
        decode(&argument, value)
    }

    /// Read keyword `name` as `V`
    pub fn keyword_as<V: DeserializeOwned>(&self, name: &str) -> Result<V> {
        let value = self.keyword(name).ok_or_else(|| missing_argument(name))?;
        decode(name, value)
    }

    pub fn len(&self) -> usize {
        self.positionals.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positionals.is_empty() && self.keywords.is_empty()
    }
}

fn missing_argument(argument: &str) -> GuardError {
    GuardError::InvalidArgument {
        argument: argument.to_string(),
        reason: "not provided".to_string(),
    }
}

fn decode<V: DeserializeOwned>(argument: &str, value: &Value) -> Result<V> {
    V::deserialize(value).map_err(|e| GuardError::InvalidArgument {
        argument: argument.to_string(),
        reason: e.to_string(),
    })
}
