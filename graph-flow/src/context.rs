use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{GraphError, Result};

/// Context for sharing data between tasks in a graph execution.
///
/// Values are stored as JSON so that any serde type can pass between tasks.
/// Cloning a context is cheap and every clone sees the same data.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| GraphError::ContextError(format!("failed to serialize {key}: {e}")))?;
        self.data.insert(key, value);
        Ok(())
    }

    /// Read a value, `None` when it is missing or has another shape
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Read a value that a previous task must have written
    pub fn require<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)
            .ok_or_else(|| GraphError::ContextError(format!("{key} not found in context")))
    }
}
