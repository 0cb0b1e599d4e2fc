//! Launch form state

use openapi_client::models::{KeysResponse, LaunchRequest};

use crate::errors::ConsoleError;

pub const MIN_INSTANCE_COUNT: u32 = 2;
pub const MAX_INSTANCE_COUNT: u32 = 20;
pub const DEFAULT_INSTANCE_COUNT: u32 = 8;

/// Pending launch input. Survives a failed launch untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchForm {
    /// Total instances, head included
    pub count: u32,

    /// SSH key pair to launch with
    pub key_name: String,

    /// Optional cluster name; empty lets the orchestrator pick one
    pub name: String,
}

impl Default for LaunchForm {
    fn default() -> Self {
        Self {
            count: DEFAULT_INSTANCE_COUNT,
            key_name: String::new(),
            name: String::new(),
        }
    }
}

impl LaunchForm {
    /// Preselect the orchestrator's default key, else the first listed one
    pub fn from_keys(keys: &KeysResponse) -> Self {
        let key_name = keys
            .default
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| keys.keys.first().map(|k| k.name.clone()))
            .unwrap_or_default();

        Self {
            key_name,
            ..Default::default()
        }
    }

    /// Check the input and build the request body
    pub fn validate(&self) -> Result<LaunchRequest, ConsoleError> {
        if !(MIN_INSTANCE_COUNT..=MAX_INSTANCE_COUNT).contains(&self.count) {
            return Err(ConsoleError::ValidationError(format!(
                "instance count must be between {} and {}, got {}",
                MIN_INSTANCE_COUNT, MAX_INSTANCE_COUNT, self.count
            )));
        }

        let key_name = self.key_name.trim();
        if key_name.is_empty() {
            return Err(ConsoleError::ValidationError(
                "an SSH key name is required".to_string(),
            ));
        }

        let name = self.name.trim();
        Ok(LaunchRequest {
            count: self.count,
            key_name: key_name.to_string(),
            name: (!name.is_empty()).then(|| name.to_string()),
        })
    }

    pub fn clear_name(&mut self) {
        self.name.clear();
    }
}
