//! Core access control types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Action identifier (e.g., "reports:read")
pub type Action = String;

/// Granted permissions: action -> scopes granted for that action
///
/// Supplied by the caller at evaluation time and never mutated by the engine.
pub type GrantedPermissions = HashMap<Action, Vec<String>>;

/// Request-scoped parameters used to resolve scope templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeParams {
    /// Organization the request runs in
    #[serde(default)]
    pub org_id: i64,

    /// URL/path parameters keyed by name, sigil included (e.g., ":reportId")
    #[serde(default)]
    pub url_params: HashMap<String, String>,
}

impl ScopeParams {
    /// Create parameters for an organization with no URL parameters
    pub fn new(org_id: i64) -> Self {
        Self {
            org_id,
            url_params: HashMap::new(),
        }
    }

    /// Add a URL parameter
    pub fn with_url_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(key.into(), value.into());
        self
    }

    /// Look up a URL parameter by its full key
    pub fn url_param(&self, key: &str) -> Option<&str> {
        self.url_params.get(key).map(String::as_str)
    }
}
