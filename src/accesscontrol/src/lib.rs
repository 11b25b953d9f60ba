//! # Permgate Access Control
//!
//! Policy evaluation engine for action + scope permission checks.
//!
//! ## Features
//!
//! - **Evaluator trees**: permission checks combined with `all` / `any`
//! - **Wildcard scopes**: `reports:*` covers `reports:1`, in either direction
//! - **Scope templates**: placeholders resolved per request from [`ScopeParams`]
//! - **JSON policies**: decode and encode policy documents
//! - **Hot reload**: publish a new policy tree without locking readers
//!
//! ## Example
//!
//! ```rust
//! use permgate_accesscontrol::{decode, GrantedPermissions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = decode(br#"{"any": [
//!         {"action": "users:read", "scopes": ["users:*"]},
//!         {"action": "teams:read"}
//!     ]}"#)?;
//!
//!     let mut granted = GrantedPermissions::new();
//!     granted.insert("users:read".to_string(), vec!["users:42".to_string()]);
//!
//!     if policy.evaluate(&granted) {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod scope;
pub mod types;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use error::{AccessControlError, Result};
pub use evaluator::{
    decode, decode_with, DecodeOptions, Evaluator, PermissionEvaluator, DEFAULT_MAX_DEPTH,
    MAX_DEPTH_LIMIT,
};
pub use policy::{load_policy_file, PolicyHandle};
pub use scope::{matches, ScopeInjector, ScopeMutator, ScopeTemplate};
pub use types::{Action, GrantedPermissions, ScopeParams};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
