//! Scope matching, templating and injection
//!
//! Scopes are colon-separated strings (`reports:read:1`) whose final
//! segment may be the wildcard `*`. Templates describe scopes with
//! request-specific placeholders that an injector resolves per request.
//!
//! # Examples
//!
//! ```
//! use permgate_accesscontrol::scope::{matches, parameter, scope, ScopeInjector, ScopeMutator};
//! use permgate_accesscontrol::ScopeParams;
//!
//! let params = ScopeParams::default().with_url_param(":reportId", "1");
//! let resolved = ScopeInjector::new(&params)
//!     .mutate(&[scope("reports", [parameter(":reportId")])])
//!     .unwrap();
//!
//! assert!(matches(&resolved[0], "reports:*"));
//! ```

mod injector;
mod matcher;
mod template;


pub use injector::{inject_scope, ScopeInjector, ScopeMutator};
pub use matcher::{
    matches, scope_prefix, validate_scope, wildcards_from_prefix, SEPARATOR, WILDCARD,
};
pub use template::{field, parameter, scope, ScopeField, ScopePart, ScopeTemplate};
