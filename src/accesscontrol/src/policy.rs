//! Policy loading and publication
//!
//! A [`PolicyHandle`] owns the currently published evaluator tree. Readers
//! take an `Arc` snapshot and evaluate it without holding any lock; reloads
//! decode a fresh tree and swap the pointer, so in-flight evaluations keep
//! the tree they started with.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::LoaderConfig;
use crate::error::{AccessControlError, Result};
use crate::evaluator::{decode_with, DecodeOptions, Evaluator};
use crate::scope::ScopeInjector;
use crate::types::{GrantedPermissions, ScopeParams};

/// Reads and decodes a policy document from disk
pub async fn load_policy_file(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Evaluator> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;

    decode_with(&data, options).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Rejected policy document");
        e
    })
}

/// Published, hot-swappable policy tree
#[derive(Debug)]
pub struct PolicyHandle {
    current: RwLock<Arc<Evaluator>>,
    source: Option<PathBuf>,
}

impl PolicyHandle {
    /// Publish an initial tree built in code
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            current: RwLock::new(Arc::new(evaluator)),
            source: None,
        }
    }

    /// Load the configured policy file and publish it
    pub async fn from_config(config: &LoaderConfig) -> Result<Self> {
        config.validate()?;
        let path = config.policy_path.clone().ok_or_else(|| {
            AccessControlError::Config("no policy path configured".to_string())
        })?;

        let evaluator = load_policy_file(&path, &config.decode_options()).await?;
        info!(
            path = %path.display(),
            nodes = evaluator.node_count(),
            "Loaded policy"
        );

        Ok(Self {
            current: RwLock::new(Arc::new(evaluator)),
            source: Some(path),
        })
    }

    /// Snapshot of the published tree
    pub fn current(&self) -> Arc<Evaluator> {
        Arc::clone(&self.current.read())
    }

    /// File the published tree was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Atomically replace the published tree, returning the previous one
    pub fn publish(&self, evaluator: Evaluator) -> Arc<Evaluator> {
        let next = Arc::new(evaluator);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!("Published new policy");
        previous
    }

    /// Re-read the policy file and publish it
    ///
    /// On any error the previously published tree stays in place.
    pub async fn reload(&self, config: &LoaderConfig) -> Result<Arc<Evaluator>> {
        config.validate()?;
        let path = config
            .policy_path
            .as_deref()
            .or(self.source.as_deref())
            .ok_or_else(|| AccessControlError::Config("no policy path configured".to_string()))?;

        let evaluator = load_policy_file(path, &config.decode_options()).await?;
        info!(path = %path.display(), nodes = evaluator.node_count(), "Reloaded policy");

        Ok(self.publish(evaluator))
    }

    /// Inject request parameters into the current tree and evaluate it
    pub fn check(&self, granted: &GrantedPermissions, params: &ScopeParams) -> Result<bool> {
        let policy = self.current();
        let concrete = policy.mutate_scopes(&ScopeInjector::new(params))?;
        Ok(concrete.evaluate(granted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{field, scope};

    #[test]
    fn test_publish_returns_previous() {
        let handle = PolicyHandle::new(Evaluator::action("a"));
        let before = handle.current();

        let previous = handle.publish(Evaluator::action("b"));

        assert_eq!(*previous, Evaluator::action("a"));
        assert_eq!(*handle.current(), Evaluator::action("b"));
        // Snapshots taken before the swap are unaffected
        assert_eq!(*before, Evaluator::action("a"));
        assert!(handle.source().is_none());
    }

    #[test]
    fn test_check_injects_before_evaluating() {
        let handle = PolicyHandle::new(Evaluator::permission(
            "orgs:read",
            [scope("orgs", [field("OrgID").unwrap()])],
        ));

        let granted = GrantedPermissions::from([("orgs:read".to_string(), vec!["orgs:3".to_string()])]);

        assert!(handle.check(&granted, &ScopeParams::new(3)).unwrap());
        assert!(!handle.check(&granted, &ScopeParams::new(4)).unwrap());
        assert!(!handle.current().is_resolved());
    }

    #[tokio::test]
    async fn test_from_config_requires_path() {
        let err = PolicyHandle::from_config(&LoaderConfig::default()).await.unwrap_err();
        assert!(matches!(err, AccessControlError::Config(_)));
    }
}
