//! Policy evaluator trees
//!
//! An [`Evaluator`] is an immutable boolean expression over "action + scope"
//! permission checks. Leaves are [`PermissionEvaluator`]s; internal nodes
//! combine their children with AND ([`Evaluator::All`]) or OR
//! ([`Evaluator::Any`]).
//!
//! Trees are plain values: evaluation borrows them, and scope injection
//! builds a new tree instead of touching the shared one, so a single parsed
//! policy can be evaluated from any number of threads without locking.
//!
//! # Example
//!
//! ```rust
//! use permgate_accesscontrol::evaluator::Evaluator;
//! use permgate_accesscontrol::scope::{field, scope, ScopeInjector};
//! use permgate_accesscontrol::{GrantedPermissions, ScopeParams};
//!
//! # fn example() -> permgate_accesscontrol::Result<()> {
//! let policy = Evaluator::any([
//!     Evaluator::permission("orgs:read", [scope("orgs", [field("OrgID")?])]),
//!     Evaluator::permission("orgs:write", ["orgs:*"]),
//! ]);
//!
//! let params = ScopeParams::new(3);
//! let concrete = policy.mutate_scopes(&ScopeInjector::new(&params))?;
//!
//! let granted = GrantedPermissions::from([("orgs:read".to_string(), vec!["orgs:3".to_string()])]);
//! assert!(concrete.evaluate(&granted));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod codec;


pub use codec::{
    decode, decode_with, from_value, DecodeOptions, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
};

use std::fmt;

use tracing::trace;

use crate::error::{AccessControlError, Result};
use crate::scope::{matches, ScopeMutator, ScopeTemplate};
use crate::types::GrantedPermissions;

/// Single `(action, scopes)` permission check
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionEvaluator {
    action: String,
    scopes: Vec<ScopeTemplate>,
}

impl PermissionEvaluator {
    /// Create a permission check; an empty scope list checks the action alone
    pub fn new<I, S>(action: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScopeTemplate>,
    {
        Self {
            action: action.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Action this check requires
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Wanted scopes, any one of which is enough
    pub fn scopes(&self) -> &[ScopeTemplate] {
        &self.scopes
    }

    /// Whether every wanted scope is concrete
    pub fn is_resolved(&self) -> bool {
        self.scopes.iter().all(ScopeTemplate::is_resolved)
    }

    /// Checks the permission against granted permissions
    ///
    /// The action must be granted. With no wanted scopes that is enough;
    /// otherwise some wanted scope must match some granted scope. Templates
    /// that still carry placeholders match nothing.
    pub fn evaluate(&self, granted: &GrantedPermissions) -> bool {
        let Some(granted_scopes) = granted.get(self.action.as_str()) else {
            trace!(action = %self.action, "action not granted");
            return false;
        };

        if self.scopes.is_empty() {
            return true;
        }

        self.scopes
            .iter()
            .filter_map(ScopeTemplate::as_literal)
            .any(|wanted| granted_scopes.iter().any(|scope| matches(wanted, scope)))
    }

    fn check_with<F>(&self, checker: &mut F) -> Result<bool>
    where
        F: FnMut(&str, &[&str]) -> Result<bool>,
    {
        let mut scopes = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            match scope.as_literal() {
                Some(literal) => scopes.push(literal),
                None => return Err(AccessControlError::UnresolvedScope(scope.to_string())),
            }
        }

        checker(self.action.as_str(), scopes.as_slice())
    }

    fn mutate_scopes<M>(&self, mutator: &M) -> Result<Self>
    where
        M: ScopeMutator + ?Sized,
    {
        let scopes = mutator.mutate(&self.scopes)?;

        Ok(Self {
            action: self.action.clone(),
            scopes: scopes.into_iter().map(ScopeTemplate::Literal).collect(),
        })
    }
}

impl fmt::Display for PermissionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action)?;
        if self.scopes.is_empty() {
            return Ok(());
        }

        f.write_str("[")?;
        for (idx, scope) in self.scopes.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", scope)?;
        }
        f.write_str("]")
    }
}

/// Policy evaluator tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Evaluator {
    /// Leaf permission check
    Permission(PermissionEvaluator),
    /// True iff every child is true (vacuously true when empty)
    All(Vec<Evaluator>),
    /// True iff some child is true (false when empty)
    Any(Vec<Evaluator>),
}

impl Evaluator {
    /// Permission check for an action and wanted scopes
    pub fn permission<I, S>(action: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScopeTemplate>,
    {
        Self::Permission(PermissionEvaluator::new(action, scopes))
    }

    /// Permission check on the action alone
    pub fn action(action: impl Into<String>) -> Self {
        Self::Permission(PermissionEvaluator::new(action, Vec::<ScopeTemplate>::new()))
    }

    /// AND of the children, evaluated in order
    pub fn all(children: impl IntoIterator<Item = Evaluator>) -> Self {
        Self::All(children.into_iter().collect())
    }

    /// OR of the children, evaluated in order
    pub fn any(children: impl IntoIterator<Item = Evaluator>) -> Self {
        Self::Any(children.into_iter().collect())
    }

    /// Evaluates the tree against granted permissions
    ///
    /// Children are evaluated in declared order and short-circuit. Never
    /// fails: anything the grants do not cover evaluates to false.
    pub fn evaluate(&self, granted: &GrantedPermissions) -> bool {
        match self {
            Self::Permission(permission) => permission.evaluate(granted),
            Self::All(children) => children.iter().all(|child| child.evaluate(granted)),
            Self::Any(children) => children.iter().any(|child| child.evaluate(granted)),
        }
    }

    /// Evaluates the tree with a caller-supplied permission checker
    ///
    /// The checker receives each permission's action and concrete scopes.
    /// Short-circuiting follows [`Evaluator::evaluate`]; the first checker
    /// error aborts evaluation. A permission whose scopes still carry
    /// placeholders fails with [`AccessControlError::UnresolvedScope`].
    pub fn evaluate_with<F>(&self, mut checker: F) -> Result<bool>
    where
        F: FnMut(&str, &[&str]) -> Result<bool>,
    {
        self.check_with(&mut checker)
    }

    fn check_with<F>(&self, checker: &mut F) -> Result<bool>
    where
        F: FnMut(&str, &[&str]) -> Result<bool>,
    {
        match self {
            Self::Permission(permission) => permission.check_with(checker),
            Self::All(children) => {
                for child in children {
                    if !child.check_with(checker)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(children) => {
                for child in children {
                    if child.check_with(checker)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Rebuilds the tree with every permission's scopes passed through `mutator`
    ///
    /// Node kinds and child order are preserved; `self` is left untouched.
    /// Fails only if the mutator does.
    pub fn mutate_scopes<M>(&self, mutator: &M) -> Result<Evaluator>
    where
        M: ScopeMutator + ?Sized,
    {
        match self {
            Self::Permission(permission) => {
                Ok(Self::Permission(permission.mutate_scopes(mutator)?))
            }
            Self::All(children) => Ok(Self::All(Self::mutate_children(children, mutator)?)),
            Self::Any(children) => Ok(Self::Any(Self::mutate_children(children, mutator)?)),
        }
    }

    fn mutate_children<M>(children: &[Evaluator], mutator: &M) -> Result<Vec<Evaluator>>
    where
        M: ScopeMutator + ?Sized,
    {
        children
            .iter()
            .map(|child| child.mutate_scopes(mutator))
            .collect()
    }

    /// Whether no scope template in the tree carries placeholders
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Permission(permission) => permission.is_resolved(),
            Self::All(children) | Self::Any(children) => {
                children.iter().all(Evaluator::is_resolved)
            }
        }
    }

    /// Distinct actions referenced anywhere in the tree, in first-seen order
    pub fn actions(&self) -> Vec<&str> {
        let mut actions = Vec::new();
        self.collect_actions(&mut actions);
        actions
    }

    fn collect_actions<'a>(&'a self, actions: &mut Vec<&'a str>) {
        match self {
            Self::Permission(permission) => {
                if !actions.contains(&permission.action()) {
                    actions.push(permission.action());
                }
            }
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.collect_actions(actions);
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        match self {
            Self::Permission(_) => 1,
            Self::All(children) | Self::Any(children) => {
                1 + children.iter().map(Evaluator::node_count).sum::<usize>()
            }
        }
    }

    /// Nesting depth; a lone permission has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Self::Permission(_) => 1,
            Self::All(children) | Self::Any(children) => {
                1 + children.iter().map(Evaluator::depth).max().unwrap_or(0)
            }
        }
    }
}

impl From<PermissionEvaluator> for Evaluator {
    fn from(permission: PermissionEvaluator) -> Self {
        Self::Permission(permission)
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, children) = match self {
            Self::Permission(permission) => return write!(f, "{}", permission),
            Self::All(children) => ("all", children),
            Self::Any(children) => ("any", children),
        };

        write!(f, "{}(", name)?;
        for (idx, child) in children.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}
