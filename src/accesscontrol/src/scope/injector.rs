//! Scope mutation seam and the request-parameter injector

use crate::error::Result;
use crate::types::ScopeParams;

use super::template::ScopeTemplate;

/// Rewrites the scope list of every permission node in an evaluator tree
///
/// Implemented for closures, so ad-hoc mutators can be passed directly:
///
/// ```
/// use permgate_accesscontrol::evaluator::Evaluator;
/// use permgate_accesscontrol::scope::ScopeTemplate;
/// use permgate_accesscontrol::Result;
///
/// let uppercase = |scopes: &[ScopeTemplate]| -> Result<Vec<String>> {
///     Ok(scopes.iter().map(|s| s.to_string().to_uppercase()).collect())
/// };
///
/// let evaluator = Evaluator::permission("teams:read", ["teams:1"]);
/// let upper = evaluator.mutate_scopes(&uppercase).unwrap();
///
/// assert_eq!(upper.to_string(), "teams:read[TEAMS:1]");
/// ```
pub trait ScopeMutator {
    /// Maps one permission's scope list to concrete scopes
    fn mutate(&self, scopes: &[ScopeTemplate]) -> Result<Vec<String>>;
}

impl<F> ScopeMutator for F
where
    F: Fn(&[ScopeTemplate]) -> Result<Vec<String>>,
{
    fn mutate(&self, scopes: &[ScopeTemplate]) -> Result<Vec<String>> {
        self(scopes)
    }
}

/// Resolves scope templates against one request's parameters
///
/// Injection never fails; see [`ScopeTemplate::inject`].
#[derive(Debug, Clone, Copy)]
pub struct ScopeInjector<'a> {
    params: &'a ScopeParams,
}

impl<'a> ScopeInjector<'a> {
    /// Create an injector for a request
    pub fn new(params: &'a ScopeParams) -> Self {
        Self { params }
    }

    /// Request parameters this injector resolves against
    pub fn params(&self) -> &ScopeParams {
        self.params
    }
}

impl ScopeMutator for ScopeInjector<'_> {
    fn mutate(&self, scopes: &[ScopeTemplate]) -> Result<Vec<String>> {
        Ok(scopes.iter().map(|scope| scope.inject(self.params)).collect())
    }
}

/// Resolves a single template against request parameters
pub fn inject_scope(template: &ScopeTemplate, params: &ScopeParams) -> String {
    template.inject(params)
}
