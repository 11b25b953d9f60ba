//! Scope templates
//!
//! A template is a resource kind followed by parts, each either a literal
//! segment or a placeholder resolved per request. Templates with no
//! placeholders collapse to a literal scope at construction time.

use std::fmt;
use std::str::FromStr;

use crate::error::{AccessControlError, Result};
use crate::types::ScopeParams;

use super::matcher::SEPARATOR;

/// Fields of [`ScopeParams`] a template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeField {
    /// The request's organization id, spelled `OrgID` in templates
    OrgId,
}

impl ScopeField {
    /// Template spelling of this field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrgId => "OrgID",
        }
    }

    /// Reads the field from request parameters
    pub fn resolve(&self, params: &ScopeParams) -> String {
        match self {
            Self::OrgId => params.org_id.to_string(),
        }
    }
}

impl FromStr for ScopeField {
    type Err = AccessControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OrgID" => Ok(Self::OrgId),
            other => Err(AccessControlError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for ScopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of a scope template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopePart {
    /// Passed through unchanged
    Literal(String),
    /// Resolved from a named field of the request parameters
    Field(ScopeField),
    /// Resolved from the URL parameter map; the key keeps its sigil (e.g., ":reportId")
    ///
    /// The value is substituted verbatim. A request whose parameter is `*`
    /// yields a wanted wildcard such as `reports:*`, which matches every
    /// granted scope of that kind. Callers that take parameter values from
    /// untrusted input must reject `*` (and `:`) before injection.
    Parameter(String),
}

impl ScopePart {
    /// Field placeholder by name; unknown names fail immediately
    pub fn field(name: &str) -> Result<Self> {
        name.parse().map(Self::Field)
    }

    /// URL parameter placeholder
    pub fn parameter(key: impl Into<String>) -> Self {
        Self::Parameter(key.into())
    }

    /// Whether this part needs request parameters to resolve
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Resolves the part; a missing URL parameter yields an empty segment
    pub fn resolve(&self, params: &ScopeParams) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Field(field) => field.resolve(params),
            Self::Parameter(key) => match params.url_param(key) {
                Some(value) => value.to_string(),
                None => {
                    tracing::debug!(parameter = %key, "URL parameter missing, resolving to empty segment");
                    String::new()
                }
            },
        }
    }
}

impl From<&str> for ScopePart {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for ScopePart {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<ScopeField> for ScopePart {
    fn from(field: ScopeField) -> Self {
        Self::Field(field)
    }
}

impl fmt::Display for ScopePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::Field(field) => write!(f, "{{{}}}", field),
            Self::Parameter(key) => write!(f, "{{param:{}}}", key),
        }
    }
}

/// A scope that is either already literal or still awaits injection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeTemplate {
    /// Concrete scope string
    Literal(String),
    /// Resource kind plus parts, at least one of them a placeholder
    Parameterized { kind: String, parts: Vec<ScopePart> },
}

impl ScopeTemplate {
    /// Builds a template from a resource kind and its parts
    ///
    /// All-literal parts collapse into a single literal scope.
    pub fn new<I, P>(kind: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ScopePart>,
    {
        let kind = kind.into();
        let parts: Vec<ScopePart> = parts.into_iter().map(Into::into).collect();

        if parts.iter().any(ScopePart::is_placeholder) {
            return Self::Parameterized { kind, parts };
        }

        let mut literal = kind;
        for part in parts {
            if let ScopePart::Literal(value) = part {
                literal.push(SEPARATOR);
                literal.push_str(&value);
            }
        }
        Self::Literal(literal)
    }

    /// Literal scope
    pub fn literal(scope: impl Into<String>) -> Self {
        Self::Literal(scope.into())
    }

    /// The concrete scope, if no placeholders remain
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(scope) => Some(scope),
            Self::Parameterized { .. } => None,
        }
    }

    /// Whether the template is a concrete scope
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Resolves all placeholders against request parameters
    ///
    /// Never fails: missing URL parameters resolve to empty segments, so the
    /// resulting scope simply fails to match realistic grants.
    pub fn inject(&self, params: &ScopeParams) -> String {
        match self {
            Self::Literal(scope) => scope.clone(),
            Self::Parameterized { kind, parts } => {
                let mut scope = kind.clone();
                for part in parts {
                    scope.push(SEPARATOR);
                    scope.push_str(&part.resolve(params));
                }
                scope
            }
        }
    }
}

impl From<&str> for ScopeTemplate {
    fn from(scope: &str) -> Self {
        Self::literal(scope)
    }
}

impl From<String> for ScopeTemplate {
    fn from(scope: String) -> Self {
        Self::Literal(scope)
    }
}

impl fmt::Display for ScopeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(scope) => f.write_str(scope),
            Self::Parameterized { kind, parts } => {
                f.write_str(kind)?;
                for part in parts {
                    write!(f, "{}{}", SEPARATOR, part)?;
                }
                Ok(())
            }
        }
    }
}

/// Builds a scope template from a resource kind and parts
///
/// # Examples
///
/// ```
/// use permgate_accesscontrol::scope::{field, parameter, scope, ScopeTemplate};
///
/// assert_eq!(scope("settings", ["auth.saml", "*"]), ScopeTemplate::literal("settings:auth.saml:*"));
///
/// let org = scope("orgs", [field("OrgID").unwrap()]);
/// assert_eq!(org.to_string(), "orgs:{OrgID}");
///
/// let report = scope("reports", [parameter(":reportId")]);
/// assert!(!report.is_resolved());
/// ```
pub fn scope<I, P>(kind: impl Into<String>, parts: I) -> ScopeTemplate
where
    I: IntoIterator<Item = P>,
    P: Into<ScopePart>,
{
    ScopeTemplate::new(kind, parts)
}

/// Field placeholder by name (only `OrgID` is supported)
pub fn field(name: &str) -> Result<ScopePart> {
    ScopePart::field(name)
}

/// URL parameter placeholder
pub fn parameter(key: impl Into<String>) -> ScopePart {
    ScopePart::parameter(key)
}
