//! Scope matching and wildcard helpers
//!
//! A scope is a colon-separated string such as `reports:read:1`. Its final
//! segment may be the wildcard `*`, meaning "this prefix and anything
//! beyond". All wildcard semantics live in [`matches`].

/// Scope segment separator
pub const SEPARATOR: char = ':';

/// Wildcard segment
pub const WILDCARD: &str = "*";

/// Returns the prefix a wildcard scope covers, or `None` if the scope is not wildcarded
///
/// `settings:*` covers `settings:`, and the bare `*` covers everything.
fn wildcard_prefix(scope: &str) -> Option<&str> {
    if scope == WILDCARD {
        return Some("");
    }

    scope
        .strip_suffix(WILDCARD)
        .filter(|prefix| prefix.ends_with(SEPARATOR))
}

/// Checks whether a wanted scope and a granted scope denote overlapping access
///
/// Either side may end in a wildcard segment. The check is pure, total and
/// case-sensitive.
///
/// # Examples
///
/// ```
/// use permgate_accesscontrol::scope::matches;
///
/// assert!(matches("reports:1", "reports:1"));
/// assert!(matches("reports:1", "reports:*"));
/// assert!(matches("settings:auth.saml:*", "settings:*"));
/// assert!(!matches("reports:1", "reports:2"));
/// ```
pub fn matches(wanted: &str, granted: &str) -> bool {
    if wanted == granted {
        return true;
    }

    if let Some(prefix) = wildcard_prefix(wanted) {
        if granted.starts_with(prefix) {
            return true;
        }
    }

    if let Some(prefix) = wildcard_prefix(granted) {
        if wanted.starts_with(prefix) {
            return true;
        }
    }

    false
}

/// Checks that a wildcard, if present, is the whole final segment
pub fn validate_scope(scope: &str) -> bool {
    match scope.find('*') {
        None => true,
        Some(idx) => wildcard_prefix(scope).map(str::len) == Some(idx),
    }
}

/// Returns everything up to and including the last separator
///
/// A scope without a separator is its own prefix.
pub fn scope_prefix(scope: &str) -> &str {
    match scope.rfind(SEPARATOR) {
        Some(idx) => &scope[..=idx],
        None => scope,
    }
}

/// Lists the wildcard scopes that cover a prefix, broadest first
///
/// `wildcards_from_prefix("dashboards:uid:")` yields
/// `["*", "dashboards:*", "dashboards:uid:*"]`.
pub fn wildcards_from_prefix(prefix: &str) -> Vec<String> {
    let mut wildcards = vec![WILDCARD.to_string()];

    for (idx, _) in prefix.match_indices(SEPARATOR) {
        wildcards.push(format!("{}{}", &prefix[..=idx], WILDCARD));
    }

    wildcards
}
