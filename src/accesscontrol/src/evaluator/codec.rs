//! JSON policy documents
//!
//! A document is a single evaluator node in one of three mutually
//! exclusive shapes:
//!
//! ```json
//! {"action": "users:read", "scopes": ["users:*"]}
//! {"any": [<node>, ...]}
//! {"all": [<node>, ...]}
//! ```
//!
//! `scopes` is optional; without it the permission checks the action
//! alone. Decoded scopes are always literal: placeholders only exist in
//! policies built in code.

use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{AccessControlError, Result};
use crate::scope::{validate_scope, ScopeTemplate};

use super::{Evaluator, PermissionEvaluator};

const ACTION: &str = "action";
const SCOPES: &str = "scopes";
const ANY: &str = "any";
const ALL: &str = "all";

/// Default maximum nesting depth of a policy document
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest nesting any decoder accepts, whatever its options say
///
/// Parsing recurses once per JSON level, so this bounds stack use.
pub const MAX_DEPTH_LIMIT: usize = 128;

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest allowed nesting; a lone permission has depth 1
    ///
    /// Values above [`MAX_DEPTH_LIMIT`] are capped at it.
    pub max_depth: usize,

    /// Reject scopes whose `*` is not the whole final segment
    pub strict_scopes: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_scopes: false,
        }
    }
}

/// Decodes a JSON policy document with default options
///
/// Empty input is an error: there is no empty policy.
pub fn decode(data: &[u8]) -> Result<Evaluator> {
    decode_with(data, &DecodeOptions::default())
}

/// Decodes a JSON policy document
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Evaluator> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(AccessControlError::Format("empty policy document".to_string()));
    }

    check_nesting(data, options.max_depth.min(MAX_DEPTH_LIMIT))?;

    // check_nesting bounds recursion, so serde_json's fixed limit is not needed
    let mut deserializer = serde_json::Deserializer::from_slice(data);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer).map_err(malformed)?;
    deserializer.end().map_err(malformed)?;

    let evaluator = from_value(&value, options)?;
    debug!(
        nodes = evaluator.node_count(),
        depth = evaluator.depth(),
        "Decoded policy document"
    );

    Ok(evaluator)
}

fn malformed(error: serde_json::Error) -> AccessControlError {
    AccessControlError::Format(format!("malformed JSON: {}", error))
}

/// Rejects documents nested too deeply to hold a tree of `max_depth` levels
///
/// Runs before parsing. Each evaluator level takes at most two JSON levels:
/// the node object and its `any`, `all` or `scopes` array.
fn check_nesting(data: &[u8], max_depth: usize) -> Result<()> {
    let limit = max_depth.saturating_mul(2);
    let mut nesting = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in data {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                nesting += 1;
                if nesting > limit {
                    return Err(AccessControlError::DepthExceeded { max_depth });
                }
            }
            b'}' | b']' => nesting = nesting.saturating_sub(1),
            _ => {}
        }
    }

    Ok(())
}

/// Decodes an already-parsed JSON value
pub fn from_value(value: &Value, options: &DecodeOptions) -> Result<Evaluator> {
    decode_node(value, options, 1)
}

/// Single dispatch point for every node, root and children alike
fn decode_node(value: &Value, options: &DecodeOptions, depth: usize) -> Result<Evaluator> {
    if depth > options.max_depth {
        return Err(AccessControlError::DepthExceeded {
            max_depth: options.max_depth,
        });
    }

    let Value::Object(object) = value else {
        return Err(AccessControlError::Format(format!(
            "expected an evaluator object, found {}",
            json_type(value)
        )));
    };

    let shapes = [ACTION, ANY, ALL]
        .iter()
        .filter(|key| object.contains_key(**key))
        .count();
    if shapes > 1 {
        return Err(AccessControlError::Format(
            "evaluator object must hold only one of `action`, `any` or `all`".to_string(),
        ));
    }

    if let Some(action) = object.get(ACTION) {
        return decode_permission(action, object, options).map(Evaluator::Permission);
    }
    if let Some(children) = object.get(ANY) {
        return decode_children(ANY, children, options, depth).map(Evaluator::Any);
    }
    if let Some(children) = object.get(ALL) {
        return decode_children(ALL, children, options, depth).map(Evaluator::All);
    }

    Err(AccessControlError::Format(
        "evaluator object must hold one of `action`, `any` or `all`".to_string(),
    ))
}

fn decode_permission(
    action: &Value,
    object: &Map<String, Value>,
    options: &DecodeOptions,
) -> Result<PermissionEvaluator> {
    let Value::String(action) = action else {
        return Err(AccessControlError::Format(format!(
            "`action` must be a string, found {}",
            json_type(action)
        )));
    };

    let scopes = match object.get(SCOPES) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| decode_scope(action, item, options))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(AccessControlError::Format(format!(
                "`scopes` of `{}` must be an array, found {}",
                action,
                json_type(other)
            )))
        }
    };

    Ok(PermissionEvaluator::new(action.clone(), scopes))
}

fn decode_scope(action: &str, item: &Value, options: &DecodeOptions) -> Result<ScopeTemplate> {
    let Value::String(scope) = item else {
        return Err(AccessControlError::Format(format!(
            "scopes of `{}` must be strings, found {}",
            action,
            json_type(item)
        )));
    };

    if options.strict_scopes && !validate_scope(scope) {
        warn!(action = %action, scope = %scope, "Rejecting scope with misplaced wildcard");
        return Err(AccessControlError::Format(format!(
            "scope `{}` of `{}` may only use `*` as its final segment",
            scope, action
        )));
    }

    Ok(ScopeTemplate::literal(scope.clone()))
}

fn decode_children(
    key: &str,
    children: &Value,
    options: &DecodeOptions,
    depth: usize,
) -> Result<Vec<Evaluator>> {
    let Value::Array(items) = children else {
        return Err(AccessControlError::Format(format!(
            "`{}` must be an array, found {}",
            key,
            json_type(children)
        )));
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(_) => decode_node(item, options, depth + 1),
            other => Err(AccessControlError::Format(format!(
                "`{}` entries must be evaluator objects, found {}",
                key,
                json_type(other)
            ))),
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for Evaluator {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Permission(permission) => permission.serialize(serializer),
            Self::All(children) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ALL, children)?;
                map.end()
            }
            Self::Any(children) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ANY, children)?;
                map.end()
            }
        }
    }
}

impl Serialize for PermissionEvaluator {
    /// Serializes concrete permissions only; a document has no way to carry
    /// placeholders, so an unresolved template is an error rather than a
    /// literal that would silently change meaning.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let scopes = self
            .scopes()
            .iter()
            .map(|scope| {
                scope
                    .as_literal()
                    .ok_or_else(|| S::Error::custom(format!("unresolved scope template `{}`", scope)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let len = if scopes.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(ACTION, self.action())?;
        if !scopes.is_empty() {
            map.serialize_entry(SCOPES, &scopes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Evaluator {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        from_value(&value, &DecodeOptions::default()).map_err(D::Error::custom)
    }
}

impl FromStr for Evaluator {
    type Err = AccessControlError;

    fn from_str(s: &str) -> Result<Self> {
        decode(s.as_bytes())
    }
}
