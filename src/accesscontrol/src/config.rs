//! Policy loader configuration
//!
//! Environment variables:
//! - `ACCESSCONTROL_POLICY_PATH` - Policy document to load (default: none)
//! - `ACCESSCONTROL_MAX_DEPTH` - Maximum policy nesting depth, 1 to 128 (default: 64)
//! - `ACCESSCONTROL_STRICT_SCOPES` - Reject misplaced wildcards (default: false)

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AccessControlError, Result};
use crate::evaluator::{DecodeOptions, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};

/// Environment variable naming the policy document
pub const ENV_POLICY_PATH: &str = "ACCESSCONTROL_POLICY_PATH";
/// Environment variable bounding policy nesting depth
pub const ENV_MAX_DEPTH: &str = "ACCESSCONTROL_MAX_DEPTH";
/// Environment variable enabling strict scope validation
pub const ENV_STRICT_SCOPES: &str = "ACCESSCONTROL_STRICT_SCOPES";

/// Policy loader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Policy document to load, if any
    pub policy_path: Option<PathBuf>,

    /// Maximum nesting depth accepted when decoding
    pub max_depth: usize,

    /// Reject scopes whose wildcard is not the final segment
    pub strict_scopes: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            policy_path: None,
            max_depth: DEFAULT_MAX_DEPTH,
            strict_scopes: false,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults; set but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let policy_path = lookup(ENV_POLICY_PATH)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let max_depth = match lookup(ENV_MAX_DEPTH) {
            Some(raw) => parse_value::<usize>(ENV_MAX_DEPTH, &raw)?,
            None => defaults.max_depth,
        };

        let strict_scopes = match lookup(ENV_STRICT_SCOPES) {
            Some(raw) => parse_flag(ENV_STRICT_SCOPES, &raw)?,
            None => defaults.strict_scopes,
        };

        let config = Self {
            policy_path,
            max_depth,
            strict_scopes,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(AccessControlError::Config(format!(
                "max depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }

        Ok(())
    }

    /// Set the policy document path
    pub fn with_policy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = Some(path.into());
        self
    }

    /// Decoder settings derived from this configuration
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
            strict_scopes: self.strict_scopes,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AccessControlError::Config(format!("{} has invalid value `{}`", key, raw)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AccessControlError::Config(format!(
            "{} has invalid value `{}`",
            key, raw
        ))),
    }
}
