#![forbid(unsafe_code)]

//! Router configuration.
//!
//! Every field has a default, so `RouterConfig::default()` is a working
//! configuration. With the `router-config` feature the same struct loads
//! from TOML or JSON:
//!
//! ```toml
//! # navkit.toml
//! animate_by_default = true
//! reduced_motion = false
//! max_queued = 64
//! max_stack_depth = 0
//! ```
//!
//! ```rust,ignore
//! let config = RouterConfig::from_toml_file("navkit.toml")?;
//! let config = RouterConfig::from_json_str(json)?;
//! ```

#[cfg(feature = "router-config")]
use std::path::Path;

#[cfg(feature = "router-config")]
use serde::{Deserialize, Serialize};

/// Tunables for a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "router-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "router-config", serde(default))]
pub struct RouterConfig {
    /// Animation flag for requests posted through a
    /// [`NavHandle`](crate::NavHandle), which carry none of their own.
    pub animate_by_default: bool,
    /// Force every transition to be non-animated (reduce-motion setting).
    pub reduced_motion: bool,
    /// Maximum number of requests waiting behind an in-flight transition
    /// (0 = unbounded).
    pub max_queued: usize,
    /// Maximum navigation stack depth including the root (0 = unlimited).
    pub max_stack_depth: usize,
    /// Emit `debug!` events for every observer phase change.
    pub log_transitions: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            animate_by_default: true,
            reduced_motion: false,
            max_queued: 64,
            max_stack_depth: 0,
            log_transitions: true,
        }
    }
}

impl RouterConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the animation flag used by handle requests.
    #[must_use]
    pub fn animate_by_default(mut self, animate: bool) -> Self {
        self.animate_by_default = animate;
        self
    }

    /// Force non-animated transitions.
    #[must_use]
    pub fn reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// Set the queue capacity (0 = unbounded).
    #[must_use]
    pub fn max_queued(mut self, max: usize) -> Self {
        self.max_queued = max;
        self
    }

    /// Set the stack depth limit (0 = unlimited).
    #[must_use]
    pub fn max_stack_depth(mut self, max: usize) -> Self {
        self.max_stack_depth = max;
        self
    }

    /// Toggle phase-change logging.
    #[must_use]
    pub fn log_transitions(mut self, enabled: bool) -> Self {
        self.log_transitions = enabled;
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // A depth of 1 admits the root and nothing else.
        if self.max_stack_depth == 1 {
            errors.push("max_stack_depth must be 0 (unlimited) or >= 2, got 1".into());
        }

        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "router-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, RouterConfigError> {
        let config: Self = toml::from_str(s).map_err(RouterConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "router-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RouterConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RouterConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "router-config")]
    pub fn from_json_str(s: &str) -> Result<Self, RouterConfigError> {
        let config: Self = serde_json::from_str(s).map_err(RouterConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "router-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RouterConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RouterConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "router-config")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Return `self` if valid, otherwise every validation message.
    pub fn validated(self) -> Result<Self, RouterConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(RouterConfigError::Validation(errors))
        }
    }
}

/// Errors from loading or validating a [`RouterConfig`].
#[derive(Debug)]
pub enum RouterConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "router-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "router-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for RouterConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read router config: {e}"),
            #[cfg(feature = "router-config")]
            Self::Toml(e) => write!(f, "router config is not valid TOML: {e}"),
            #[cfg(feature = "router-config")]
            Self::Json(e) => write!(f, "router config is not valid JSON: {e}"),
            Self::Validation(errors) => {
                write!(
                    f,
                    "invalid router config ({} problems): {}",
                    errors.len(),
                    errors.join("; ")
                )
            }
        }
    }
}

impl std::error::Error for RouterConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "router-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "router-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
