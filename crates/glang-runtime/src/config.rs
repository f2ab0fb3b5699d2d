//! Runtime configuration.
//!
//! Defaults can be overridden through environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GLANG_METHOD_LOOKUP_CACHE_SPEC` | `initialCapacity=4,maximumSize=64` |
//! | `GLANG_INSTANCE_LOOKUP_CACHE_SPEC` | `initialCapacity=16,maximumSize=256` |
//! | `GLANG_FIELD_LOOKUP_CACHE_SPEC` | `initialCapacity=16,maximumSize=256` |
//! | `GLANG_DEBUG_PRINTS` | off |

use thiserror::Error;

use crate::cache::{CacheSpec, CacheSpecError};

pub const METHOD_LOOKUP_CACHE_SPEC_VAR: &str = "GLANG_METHOD_LOOKUP_CACHE_SPEC";
pub const INSTANCE_LOOKUP_CACHE_SPEC_VAR: &str = "GLANG_INSTANCE_LOOKUP_CACHE_SPEC";
pub const FIELD_LOOKUP_CACHE_SPEC_VAR: &str = "GLANG_FIELD_LOOKUP_CACHE_SPEC";
pub const DEBUG_PRINTS_VAR: &str = "GLANG_DEBUG_PRINTS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    CacheSpec {
        var: &'static str,
        #[source]
        source: CacheSpecError,
    },
}

/// Sizing of the dispatch caches and instrumentation switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Per-lookup cache of adapted invokers, keyed by call shape.
    pub method_lookup_cache: CacheSpec,
    /// Per-class caches of method lookups, keyed by name.
    pub instance_lookup_cache: CacheSpec,
    /// Per-class caches of resolved fields, keyed by name.
    pub field_lookup_cache: CacheSpec,
    /// Print every top-level expression statement's value.
    pub debug_prints: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            method_lookup_cache: CacheSpec::new(4, 64),
            instance_lookup_cache: CacheSpec::new(16, 256),
            field_lookup_cache: CacheSpec::new(16, 256),
            debug_prints: false,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let spec = |var: &'static str, target: &mut CacheSpec| -> Result<(), ConfigError> {
            if let Some(value) = lookup(var) {
                *target = CacheSpec::parse(&value)
                    .map_err(|source| ConfigError::CacheSpec { var, source })?;
            }
            Ok(())
        };
        spec(METHOD_LOOKUP_CACHE_SPEC_VAR, &mut config.method_lookup_cache)?;
        spec(INSTANCE_LOOKUP_CACHE_SPEC_VAR, &mut config.instance_lookup_cache)?;
        spec(FIELD_LOOKUP_CACHE_SPEC_VAR, &mut config.field_lookup_cache)?;
        if let Some(value) = lookup(DEBUG_PRINTS_VAR) {
            config.debug_prints = matches!(value.trim(), "1" | "true" | "TRUE" | "yes");
        }
        Ok(config)
    }

    pub fn with_debug_prints(mut self, enabled: bool) -> Self {
        self.debug_prints = enabled;
        self
    }
}
