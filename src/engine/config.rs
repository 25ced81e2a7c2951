// src/engine/config.rs
//
// Engine configuration from defaults or environment variables.
//
// TRANSFORM_LAB_POLICY       strict | lenient | custom
// TRANSFORM_LAB_MAX_SAMPLES  positive integer; implies the custom policy

use crate::engine::limits::{EngineLimits, LimitPolicy};
use crate::error::{EngineError, Result};
use tracing::debug;

pub const POLICY_ENV: &str = "TRANSFORM_LAB_POLICY";
pub const MAX_SAMPLES_ENV: &str = "TRANSFORM_LAB_MAX_SAMPLES";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub limits: EngineLimits,
}

impl EngineConfig {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }

    /// Read the process environment. Malformed values are a `Configuration` error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut limits = match lookup(POLICY_ENV) {
            Some(raw) => EngineLimits::apply_policy(LimitPolicy::from_name(&raw)?),
            None => EngineLimits::default(),
        };

        if let Some(raw) = lookup(MAX_SAMPLES_ENV) {
            let max_samples = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    EngineError::configuration(format!("{MAX_SAMPLES_ENV} must be a positive integer, got '{raw}'"))
                })?;
            limits = EngineLimits::custom(max_samples, limits.max_dimension)?;
        }

        debug!(
            target: "transform_lab::config",
            policy = limits.policy.as_str(),
            max_samples = limits.max_samples,
            max_dimension = limits.max_dimension,
            "engine configuration loaded"
        );
        Ok(Self { limits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_lenient() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn policy_and_max_samples() {
        let config = EngineConfig::from_lookup(lookup(&[(POLICY_ENV, "strict")])).unwrap();
        assert_eq!(config.limits, EngineLimits::strict());

        let config = EngineConfig::from_lookup(lookup(&[(POLICY_ENV, "strict"), (MAX_SAMPLES_ENV, "5000")])).unwrap();
        assert_eq!(config.limits.policy, LimitPolicy::Custom);
        assert_eq!(config.limits.max_samples, 5000);
        assert_eq!(config.limits.max_dimension, EngineLimits::strict().max_dimension);
    }

    #[test]
    fn malformed_values_are_configuration_errors() {
        let err = EngineConfig::from_lookup(lookup(&[(MAX_SAMPLES_ENV, "lots")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(EngineConfig::from_lookup(lookup(&[(MAX_SAMPLES_ENV, "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[(POLICY_ENV, "paranoid")])).is_err());
    }
}
