// src/engine/limits.rs
//
// Admission limits: buffers beyond these are refused with `InputTooLarge`
// before any transform work starts.

use crate::buffer::ImageBuffer;
use crate::engine::{DEFAULT_MAX_SAMPLES, MAX_DIMENSION};
use crate::error::{EngineError, Result};

const STRICT_MAX_SAMPLES: u64 = 36_000_000; // 12 MP RGB
const STRICT_MAX_DIMENSION: u32 = 8_192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitPolicy {
    Strict,
    Lenient,
    Custom,
}

impl LimitPolicy {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::configuration(format!(
                "unknown limit policy '{other}' (expected strict, lenient or custom)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
            Self::Custom => "custom",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    pub policy: LimitPolicy,
    /// Upper bound on `width * height * channels`.
    pub max_samples: u64,
    /// Upper bound on either side, in pixels.
    pub max_dimension: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self::lenient()
    }
}

impl EngineLimits {
    pub fn strict() -> Self {
        Self {
            policy: LimitPolicy::Strict,
            max_samples: STRICT_MAX_SAMPLES,
            max_dimension: STRICT_MAX_DIMENSION,
        }
    }

    pub fn lenient() -> Self {
        Self {
            policy: LimitPolicy::Lenient,
            max_samples: DEFAULT_MAX_SAMPLES,
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Caller-chosen limits. A zero bound is a configuration error.
    pub fn custom(max_samples: u64, max_dimension: u32) -> Result<Self> {
        if max_samples == 0 || max_dimension == 0 {
            return Err(EngineError::configuration("custom limits must be positive"));
        }
        Ok(Self {
            policy: LimitPolicy::Custom,
            max_samples,
            max_dimension,
        })
    }

    /// Limits for a named policy; `Custom` starts from the lenient bounds.
    pub fn apply_policy(policy: LimitPolicy) -> Self {
        match policy {
            LimitPolicy::Strict => Self::strict(),
            LimitPolicy::Lenient => Self::lenient(),
            LimitPolicy::Custom => Self {
                policy: LimitPolicy::Custom,
                ..Self::lenient()
            },
        }
    }

    /// Check declared dimensions, e.g. from an image header before decoding.
    pub fn enforce_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let longest = width.max(height);
        if longest > self.max_dimension {
            return Err(EngineError::input_too_large(
                "dimension",
                longest as u64,
                self.max_dimension as u64,
            ));
        }
        Ok(())
    }

    pub fn enforce_samples(&self, width: u32, height: u32, channels: u8) -> Result<()> {
        self.enforce_dimensions(width, height)?;
        let samples = width as u64 * height as u64 * channels as u64;
        if samples > self.max_samples {
            return Err(EngineError::input_too_large("sample count", samples, self.max_samples));
        }
        Ok(())
    }

    pub fn enforce_buffer(&self, buffer: &ImageBuffer) -> Result<()> {
        self.enforce_samples(buffer.width(), buffer.height(), buffer.channels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn strict_policy_enforces_samples_and_sides() {
        let limits = EngineLimits::strict();
        assert!(limits.enforce_samples(3000, 3000, 3).is_ok());
        let err = limits.enforce_samples(4000, 4000, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputTooLarge);
        assert!(err.to_string().contains("48000000"));
        assert!(limits.enforce_dimensions(9000, 10).is_err());
    }

    #[test]
    fn lenient_is_default() {
        let limits = EngineLimits::default();
        assert_eq!(limits.policy, LimitPolicy::Lenient);
        assert_eq!(limits.max_samples, DEFAULT_MAX_SAMPLES);
        assert!(limits.enforce_samples(6000, 6000, 3).is_ok());
    }

    #[test]
    fn custom_limits() {
        let limits = EngineLimits::custom(100, 50).unwrap();
        assert!(limits.enforce_samples(10, 10, 1).is_ok());
        assert!(limits.enforce_samples(10, 10, 3).is_err());
        assert!(limits.enforce_samples(60, 1, 1).is_err());
        assert_eq!(EngineLimits::custom(0, 10).unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn policy_names() {
        assert_eq!(LimitPolicy::from_name(" Strict ").unwrap(), LimitPolicy::Strict);
        assert!(LimitPolicy::from_name("off").is_err());
        for policy in [LimitPolicy::Strict, LimitPolicy::Lenient, LimitPolicy::Custom] {
            assert_eq!(EngineLimits::apply_policy(policy).policy, policy);
            assert_eq!(LimitPolicy::from_name(policy.as_str()).unwrap(), policy);
        }
    }
}
