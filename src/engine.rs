// src/engine.rs
//
// The core of transform-lab. A stateless engine that:
// 1. Looks up an algorithm in a closed registry
// 2. Validates the input buffer and the parameter binding against its descriptor
// 3. Runs the transform with panics contained and checks the output shape
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height) under the lenient policy.
/// Larger images are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed `width * height * channels` under the lenient policy.
/// 120M samples = a 40 MP RGB image, well beyond interactive latency.
pub const DEFAULT_MAX_SAMPLES: u64 = 120_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
pub mod config;
pub mod executor;
pub mod io;
pub mod limits;
pub mod pool;
pub mod registry;
pub mod session;
pub mod validate;

pub use config::EngineConfig;
pub use executor::{ExecutionEngine, RunRequest, TransformResult};
pub use io::{decode_image, encode, inspect_header, load_image, save_image, InspectMetadata, Source};
pub use limits::{EngineLimits, LimitPolicy};
pub use registry::{builtin_registry, AlgorithmRegistry, RegisteredAlgorithm, Transform, TransformOutput};
pub use session::{Session, SessionState};
pub use validate::validate_binding;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_limits_admit_a_large_photo() {
        // 6000x4000 RGB
        assert!(EngineLimits::lenient().enforce_samples(6000, 4000, 3).is_ok());
        assert!(EngineLimits::lenient()
            .enforce_samples(MAX_DIMENSION + 1, 1, 1)
            .is_err());
    }
}
