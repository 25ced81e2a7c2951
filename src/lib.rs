// lib.rs
//
// transform-lab: a parameterized image-transform engine
//
// Design goals:
// - Every algorithm is data-described (id, accepted channels, parameter schema)
// - Validation happens before any pixel work, with typed failures
// - Identical (algorithm, binding, buffer) always gives byte-identical output
// - No hidden state: sessions live with the caller, not the engine

pub mod buffer;
pub mod engine;
pub mod error;
pub mod ops;
pub mod schema;
pub mod transforms;

pub use buffer::{ImageBuffer, GRAY, RGB};
pub use engine::{
    AlgorithmRegistry, EngineConfig, EngineLimits, ExecutionEngine, RunRequest, Session, SessionState,
    Transform, TransformOutput, TransformResult,
};
pub use error::{EngineError, ErrorKind, Result, TransformError};
pub use ops::{OutputFormat, Preset};
pub use schema::{
    AlgorithmDescriptor, ChannelSet, Constraint, CrossConstraint, OutputChannels, ParamType, ParamValue,
    ParameterBinding, ParameterSpec,
};

/// Crate version, e.g. for a demo banner.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
        assert!(!version().is_empty());
    }
}
