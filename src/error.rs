// src/error.rs
//
// Unified error handling for transform-lab
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - Runtime errors: reported per run() call, always recoverable
// - Configuration: registry/config defects detected at startup, fatal
// - Ambient: buffer construction, codec and file I/O failures

use std::borrow::Cow;
use thiserror::Error;

/// Coarse classification of an [`EngineError`].
///
/// The first five kinds are the runtime outcomes of `ExecutionEngine::run`.
/// `Configuration` only ever surfaces while building a registry or config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownAlgorithm,
    IncompatibleInput,
    InvalidParameter,
    TransformFailed,
    InputTooLarge,
    Configuration,
    InvalidBuffer,
    Codec,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownAlgorithm => "UnknownAlgorithm",
            ErrorKind::IncompatibleInput => "IncompatibleInput",
            ErrorKind::InvalidParameter => "InvalidParameter",
            ErrorKind::TransformFailed => "TransformFailed",
            ErrorKind::InputTooLarge => "InputTooLarge",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::InvalidBuffer => "InvalidBuffer",
            ErrorKind::Codec => "CodecError",
            ErrorKind::Io => "IoError",
        }
    }
}

/// transform-lab error types
///
/// All errors are type-safe and carry a message a Presenter can show next
/// to the configuration surface.
#[derive(Debug, Error)]
pub enum EngineError {
    // Runtime Errors
    #[error("Unknown algorithm: '{id}'")]
    UnknownAlgorithm { id: Cow<'static, str> },

    #[error("Algorithm '{algorithm}' does not accept {channels}-channel input (accepts {accepted})")]
    IncompatibleInput {
        algorithm: Cow<'static, str>,
        channels: u8,
        accepted: Cow<'static, str>,
    },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("Transform failed: {reason}")]
    TransformFailed { reason: Cow<'static, str> },

    #[error("Input {what} {actual} exceeds maximum {max}")]
    InputTooLarge {
        what: &'static str,
        actual: u64,
        max: u64,
    },

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Configuration { reason: Cow<'static, str> },

    // Buffer Errors
    #[error("Invalid image buffer: {reason}")]
    InvalidBuffer { reason: Cow<'static, str> },

    // Codec Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // File I/O Errors
    #[error("File not found: {path}")]
    FileNotFound { path: Cow<'static, str> },

    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },
}

impl Clone for EngineError {
    fn clone(&self) -> Self {
        match self {
            Self::UnknownAlgorithm { id } => Self::UnknownAlgorithm { id: id.clone() },
            Self::IncompatibleInput {
                algorithm,
                channels,
                accepted,
            } => Self::IncompatibleInput {
                algorithm: algorithm.clone(),
                channels: *channels,
                accepted: accepted.clone(),
            },
            Self::InvalidParameter { name, reason } => Self::InvalidParameter {
                name: name.clone(),
                reason: reason.clone(),
            },
            Self::TransformFailed { reason } => Self::TransformFailed {
                reason: reason.clone(),
            },
            Self::InputTooLarge { what, actual, max } => Self::InputTooLarge {
                what: *what,
                actual: *actual,
                max: *max,
            },
            Self::Configuration { reason } => Self::Configuration {
                reason: reason.clone(),
            },
            Self::InvalidBuffer { reason } => Self::InvalidBuffer {
                reason: reason.clone(),
            },
            Self::UnsupportedFormat { format } => Self::UnsupportedFormat {
                format: format.clone(),
            },
            Self::DecodeFailed { message } => Self::DecodeFailed {
                message: message.clone(),
            },
            Self::EncodeFailed { format, message } => Self::EncodeFailed {
                format: format.clone(),
                message: message.clone(),
            },
            Self::FileNotFound { path } => Self::FileNotFound { path: path.clone() },
            Self::FileReadFailed { path, source } => Self::FileReadFailed {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::FileWriteFailed { path, source } => Self::FileWriteFailed {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
        }
    }
}

// Constructor Helpers
impl EngineError {
    pub fn unknown_algorithm(id: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownAlgorithm { id: id.into() }
    }

    pub fn incompatible_input(
        algorithm: impl Into<Cow<'static, str>>,
        channels: u8,
        accepted: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::IncompatibleInput {
            algorithm: algorithm.into(),
            channels,
            accepted: accepted.into(),
        }
    }

    pub fn invalid_parameter(
        name: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn transform_failed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::TransformFailed {
            reason: reason.into(),
        }
    }

    pub fn input_too_large(what: &'static str, actual: u64, max: u64) -> Self {
        Self::InputTooLarge { what, actual, max }
    }

    pub fn configuration(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn invalid_buffer(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidBuffer {
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAlgorithm { .. } => ErrorKind::UnknownAlgorithm,
            Self::IncompatibleInput { .. } => ErrorKind::IncompatibleInput,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::TransformFailed { .. } => ErrorKind::TransformFailed,
            Self::InputTooLarge { .. } => ErrorKind::InputTooLarge,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::InvalidBuffer { .. } => ErrorKind::InvalidBuffer,
            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. } => ErrorKind::Codec,
            Self::FileNotFound { .. }
            | Self::FileReadFailed { .. }
            | Self::FileWriteFailed { .. } => ErrorKind::Io,
        }
    }

    /// Check if this error is recoverable (the Presenter can redisplay the
    /// configuration surface and let the user fix it).
    ///
    /// Only configuration defects are fatal; they indicate a programming
    /// error in registry setup, not a user-triggered condition.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }

    /// Parameter name and reason for `InvalidParameter`, `None` otherwise.
    pub fn invalid_parameter_details(&self) -> Option<(&str, &str)> {
        match self {
            Self::InvalidParameter { name, reason } => Some((name.as_ref(), reason.as_ref())),
            _ => None,
        }
    }
}

/// Failure reported by a transform function.
///
/// Transforms never build an [`EngineError`] themselves; the engine wraps
/// this into `TransformFailed` so the runtime taxonomy stays closed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransformError {
    pub reason: Cow<'static, str>,
}

impl TransformError {
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<TransformError> for EngineError {
    fn from(err: TransformError) -> Self {
        EngineError::TransformFailed { reason: err.reason }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::invalid_parameter("kernelSize", "must be odd");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'kernelSize': must be odd"
        );

        let err = EngineError::unknown_algorithm("sharpen_v9");
        assert!(err.to_string().contains("sharpen_v9"));
    }

    #[test]
    fn test_error_recoverable() {
        assert!(EngineError::unknown_algorithm("x").is_recoverable());
        assert!(EngineError::incompatible_input("equalize_hist", 3, "1").is_recoverable());
        assert!(EngineError::invalid_parameter("low", "out of range").is_recoverable());
        assert!(EngineError::transform_failed("nan").is_recoverable());
        assert!(EngineError::input_too_large("sample count", 10, 5).is_recoverable());
        assert!(!EngineError::configuration("duplicate id").is_recoverable());
    }

    #[test]
    fn test_error_kind_runtime() {
        assert_eq!(
            EngineError::unknown_algorithm("x").kind(),
            ErrorKind::UnknownAlgorithm
        );
        assert_eq!(
            EngineError::incompatible_input("a", 3, "1").kind(),
            ErrorKind::IncompatibleInput
        );
        assert_eq!(
            EngineError::invalid_parameter("a", "b").kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            EngineError::transform_failed("a").kind(),
            ErrorKind::TransformFailed
        );
        assert_eq!(
            EngineError::input_too_large("sample count", 2, 1).kind(),
            ErrorKind::InputTooLarge
        );
    }

    #[test]
    fn test_error_kind_ambient() {
        assert_eq!(
            EngineError::configuration("dup").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            EngineError::invalid_buffer("len").kind(),
            ErrorKind::InvalidBuffer
        );
        assert_eq!(EngineError::decode_failed("x").kind(), ErrorKind::Codec);
        assert_eq!(EngineError::encode_failed("png", "x").kind(), ErrorKind::Codec);
        assert_eq!(
            EngineError::unsupported_format("gif").kind(),
            ErrorKind::Codec
        );
        assert_eq!(EngineError::file_not_found("a.png").kind(), ErrorKind::Io);
        assert_eq!(
            EngineError::file_read_failed(
                "a.png",
                std::io::Error::from(std::io::ErrorKind::NotFound)
            )
            .kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn test_clone_preserves_io_source_kind() {
        let err = EngineError::file_write_failed(
            "out.png",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        match err.clone() {
            EngineError::FileWriteFailed { path, source } => {
                assert_eq!(path, "out.png");
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected clone: {other:?}"),
        }
    }

    #[test]
    fn test_transform_error_converts_to_transform_failed() {
        let err: EngineError = TransformError::new("division by zero").into();
        assert_eq!(err.kind(), ErrorKind::TransformFailed);
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_invalid_parameter_details() {
        let err = EngineError::invalid_parameter("high", "must be >= low");
        assert_eq!(err.invalid_parameter_details(), Some(("high", "must be >= low")));
        assert_eq!(EngineError::transform_failed("x").invalid_parameter_details(), None);
    }
}
