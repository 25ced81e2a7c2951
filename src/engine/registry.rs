// src/engine/registry.rs
//
// Closed lookup table of algorithm descriptors and their transform functions.
// Built once at startup and read-only afterwards.

use crate::buffer::ImageBuffer;
use crate::engine::validate;
use crate::error::{EngineError, Result, TransformError};
use crate::schema::{AlgorithmDescriptor, ParameterBinding};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Successful transform output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
    pub buffer: ImageBuffer,
    /// Optional heuristic hint for the user (e.g. "large kernel removes fine detail").
    pub diagnostic: Option<String>,
}

impl TransformOutput {
    pub fn new(buffer: ImageBuffer) -> Self {
        Self {
            buffer,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }
}

/// A pure image transform.
///
/// Implemented for every `Fn(&ImageBuffer, &ParameterBinding) -> Result<TransformOutput, TransformError>`,
/// so plain functions and closures can be registered directly.
pub trait Transform: Send + Sync {
    fn apply(&self, input: &ImageBuffer, binding: &ParameterBinding) -> std::result::Result<TransformOutput, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&ImageBuffer, &ParameterBinding) -> std::result::Result<TransformOutput, TransformError> + Send + Sync,
{
    fn apply(&self, input: &ImageBuffer, binding: &ParameterBinding) -> std::result::Result<TransformOutput, TransformError> {
        self(input, binding)
    }
}

/// A descriptor paired with its transform.
#[derive(Clone)]
pub struct RegisteredAlgorithm {
    descriptor: AlgorithmDescriptor,
    transform: Arc<dyn Transform>,
}

impl RegisteredAlgorithm {
    pub fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl std::fmt::Debug for RegisteredAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAlgorithm")
            .field("id", &self.descriptor.id)
            .finish_non_exhaustive()
    }
}

/// Registration order defines listing order.
#[derive(Clone, Debug, Default)]
pub struct AlgorithmRegistry {
    entries: Vec<RegisteredAlgorithm>,
    index: HashMap<&'static str, usize>,
}

impl AlgorithmRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalogue.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::transforms::register_builtins(&mut registry)?;
        Ok(registry)
    }

    /// Add an algorithm. Fails with `Configuration` on a duplicate id or a
    /// descriptor whose defaults do not satisfy its own schema.
    pub fn register<T>(&mut self, descriptor: AlgorithmDescriptor, transform: T) -> Result<()>
    where
        T: Transform + 'static,
    {
        if self.index.contains_key(descriptor.id) {
            return Err(EngineError::configuration(format!(
                "algorithm '{}' is already registered",
                descriptor.id
            )));
        }
        validate::check_descriptor(&descriptor)?;

        debug!(target: "transform_lab::registry", id = descriptor.id, params = descriptor.params.len(), "registered algorithm");
        self.index.insert(descriptor.id, self.entries.len());
        self.entries.push(RegisteredAlgorithm {
            descriptor,
            transform: Arc::new(transform),
        });
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Result<&RegisteredAlgorithm> {
        self.index
            .get(id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| EngineError::unknown_algorithm(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Descriptors in registration order.
    pub fn list_all(&self) -> Vec<&AlgorithmDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static BUILTIN_REGISTRY: Lazy<Arc<AlgorithmRegistry>> = Lazy::new(|| {
    // A defect here is a programming error in the catalogue; there is no
    // caller that could recover from it.
    match AlgorithmRegistry::with_builtins() {
        Ok(registry) => Arc::new(registry),
        Err(err) => panic!("built-in algorithm catalogue is invalid: {err}"),
    }
});

/// Shared, lazily built registry of the built-in algorithms.
pub fn builtin_registry() -> Arc<AlgorithmRegistry> {
    Arc::clone(&BUILTIN_REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::ids;
    use crate::schema::ParameterSpec;

    fn identity(input: &ImageBuffer, _binding: &ParameterBinding) -> std::result::Result<TransformOutput, TransformError> {
        Ok(TransformOutput::new(input.clone()))
    }

    #[test]
    fn lookup_and_list_preserve_order() {
        let mut registry = AlgorithmRegistry::new();
        registry.register(AlgorithmDescriptor::new("b", "B"), identity).unwrap();
        registry.register(AlgorithmDescriptor::new("a", "A"), identity).unwrap();

        let ids: Vec<_> = registry.list_all().iter().map(|d| d.id).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(registry.lookup("a").unwrap().descriptor().label, "A");
        assert_eq!(registry.lookup("c").unwrap_err().kind(), ErrorKind::UnknownAlgorithm);
    }

    #[test]
    fn duplicate_id_is_a_configuration_error() {
        let mut registry = AlgorithmRegistry::new();
        registry.register(AlgorithmDescriptor::new("x", "X"), identity).unwrap();
        let err = registry.register(AlgorithmDescriptor::new("x", "Other"), identity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.is_recoverable());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_default_is_rejected_at_registration() {
        let mut registry = AlgorithmRegistry::new();
        let desc = AlgorithmDescriptor::new("bad", "Bad").param(ParameterSpec::int("k", "K", 1, 9, 2, 4));
        let err = registry.register(desc, identity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(registry.is_empty());
    }

    #[test]
    fn closures_register_through_blanket_impl() {
        let mut registry = AlgorithmRegistry::new();
        let invert = |input: &ImageBuffer, _: &ParameterBinding| -> std::result::Result<TransformOutput, TransformError> {
            let samples = input.samples().iter().map(|v| 255 - v).collect();
            ImageBuffer::new(input.width(), input.height(), input.channels(), samples)
                .map(TransformOutput::new)
                .map_err(|e| TransformError::new(e.to_string()))
        };
        registry.register(AlgorithmDescriptor::new("invert", "Invert"), invert).unwrap();

        let img = ImageBuffer::filled(2, 2, 1, 10).unwrap();
        let out = registry
            .lookup("invert")
            .unwrap()
            .transform()
            .apply(&img, &ParameterBinding::new())
            .unwrap();
        assert!(out.buffer.samples().iter().all(|&v| v == 245));
    }

    #[test]
    fn builtin_registry_is_shared_and_complete() {
        let a = builtin_registry();
        let b = builtin_registry();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), ids::ALL.len());
        assert!(!a.contains("sharpen_v9"));
    }
}
