// src/engine/executor.rs
//
// ExecutionEngine: stateless validation and dispatch.
//
// `run` short-circuits in this order:
//   1. lookup                     -> UnknownAlgorithm
//   2. size limits                -> InputTooLarge (transform never invoked)
//   3. channel compatibility      -> IncompatibleInput
//   4. parameter validation       -> InvalidParameter
//   5. transform (panics caught)  -> TransformFailed
//   6. output shape check         -> TransformFailed

use crate::buffer::ImageBuffer;
use crate::engine::common::run_with_panic_policy;
use crate::engine::config::EngineConfig;
use crate::engine::pool;
use crate::engine::registry::{builtin_registry, AlgorithmRegistry, TransformOutput};
use crate::engine::validate::validate_binding;
use crate::error::{EngineError, Result};
use crate::schema::{AlgorithmDescriptor, ParameterBinding};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Outcome of one engine call: the output buffer plus an optional hint, or a typed failure.
pub type TransformResult = Result<TransformOutput>;

/// One independent unit of work for [`ExecutionEngine::run_batch`].
#[derive(Clone, Copy, Debug)]
pub struct RunRequest<'a> {
    pub algorithm: &'a str,
    pub binding: &'a ParameterBinding,
    pub buffer: &'a ImageBuffer,
}

impl<'a> RunRequest<'a> {
    pub fn new(algorithm: &'a str, binding: &'a ParameterBinding, buffer: &'a ImageBuffer) -> Self {
        Self {
            algorithm,
            binding,
            buffer,
        }
    }
}

/// Validates and dispatches transform calls against a read-only registry.
///
/// Holds no per-call state; clones share the registry and may be used from
/// many threads at once.
#[derive(Clone, Debug)]
pub struct ExecutionEngine {
    registry: Arc<AlgorithmRegistry>,
    config: EngineConfig,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ExecutionEngine {
    /// Engine over the built-in catalogue.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: builtin_registry(),
            config,
        }
    }

    /// Engine over a caller-built registry.
    pub fn with_registry(registry: AlgorithmRegistry, config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Engine over the built-in catalogue configured from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Descriptors in registration order, for populating a selector.
    pub fn list_algorithms(&self) -> Vec<&AlgorithmDescriptor> {
        self.registry.list_all()
    }

    pub fn descriptor(&self, id: &str) -> Result<&AlgorithmDescriptor> {
        self.registry.lookup(id).map(|entry| entry.descriptor())
    }

    /// Binding holding every default of `id`.
    pub fn default_binding(&self, id: &str) -> Result<ParameterBinding> {
        self.descriptor(id).map(ParameterBinding::defaults)
    }

    /// Validate and run one transform.
    ///
    /// Deterministic: identical arguments produce byte-identical output.
    pub fn run(&self, algorithm: &str, binding: &ParameterBinding, buffer: &ImageBuffer) -> TransformResult {
        let started = Instant::now();
        let result = self.run_inner(algorithm, binding, buffer);
        match &result {
            Ok(output) => debug!(
                target: "transform_lab::engine",
                algorithm,
                width = buffer.width(),
                height = buffer.height(),
                channels = buffer.channels(),
                elapsed_us = started.elapsed().as_micros() as u64,
                diagnostic = output.diagnostic.as_deref().unwrap_or(""),
                "transform completed"
            ),
            Err(err) => debug!(
                target: "transform_lab::engine",
                algorithm,
                kind = err.kind().as_str(),
                reason = %err,
                "transform rejected"
            ),
        }
        result
    }

    pub fn run_request(&self, request: &RunRequest<'_>) -> TransformResult {
        self.run(request.algorithm, request.binding, request.buffer)
    }

    /// Run independent requests on the shared pool. Results keep request order
    /// and match what sequential `run` calls would return.
    pub fn run_batch(&self, requests: &[RunRequest<'_>]) -> Vec<TransformResult> {
        debug!(target: "transform_lab::engine", count = requests.len(), "batch started");
        pool::install(|| requests.par_iter().map(|req| self.run_request(req)).collect())
    }

    fn run_inner(&self, algorithm: &str, binding: &ParameterBinding, buffer: &ImageBuffer) -> TransformResult {
        let entry = self.registry.lookup(algorithm)?;
        let descriptor = entry.descriptor();

        self.config.limits.enforce_buffer(buffer)?;

        if !descriptor.accepts.accepts(buffer.channels()) {
            return Err(EngineError::incompatible_input(
                descriptor.id,
                buffer.channels(),
                descriptor.accepts.describe(),
            ));
        }

        let validated = validate_binding(descriptor, binding)?;

        let output = run_with_panic_policy(descriptor.id, || entry.transform().apply(buffer, &validated))?;
        check_output(descriptor, buffer, &output)?;
        Ok(output)
    }
}

/// The output must keep the input's width and height and follow the
/// descriptor's channel policy.
fn check_output(descriptor: &AlgorithmDescriptor, input: &ImageBuffer, output: &TransformOutput) -> Result<()> {
    let out = &output.buffer;
    let expected_channels = descriptor.output_channels(input.channels());
    if out.width() != input.width() || out.height() != input.height() || out.channels() != expected_channels {
        return Err(EngineError::transform_failed(format!(
            "'{}' produced {}x{}x{}, expected {}x{}x{}",
            descriptor.id,
            out.width(),
            out.height(),
            out.channels(),
            input.width(),
            input.height(),
            expected_channels
        )));
    }
    Ok(())
}
