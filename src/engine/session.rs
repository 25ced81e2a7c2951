// src/engine/session.rs
//
// Presenter-side session: Idle -> Configuring -> Rendered, and back to
// Configuring on any edit or failure. The engine itself stays stateless;
// the session only remembers what it last rendered so unchanged input is
// not recomputed.

use crate::buffer::ImageBuffer;
use crate::engine::executor::ExecutionEngine;
use crate::engine::registry::TransformOutput;
use crate::error::{EngineError, Result};
use crate::schema::{ParamValue, ParameterBinding};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub enum SessionState {
    /// No buffer loaded.
    Idle,
    /// Buffer present, waiting for a valid selection; carries the last failure.
    Configuring { error: Option<EngineError> },
    /// The last render succeeded and `output()` holds its result.
    Rendered,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configuring { .. } => "configuring",
            Self::Rendered => "rendered",
        }
    }

    pub fn error(&self) -> Option<&EngineError> {
        match self {
            Self::Configuring { error } => error.as_ref(),
            _ => None,
        }
    }
}

/// Inputs of the last successful render.
#[derive(Clone, Debug, PartialEq)]
struct RenderKey {
    generation: u64,
    algorithm: String,
    binding: ParameterBinding,
}

#[derive(Debug)]
pub struct Session {
    buffer: Option<Arc<ImageBuffer>>,
    /// Bumped on every load so a re-upload of equal pixels still re-renders.
    generation: u64,
    algorithm: Option<String>,
    binding: ParameterBinding,
    output: Option<TransformOutput>,
    rendered: Option<RenderKey>,
    state: SessionState,
    runs: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            buffer: None,
            generation: 0,
            algorithm: None,
            binding: ParameterBinding::new(),
            output: None,
            rendered: None,
            state: SessionState::Idle,
            runs: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn buffer(&self) -> Option<&ImageBuffer> {
        self.buffer.as_deref()
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn binding(&self) -> &ParameterBinding {
        &self.binding
    }

    /// Result of the last successful render.
    pub fn output(&self) -> Option<&TransformOutput> {
        self.output.as_ref()
    }

    /// Number of times `render` actually invoked the engine.
    pub fn run_count(&self) -> u64 {
        self.runs
    }

    /// Replace the working buffer (an upload).
    pub fn load(&mut self, buffer: ImageBuffer) {
        self.generation += 1;
        self.buffer = Some(Arc::new(buffer));
        self.output = None;
        self.rendered = None;
        self.state = SessionState::Configuring { error: None };
    }

    /// Drop the buffer and any output; selection and binding are kept.
    pub fn clear(&mut self) {
        self.buffer = None;
        self.output = None;
        self.rendered = None;
        self.state = SessionState::Idle;
    }

    /// Select an algorithm and reset the binding to its defaults.
    pub fn select(&mut self, engine: &ExecutionEngine, algorithm: &str) -> Result<()> {
        match engine.default_binding(algorithm) {
            Ok(defaults) => {
                self.algorithm = Some(algorithm.to_string());
                self.binding = defaults;
                self.edited(None);
                Ok(())
            }
            Err(err) => {
                self.edited(Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Change one parameter. Returns `true` when the value actually changed.
    pub fn set_param(&mut self, name: &str, value: impl Into<ParamValue>) -> bool {
        let value = value.into();
        if self.binding.get(name) == Some(value) {
            return false;
        }
        self.binding.set(name, value);
        self.edited(None);
        true
    }

    /// Replace the whole binding, e.g. from a preset.
    pub fn set_binding(&mut self, binding: ParameterBinding) {
        if self.binding != binding {
            self.binding = binding;
            self.edited(None);
        }
    }

    fn edited(&mut self, error: Option<EngineError>) {
        if self.buffer.is_some() {
            self.state = SessionState::Configuring { error };
        }
    }

    /// Run the current selection if anything changed since the last
    /// successful render.
    pub fn render(&mut self, engine: &ExecutionEngine) -> &SessionState {
        let Some(buffer) = self.buffer.clone() else {
            return &self.state;
        };
        let Some(algorithm) = self.algorithm.clone() else {
            return &self.state;
        };

        let key = RenderKey {
            generation: self.generation,
            algorithm,
            binding: self.binding.clone(),
        };
        if self.output.is_some() && self.rendered.as_ref() == Some(&key) {
            debug!(target: "transform_lab::session", algorithm = %key.algorithm, "inputs unchanged; reusing last render");
            self.state = SessionState::Rendered;
            return &self.state;
        }

        self.runs += 1;
        match engine.run(&key.algorithm, &key.binding, &buffer) {
            Ok(output) => {
                self.output = Some(output);
                self.rendered = Some(key);
                self.state = SessionState::Rendered;
            }
            Err(err) => {
                self.output = None;
                self.rendered = None;
                self.state = SessionState::Configuring { error: Some(err) };
            }
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::{ids, params};

    fn gray() -> ImageBuffer {
        ImageBuffer::from_fn_gray(6, 6, |x, y| (x * 40 + y) as u8).unwrap()
    }

    #[test]
    fn starts_idle_and_render_is_a_no_op() {
        let engine = ExecutionEngine::default();
        let mut session = Session::new();
        assert!(matches!(session.render(&engine), SessionState::Idle));
        assert_eq!(session.run_count(), 0);
    }

    #[test]
    fn load_select_render_cycle() {
        let engine = ExecutionEngine::default();
        let mut session = Session::new();
        session.load(gray());
        assert_eq!(session.state().name(), "configuring");

        session.select(&engine, ids::MEAN_BLUR).unwrap();
        assert_eq!(session.binding().get(params::KERNEL_SIZE), Some(ParamValue::Int(5)));
        assert!(matches!(session.render(&engine), SessionState::Rendered));
        assert!(session.output().is_some());

        // unchanged inputs are not recomputed
        session.render(&engine);
        assert_eq!(session.run_count(), 1);

        assert!(session.set_param(params::KERNEL_SIZE, 3));
        assert_eq!(session.state().name(), "configuring");
        assert!(!session.set_param(params::KERNEL_SIZE, 3));
        session.render(&engine);
        assert_eq!(session.run_count(), 2);
    }

    #[test]
    fn failure_returns_to_configuring_with_error() {
        let engine = ExecutionEngine::default();
        let mut session = Session::new();
        session.load(gray());
        session.select(&engine, ids::MEAN_BLUR).unwrap();
        session.set_param(params::KERNEL_SIZE, 4);

        let state = session.render(&engine).clone();
        let err = state.error().unwrap();
        assert_eq!(err.invalid_parameter_details(), Some((params::KERNEL_SIZE, "must be odd")));
        assert!(session.output().is_none());

        // retrying the same failing input runs again rather than caching the failure
        session.render(&engine);
        assert_eq!(session.run_count(), 2);
    }

    #[test]
    fn unknown_selection_keeps_configuring() {
        let engine = ExecutionEngine::default();
        let mut session = Session::new();
        session.load(gray());
        let err = session.select(&engine, "sharpen_v9").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAlgorithm);
        assert_eq!(session.state().error().map(|e| e.kind()), Some(ErrorKind::UnknownAlgorithm));
    }

    #[test]
    fn reload_forces_rerender_and_clear_goes_idle() {
        let engine = ExecutionEngine::default();
        let mut session = Session::new();
        session.load(gray());
        session.select(&engine, ids::THRESHOLD).unwrap();
        session.render(&engine);
        session.load(gray());
        session.render(&engine);
        assert_eq!(session.run_count(), 2);

        session.clear();
        assert!(matches!(session.state(), SessionState::Idle));
        assert!(session.buffer().is_none());
        assert_eq!(session.algorithm(), Some(ids::THRESHOLD));
    }
}
