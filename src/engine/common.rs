// src/engine/common.rs
//
// Panic containment around transform calls. A panic inside a transform is
// reported as `TransformFailed` instead of unwinding into the caller.

use crate::error::TransformError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, converting a panic into a `TransformError` tagged with `stage`.
pub(crate) fn run_with_panic_policy<T, F>(stage: &str, f: F) -> Result<T, TransformError>
where
    F: FnOnce() -> Result<T, TransformError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(target: "transform_lab::engine", stage, %message, "transform panicked");
            Err(TransformError::new(format!("panic in {stage}: {message}")))
        }
    }
}
