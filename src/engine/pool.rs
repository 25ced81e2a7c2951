// src/engine/pool.rs
//
// Global thread pool for batch execution.
//
// A single pool is built lazily on first use and reused by every
// `run_batch` call. Its size comes from TRANSFORM_LAB_THREADS when set to a
// positive integer, otherwise from `available_parallelism` (which respects
// cgroup CPU quotas). Changes to the variable after initialization have no
// effect.

use rayon::ThreadPool;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const THREADS_ENV: &str = "TRANSFORM_LAB_THREADS";

/// Minimum number of rayon threads to ensure at least some parallelism
const MIN_RAYON_THREADS: usize = 1;

/// Upper bound on an explicitly requested thread count.
pub const MAX_THREADS: usize = 1024;

static GLOBAL_THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Parse a thread-count override; `None` for absent or malformed values.
pub(crate) fn parse_thread_override(raw: Option<&str>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= MIN_RAYON_THREADS => Some(n.min(MAX_THREADS)),
        _ => {
            warn!(target: "transform_lab::pool", value = raw, "ignoring invalid {THREADS_ENV}");
            None
        }
    }
}

pub(crate) fn thread_count() -> usize {
    let requested = std::env::var(THREADS_ENV).ok();
    parse_thread_override(requested.as_deref()).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_RAYON_THREADS)
    })
}

/// Shared pool, built on first call.
///
/// When the preferred size cannot be built the global rayon pool is used.
pub fn get_pool() -> Option<&'static ThreadPool> {
    if let Some(pool) = GLOBAL_THREAD_POOL.get() {
        return Some(pool);
    }
    let num_threads = thread_count();
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("transform-lab-{i}"))
        .build()
    {
        Ok(pool) => {
            debug!(target: "transform_lab::pool", num_threads, "batch pool ready");
            // a concurrent caller may have won the race; either pool is fine
            let _ = GLOBAL_THREAD_POOL.set(pool);
            GLOBAL_THREAD_POOL.get()
        }
        Err(e) => {
            warn!(target: "transform_lab::pool", num_threads, error = %e, "falling back to the global rayon pool");
            None
        }
    }
}

/// Run `op` inside the shared pool, or the global rayon pool as a fallback.
pub fn install<R, OP>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match get_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_override_parsing() {
        assert_eq!(parse_thread_override(None), None);
        assert_eq!(parse_thread_override(Some("4")), Some(4));
        assert_eq!(parse_thread_override(Some(" 2 ")), Some(2));
        assert_eq!(parse_thread_override(Some("0")), None);
        assert_eq!(parse_thread_override(Some("many")), None);
        assert_eq!(parse_thread_override(Some("100000")), Some(MAX_THREADS));
    }

    #[test]
    fn install_runs_the_closure() {
        assert_eq!(install(|| 21 * 2), 42);
        assert!(thread_count() >= 1);
    }
}
