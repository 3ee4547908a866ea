// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::NormalizeError;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub(crate) type EngineResult<T> = std::result::Result<T, NormalizeError>;

/// Run a native codec call, turning a panic raised inside the binding into
/// `InternalPanic` instead of unwinding through the caller.
///
/// mozjpeg reports fatal libjpeg errors by panicking, so every codec entry
/// point goes through here. Codec handles are owned by the closure and are
/// dropped on every exit path, unwinding included.
pub(crate) fn run_with_panic_policy<T, F>(label: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            tracing::error!(stage = label, %detail, "codec panicked");
            Err(NormalizeError::internal_panic(format!("{label}: {detail}")))
        }
    }
}
