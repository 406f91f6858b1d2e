use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run a user callable, turning a panic into its message.
///
/// The engine never lets a panic from a step, predicate, transform or
/// validator escape a run.
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
