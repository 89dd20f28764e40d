//! Running blocking work from any thread

use tokio::runtime::{Handle, RuntimeFlavor};

/// Run blocking work without stalling or tripping an enclosing tokio runtime
///
/// Blocking HTTP clients build and drop a private runtime, which tokio
/// forbids on threads that are currently driving async tasks.
///
/// - Outside any runtime, and on `spawn_blocking` threads of a
///   multi-threaded runtime, `f` runs inline.
/// - On a multi-threaded worker, `f` runs through
///   [`tokio::task::block_in_place`] so the worker's other tasks move to
///   another thread first.
/// - Under a current-thread runtime, `f` runs on a scoped helper thread
///   that has no runtime context. The calling thread waits for it.
pub fn run_blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    let Ok(handle) = Handle::try_current() else {
        return f();
    };

    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => std::thread::scope(|scope| match scope.spawn(f).join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }),
    }
}
