//! Tracing bootstrap for hosts embedding the editor core.

use std::path::Path;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;

/// Route `tracing` output to `<dir>/<file_name>` (truncated first), filtered
/// by `RUST_LOG`. Returns the writer guard, or `None` when a global
/// subscriber is already installed. Keep the guard alive for as long as
/// logs should be flushed.
pub fn init(dir: &Path, file_name: &str) -> Option<WorkerGuard> {
    let path = dir.join(file_name);
    if path.exists() {
        let _ = std::fs::remove_file(&path);
    }
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // someone else owns the global subscriber; dropping the guard stops our writer
        Err(_) => None,
    }
}

/// Log panics under `runtime.panic`, then run the previous hook. Installed
/// at most once per process.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
