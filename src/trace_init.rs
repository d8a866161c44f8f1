#[cfg(feature = "trace")]
use std::path::Path;
#[cfg(feature = "trace")]
use std::sync::Once;

#[cfg(feature = "trace")]
static INIT: Once = Once::new();

/// Route debug events to a JSON lines file under `log_dir`. Key-by-key
/// composition events add up fast, so the file rolls daily and writes go
/// through a non-blocking appender off the input path.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) {
    INIT.call_once(|| {
        let appender = tracing_appender::rolling::daily(log_dir, "kotoha-trace.jsonl");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        std::mem::forget(guard); // lives as long as the host process

        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kotoha_engine=debug"));
        tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(writer)
            .with_target(true)
            .with_env_filter(filter)
            .init();
    });
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &std::path::Path) {}
