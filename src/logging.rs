//! Diagnostic logging. Nothing here is user-visible: answers and error
//! placeholders go to the transcript, tracing events go to a debug file
//! that only exists when the `debug-log` feature is enabled.

#[cfg(feature = "debug-log")]
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("bassam-debug.log")
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            return None;
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(writer).with_target(true));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
        return None;
    }

    tracing::info!("debug logging initialized");
    Some(guard)
}

#[cfg(not(feature = "debug-log"))]
#[inline(always)]
pub fn init() -> Option<()> {
    None
}
