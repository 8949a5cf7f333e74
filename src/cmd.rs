pub mod exec;

/// Maps a plugin log level onto a tracing filter. fatal and panic have no tracing counterpart and become error.
pub fn level_filter(level: &str) -> tracing_subscriber::filter::LevelFilter {
    use tracing_subscriber::filter::LevelFilter;
    match level {
        "t" | "trace" | "Trace" | "TRACE" => LevelFilter::TRACE,
        "d" | "debug" | "Debug" | "DEBUG" => LevelFilter::DEBUG,
        "w" | "warn" | "Warn" | "WARN" => LevelFilter::WARN,
        "e" | "error" | "Error" | "ERROR" => LevelFilter::ERROR,
        "f" | "fatal" | "Fatal" | "FATAL" => LevelFilter::ERROR,
        "p" | "panic" | "Panic" | "PANIC" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level_filter(level).into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
