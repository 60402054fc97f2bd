use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Maps the number of `-v` flags to the crate's log level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// The filter deciding what gets logged.
pub enum LogFilter {
    /// `RUST_LOG` was set and parsed; it alone decides.
    Env(EnvFilter),
    /// Crate-scoped level from the `-v` count.
    Crate(Targets),
}

/// Picks the filter: a valid, non-empty `RUST_LOG` wins over `-v`.
pub fn select_filter(verbosity: u8, rust_log: Option<&str>) -> LogFilter {
    match rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        Some(env_filter) => LogFilter::Env(env_filter),
        None => LogFilter::Crate(Targets::new().with_target("fxdash", level_for(verbosity))),
    }
}

/// Installs the global subscriber, writing to stderr so tables on stdout stay
/// clean.
pub fn init_logging(verbosity: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let registry = tracing_subscriber::registry().with(
        fmt::layer()
            .pretty()
            .without_time()
            .with_writer(std::io::stderr),
    );

    match select_filter(verbosity, rust_log.as_deref()) {
        LogFilter::Env(env_filter) => registry.with(env_filter).init(),
        LogFilter::Crate(targets) => registry.with(targets).init(),
    }
}
