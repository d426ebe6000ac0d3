//! Logging setup shared by the bankgate crates.
//!
//! Re-exports the `tracing` macros so downstream crates log through a single
//! dependency, and installs the global subscriber for binaries and tests.

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};
pub use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human readable lines
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Initialize the global subscriber with JSON output on stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    install(filter, LogFormat::Json)
}

/// Initialize the global subscriber with an explicit filter directive
pub fn init_tracing_with_level(
    level: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    install(EnvFilter::try_new(level)?, format)
}

/// Initialize tracing for tests with output captured by the test harness
pub fn init_tracing_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init()?;

    Ok(())
}

fn install(
    filter: EnvFilter,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init()?,
    }

    Ok(())
}
