use std::io::{self, IsTerminal};

use shared::config::{LogFormat, LoggingConfig};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter};

/// Installs the global subscriber writing to stderr and returns the
/// configured level. A subscriber that is already installed is kept.
pub fn initialize_tracing(config: &LoggingConfig) -> String {
    let ansi = io::stderr().is_terminal();
    let subscriber = subscriber_with_writer(config, io::stderr, ansi);
    let _ = tracing::subscriber::set_global_default(subscriber);
    config.level.clone()
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let default_level = config
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

fn subscriber_with_writer<W>(
    config: &LoggingConfig,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = fmt::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer);

    match config.format {
        LogFormat::Json => Box::new(builder.json().with_ansi(false).finish()),
        LogFormat::Text => Box::new(builder.with_ansi(ansi).finish()),
    }
}
