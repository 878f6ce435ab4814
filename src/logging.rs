use snafu::ResultExt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

use crate::config::Config;
use crate::error::{ApplicationError, InitializeLoggerSnafu};

/// Installs the global subscriber: a pretty console layer always, plus a
/// daily-rolling JSON file layer when `log_dir` is configured. The returned
/// guard must stay alive for the file writer to flush; drop it at shutdown.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>, ApplicationError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = layer().pretty().with_writer(std::io::stdout);

    let Some(log_dir) = &config.log_dir else {
        let subscriber = registry().with(filter).with(console_layer);
        tracing::subscriber::set_global_default(subscriber).context(InitializeLoggerSnafu)?;

        return Ok(None);
    };

    let (file_layer, guard) = {
        let file_appender = tracing_appender::rolling::daily(log_dir, "byteshorts.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = layer().with_ansi(false).json().with_writer(non_blocking);

        (layer, guard)
    };

    let subscriber = registry().with(filter).with(console_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber).context(InitializeLoggerSnafu)?;

    Ok(Some(guard))
}
