// Logger initialization

use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_FILE: &str = "gallery-gate.log";

/// Console logging, or a daily-rotated file when a directory is configured.
/// The returned guard must live as long as the process; dropping it stops
/// the background writer.
pub fn init_logger(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder().parse_lossy(&config.filter);

    match &config.directory {
        Some(directory) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, directory, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(writer),
                )
                .init();
            info!("File logging enabled to {}/{}", directory.display(), LOG_FILE);
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true))
                .init();
            None
        }
    }
}
