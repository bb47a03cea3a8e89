use std::path::PathBuf;

use anyhow::Context;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::configuration::project_dirs;

pub fn log_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber: `RUST_LOG` (or `env_filter`) filtered,
/// pretty output on stderr plus a daily log file. Keep the returned guard
/// alive until exit so buffered file output is flushed.
pub fn init_subscriber(name: &str, env_filter: &str) -> anyhow::Result<WorkerGuard> {
    LogTracer::init().context("failed to initialize log tracer bridge")?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    // stdout carries command output
    let formatting_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .pretty();

    let file_appender = tracing_appender::rolling::daily(log_dir(), format!("{}.log", name));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .with(file_layer);

    set_global_default(subscriber).context("failed to set global tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installs a global subscriber; only one test in this binary may do so
    #[test]
    fn test_init_subscriber() {
        let _guard = init_subscriber("vouch_test", "info").unwrap();
        tracing::info!("subscriber installed");

        assert!(init_subscriber("vouch_test", "info").is_err());
    }

    #[test]
    fn test_log_dir_ends_with_logs() {
        assert!(log_dir().ends_with("logs"));
    }
}
