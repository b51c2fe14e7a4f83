//! 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。
//! The filter is a `Targets` with the global level as default and one entry
//! per `ki::<phase>` target.

use ki_config::{LogConfig, LogLevel, Phase};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    Layer,
};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// Logging setup failures
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("global subscriber already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Map a config level onto a tracing filter
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}

/// Filter with the global level as default and per-phase overrides
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL.iter().fold(
        Targets::new().with_default(level_filter(log_config.global)),
        |targets, phase| targets.with_target(phase.target(), level_filter(log_config.level_for(*phase))),
    )
}

/// 初始化日志系统（仅控制台）
pub fn init(log_config: &LogConfig, format: LogFormat) -> Result<(), LoggingError> {
    init_with_file::<&Path>(log_config, format, None)
}

/// 使用指定格式和日志配置初始化日志系统（可选同时写入文件）
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> Result<(), LoggingError> {
    let targets = targets(log_config);
    let stdout_layer = format_layer(format, io::stdout).with_filter(targets.clone());

    // If file specified, output to both console and file
    if let Some(path) = file {
        let path = path.as_ref();
        let file_handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggingError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
        let file_layer = format_layer(format, Mutex::new(file_handle)).with_filter(targets);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry().with(stdout_layer).try_init()?;
    }
    Ok(())
}

/// Create formatter layer based on format
fn format_layer<S, W>(format: LogFormat, make_writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(level_filter(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(level_filter(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn test_targets_apply_phase_overrides() {
        let config = LogConfig {
            global: LogLevel::Warn,
            cache: Some(LogLevel::Debug),
            ..LogConfig::default()
        };
        let targets = targets(&config);

        assert!(targets.would_enable("ki::cache", &Level::DEBUG));
        assert!(!targets.would_enable("ki::discovery", &Level::INFO));
        assert!(targets.would_enable("ki::discovery", &Level::WARN));
        assert!(!targets.would_enable("other", &Level::INFO));
    }

    #[test]
    fn test_open_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("ki.log");
        let err = init_with_file(&LogConfig::default(), LogFormat::Compact, Some(&missing)).unwrap_err();
        assert!(matches!(err, LoggingError::OpenFile { ref path, .. } if path == &missing));
    }
}
