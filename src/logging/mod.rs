pub mod time;

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{ConsoleError, Result};

/// 初始化 tracing 日志
///
/// 终端由 TUI 独占，日志统一追加写入文件；`RUST_LOG` 优先于配置中的级别。
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let path = Path::new(&cfg.file);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .map_err(|e| ConsoleError::Config(format!("invalid log level '{}': {}", cfg.level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(time::UtcTimer)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| ConsoleError::Config(e.to_string()))?;

    tracing::info!(file = %cfg.file, level = %cfg.level, "logging initialised");
    Ok(())
}
