use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, Result};
use crate::view::pagination::ROWS_PER_PAGE_OPTIONS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
    /// 会话缓存与导航状态所在目录
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// 写操作成功后延迟多久再重新拉取受影响的数据（毫秒）
    #[serde(default)]
    pub reload_delay_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            rows_per_page: default_rows_per_page(),
            toast_secs: default_toast_secs(),
            data_dir: default_data_dir(),
            reload_delay_ms: 0,
        }
    }
}

fn default_rows_per_page() -> usize {
    10
}

fn default_toast_secs() -> u64 {
    3
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_issuer_name")]
    pub issuer_name: String,
    #[serde(default)]
    pub issuer_address: Option<String>,
    #[serde(default)]
    pub issuer_email: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            issuer_name: default_issuer_name(),
            issuer_address: None,
            issuer_email: None,
        }
    }
}

fn default_output_dir() -> String {
    "exports".to_string()
}

fn default_issuer_name() -> String {
    "Proposal Platform".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/console.log".to_string()
}

impl Settings {
    /// 加载配置：配置文件（可选）→ 环境变量覆盖 → 标准化
    pub fn load() -> Result<Self> {
        let mut settings = match Self::find_config_file() {
            Some(path) => Self::load_from(&path)?,
            None => Settings::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings.normalized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| ConsoleError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(settings.normalized())
    }

    fn find_config_file() -> Option<PathBuf> {
        let possible_names = ["custom-config.toml", "config.toml"];

        possible_names
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// 环境变量覆盖；`lookup` 便于测试时注入
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ADMIN_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("ADMIN_API_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.api.timeout_secs = secs;
        }
        if let Some(dir) = lookup("ADMIN_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.console.data_dir = dir;
        }
    }

    /// 标准化配置参数
    /// - 移除 URL 末尾的斜杠
    /// - 超时限制在 1-300 秒之间
    /// - 每页行数吸附到最近的可选值
    pub fn normalized(mut self) -> Self {
        self.api.base_url = self.api.base_url.trim().trim_end_matches('/').to_string();
        self.api.timeout_secs = self.api.timeout_secs.clamp(1, 300);
        self.console.rows_per_page = snap_rows_per_page(self.console.rows_per_page);
        if self.console.toast_secs == 0 {
            self.console.toast_secs = default_toast_secs();
        }
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.console.data_dir)
    }
}

fn snap_rows_per_page(n: usize) -> usize {
    ROWS_PER_PAGE_OPTIONS
        .iter()
        .copied()
        .min_by_key(|opt| opt.abs_diff(n))
        .unwrap_or(10)
}
