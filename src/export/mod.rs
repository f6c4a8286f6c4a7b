//! 导出：列表 CSV 与可打印的发票 HTML

pub mod csv;
pub mod invoice;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// `<prefix>-YYYYMMDD-HHMMSS.<ext>`
pub fn file_name(prefix: &str, ext: &str, now: DateTime<Utc>) -> String {
    let safe: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}-{}.{}", safe, now.format("%Y%m%d-%H%M%S"), ext)
}

/// 写入导出目录（不存在时创建），返回完整路径
pub fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}
