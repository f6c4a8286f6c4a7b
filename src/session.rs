use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::logging::time::parse_opt;
use crate::models::lenient;

const CACHE_FILE: &str = "session_cache.json";

/// 管理员会话，登录成功后由 [`crate::api::AdminClient`] 持有
///
/// 令牌只经由显式传入的会话使用，不从任何全局状态读取
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub expires_at: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: Option<String>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// 解析过期时间为UTC时间，格式与后端记录的时间字段一致（含毫秒时间戳）
    ///
    /// # Returns
    ///
    /// * `Some(DateTime<Utc>)` - 成功解析的UTC时间
    /// * `None` - 未提供或解析失败
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_opt(self.expires_at.as_deref())
    }

    /// 未声明过期时间的会话视为一直有效，直到后端返回 401/403
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.token.trim().is_empty() || self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// 磁盘上的会话缓存，位于数据目录下的 `session_cache.json`
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从磁盘加载会话缓存
    ///
    /// 文件不存在或格式错误时返回 None；已过期的缓存会被顺带删除
    ///
    /// # Arguments
    ///
    /// * `now` - 判断过期的基准时间
    pub fn load(&self, now: DateTime<Utc>) -> Option<Session> {
        let data = fs::read_to_string(&self.path).ok()?;
        let session: Session = match serde_json::from_str(&data) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session cache unreadable");
                return None;
            }
        };
        if session.is_expired(now) {
            tracing::info!("cached session expired, removing");
            self.clear();
            return None;
        }
        Some(session)
    }

    /// 保存会话缓存到磁盘
    ///
    /// # Arguments
    ///
    /// * `session` - 要保存的会话
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// 清除会话缓存文件，文件不存在时忽略
    ///
    /// 在登出或后端返回 401/403 时调用
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested"));
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let session = Session::new("tok", Some((now + Duration::hours(1)).to_rfc3339()));
        store.save(&session).unwrap();
        assert_eq!(store.load(now), Some(session));
    }

    #[test]
    fn expired_cache_is_removed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        store
            .save(&Session::new("tok", Some((now - Duration::minutes(1)).to_rfc3339())))
            .unwrap();
        assert!(store.load(now).is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn session_without_expiry_stays_valid() {
        let now = Utc::now();
        assert!(!Session::new("tok", None).is_expired(now));
        assert!(Session::new("  ", None).is_expired(now));
    }

    #[test]
    fn expiry_accepts_backend_timestamp_formats() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 1).unwrap();
        assert!(Session::new("tok", Some("2030-01-01 00:00:00".into())).is_expired(now));
        assert!(!Session::new("tok", Some("2030-01-02".into())).is_expired(now));

        let cached: Session =
            serde_json::from_str(r#"{"token":"tok","expires_at":1893456000000}"#).unwrap();
        assert_eq!(
            cached.expires_at(),
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(cached.is_expired(now));
    }

    #[test]
    fn clear_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(store.load(Utc::now()).is_none());
        store.clear();
        store.clear();
        assert!(!store.path().exists());
    }
}
