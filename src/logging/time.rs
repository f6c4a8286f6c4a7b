use crate::error::ConsoleError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 表格中展示用的时间（UTC，精确到分钟）
pub fn to_display_string(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

pub fn to_date_string(dt: &DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

/// 将 UTC 时间转换为 ISO-8601 / RFC3339（UTC, `Z`）
pub fn to_iso8601_utc_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析后端返回的时间字符串为 UTC：
/// - 优先 RFC3339 / ISO-8601（带时区偏移或 `Z`）
/// - 不带时区的 `YYYY-MM-DDTHH:mm:ss(.f)?` / `YYYY-MM-DD HH:mm:ss` 按 UTC 解释
/// - 仅日期 `YYYY-MM-DD` 视为当天 00:00 UTC
/// - 纯数字按毫秒时间戳解释
pub fn parse_datetime_string(s: &str) -> crate::error::Result<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ConsoleError::TimeParse("empty timestamp".into()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", DATETIME_FORMAT] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        let millis: i64 = s
            .parse()
            .map_err(|e: std::num::ParseIntError| ConsoleError::TimeParse(e.to_string()))?;
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| ConsoleError::TimeParse(format!("timestamp out of range: {s}")));
    }
    Err(ConsoleError::TimeParse(format!("unrecognized timestamp: {s}")))
}

/// 宽松解析：缺失或无法解析时返回 None
pub fn parse_opt(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|v| parse_datetime_string(v).ok())
}

/// 缺失或无法解析的时间统一显示为 N/A
pub fn display_or_na(s: Option<&str>) -> String {
    parse_opt(s)
        .map(|dt| to_display_string(&dt))
        .unwrap_or_else(|| "N/A".to_string())
}

// tracing_subscriber 自定义时间格式：日志文件统一输出 UTC
pub struct UtcTimer;

impl tracing_subscriber::fmt::time::FormatTime for UtcTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Utc::now().format(DATETIME_FORMAT))
    }
}
