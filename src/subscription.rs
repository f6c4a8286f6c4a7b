use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::logging::time::parse_opt;
use crate::models::{Searchable, Subscription};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// 由起止日期推导的订阅周期标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationLabel {
    Yearly,
    Monthly,
    BiWeekly,
    Weekly,
    Daily,
    Months(i64),
    Weeks(i64),
    Days(i64),
    NotAvailable,
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationLabel::Yearly => f.write_str("Yearly"),
            DurationLabel::Monthly => f.write_str("Monthly"),
            DurationLabel::BiWeekly => f.write_str("Bi-Weekly"),
            DurationLabel::Weekly => f.write_str("Weekly"),
            DurationLabel::Daily => f.write_str("Daily"),
            DurationLabel::Months(n) => write!(f, "{n} Months"),
            DurationLabel::Weeks(n) => write!(f, "{n} Weeks"),
            DurationLabel::Days(n) => write!(f, "{n} Days"),
            DurationLabel::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl DurationLabel {
    /// 过滤器里可选的固定周期
    pub const NAMED: [DurationLabel; 5] = [
        DurationLabel::Yearly,
        DurationLabel::Monthly,
        DurationLabel::BiWeekly,
        DurationLabel::Weekly,
        DurationLabel::Daily,
    ];
}

/// 起止日期相差的天数（四舍五入）；任一日期缺失或无法解析时为 None
pub fn diff_days(start: Option<&str>, end: Option<&str>) -> Option<i64> {
    let start = parse_opt(start)?;
    let end = parse_opt(end)?;
    let secs = (end - start).num_seconds() as f64;
    Some((secs / SECONDS_PER_DAY).round() as i64)
}

/// 按天数分档
pub fn classify_days(days: i64) -> DurationLabel {
    match days {
        d if d <= 0 => DurationLabel::NotAvailable,
        360..=372 => DurationLabel::Yearly,
        27..=33 => DurationLabel::Monthly,
        13..=16 => DurationLabel::BiWeekly,
        6..=8 => DurationLabel::Weekly,
        1 => DurationLabel::Daily,
        d if d % 30 == 0 => DurationLabel::Months(d / 30),
        d if d % 7 == 0 => DurationLabel::Weeks(d / 7),
        d => DurationLabel::Days(d),
    }
}

pub fn classify_duration(start: Option<&str>, end: Option<&str>) -> DurationLabel {
    diff_days(start, end)
        .map(classify_days)
        .unwrap_or(DurationLabel::NotAvailable)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Inactive => "Inactive",
        }
    }
}

/// Active：结束时间存在且晚于 now，且未被取消（canceled_at 缺失或在未来）
pub fn derive_status(sub: &Subscription, now: DateTime<Utc>) -> SubscriptionStatus {
    let Some(end) = parse_opt(sub.end_date.as_deref()) else {
        return SubscriptionStatus::Inactive;
    };
    if end <= now {
        return SubscriptionStatus::Inactive;
    }
    match sub.canceled_at.as_deref() {
        None => SubscriptionStatus::Active,
        Some(raw) => match parse_opt(Some(raw)) {
            Some(canceled) if canceled > now => SubscriptionStatus::Active,
            _ => SubscriptionStatus::Inactive,
        },
    }
}

/// 订阅列表中的一行：原始记录 + 本地推导字段
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRow {
    pub record: Subscription,
    pub status: SubscriptionStatus,
    pub duration: DurationLabel,
}

impl SubscriptionRow {
    pub fn derive(record: Subscription, now: DateTime<Utc>) -> Self {
        let status = derive_status(&record, now);
        let duration = classify_duration(record.start_date.as_deref(), record.end_date.as_deref());
        Self {
            record,
            status,
            duration,
        }
    }

    pub fn derive_all(records: Vec<Subscription>, now: DateTime<Utc>) -> Vec<Self> {
        records.into_iter().map(|r| Self::derive(r, now)).collect()
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

impl Searchable for SubscriptionRow {
    fn search_fields(&self) -> Vec<&str> {
        self.record.search_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sub(end: Option<&str>, canceled: Option<&str>) -> Subscription {
        Subscription {
            id: "s1".into(),
            company_name: "Acme".into(),
            user_email: "ops@acme.io".into(),
            plan_name: "Pro".into(),
            start_date: Some("2026-01-01T00:00:00Z".into()),
            end_date: end.map(str::to_string),
            auto_renewal: true,
            canceled_at: canceled.map(str::to_string),
        }
    }

    #[test]
    fn thirty_days_is_monthly_and_365_is_yearly() {
        assert_eq!(
            classify_duration(Some("2026-01-01"), Some("2026-01-31")),
            DurationLabel::Monthly
        );
        assert_eq!(
            classify_duration(Some("2025-01-01T00:00:00Z"), Some("2026-01-01T00:00:00Z")),
            DurationLabel::Yearly
        );
    }

    #[test]
    fn band_edges() {
        assert_eq!(classify_days(360), DurationLabel::Yearly);
        assert_eq!(classify_days(372), DurationLabel::Yearly);
        assert_eq!(classify_days(27), DurationLabel::Monthly);
        assert_eq!(classify_days(33), DurationLabel::Monthly);
        assert_eq!(classify_days(13), DurationLabel::BiWeekly);
        assert_eq!(classify_days(16), DurationLabel::BiWeekly);
        assert_eq!(classify_days(6), DurationLabel::Weekly);
        assert_eq!(classify_days(8), DurationLabel::Weekly);
        assert_eq!(classify_days(1), DurationLabel::Daily);
    }

    #[test]
    fn fallback_labels() {
        assert_eq!(classify_days(60).to_string(), "2 Months");
        assert_eq!(classify_days(180).to_string(), "6 Months");
        assert_eq!(classify_days(21).to_string(), "3 Weeks");
        assert_eq!(classify_days(45).to_string(), "45 Days");
        assert_eq!(classify_days(2).to_string(), "2 Days");
        assert_eq!(DurationLabel::BiWeekly.to_string(), "Bi-Weekly");
    }

    #[test]
    fn non_positive_or_unparseable_is_na() {
        assert_eq!(classify_days(0), DurationLabel::NotAvailable);
        assert_eq!(
            classify_duration(Some("2026-02-01"), Some("2026-01-01")),
            DurationLabel::NotAvailable
        );
        assert_eq!(classify_duration(Some("soon"), Some("2026-01-01")), DurationLabel::NotAvailable);
        assert_eq!(classify_duration(None, Some("2026-01-01")), DurationLabel::NotAvailable);
        assert_eq!(DurationLabel::NotAvailable.to_string(), "N/A");
    }

    #[test]
    fn half_days_round_to_nearest() {
        assert_eq!(
            diff_days(Some("2026-01-01T00:00:00Z"), Some("2026-01-31T13:00:00Z")),
            Some(31)
        );
    }

    #[test]
    fn status_is_inactive_when_end_is_past_or_absent() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(derive_status(&sub(Some("2026-02-01"), None), now), SubscriptionStatus::Inactive);
        assert_eq!(derive_status(&sub(None, None), now), SubscriptionStatus::Inactive);
        assert_eq!(derive_status(&sub(Some("garbage"), None), now), SubscriptionStatus::Inactive);
        assert_eq!(derive_status(&sub(Some("2026-04-01"), None), now), SubscriptionStatus::Active);
    }

    #[test]
    fn canceled_subscriptions_are_inactive() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let past = (now - Duration::days(1)).to_rfc3339();
        let future = (now + Duration::days(1)).to_rfc3339();
        assert_eq!(
            derive_status(&sub(Some("2026-04-01"), Some(&past)), now),
            SubscriptionStatus::Inactive
        );
        assert_eq!(
            derive_status(&sub(Some("2026-04-01"), Some(&future)), now),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn row_derivation_combines_both() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let row = SubscriptionRow::derive(sub(Some("2026-01-31T00:00:00Z"), None), now);
        assert!(row.is_active());
        assert_eq!(row.duration, DurationLabel::Monthly);
    }
}
