//! 各业务列表的分类过滤条件

use chrono::{DateTime, Duration, Utc};

use crate::logging::time::parse_opt;
use crate::models::{Company, ContactRequest, ContactStatus, Notification, Payment, Ticket};
use crate::models::{TicketPriority, TicketStatus};
use crate::subscription::{DurationLabel, SubscriptionRow, SubscriptionStatus};
use crate::view::list::RecordFilter;

/// 字符串类条件：None 表示“全部”，比较时忽略大小写与首尾空白
fn text_matches(want: &Option<String>, value: &str) -> bool {
    match want {
        None => true,
        Some(w) => w.trim().eq_ignore_ascii_case(value.trim()),
    }
}

fn push_part(parts: &mut Vec<String>, label: &str, value: impl AsRef<str>) {
    parts.push(format!("{label}={}", value.as_ref()));
}

/// 滚动时间窗口
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    #[default]
    All,
    Last24Hours,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 5] = [
        TimeWindow::All,
        TimeWindow::Last24Hours,
        TimeWindow::Last7Days,
        TimeWindow::Last30Days,
        TimeWindow::Last90Days,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::All => "全部时间",
            TimeWindow::Last24Hours => "最近 24 小时",
            TimeWindow::Last7Days => "最近 7 天",
            TimeWindow::Last30Days => "最近 30 天",
            TimeWindow::Last90Days => "最近 90 天",
        }
    }

    fn span(self) -> Option<Duration> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Last24Hours => Some(Duration::hours(24)),
            TimeWindow::Last7Days => Some(Duration::days(7)),
            TimeWindow::Last30Days => Some(Duration::days(30)),
            TimeWindow::Last90Days => Some(Duration::days(90)),
        }
    }

    /// 时间戳是否落在 `[now - span, now]` 内；缺失或无法解析的时间只在 All 下可见
    pub fn contains(self, timestamp: Option<&str>, now: DateTime<Utc>) -> bool {
        let Some(span) = self.span() else {
            return true;
        };
        match parse_opt(timestamp) {
            Some(t) => t >= now - span && t <= now,
            None => false,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// 循环切换可选值：None → 第一个 → ... → 最后一个 → None
pub fn cycle_option<T: Copy + PartialEq>(current: Option<T>, options: &[T]) -> Option<T> {
    match current {
        None => options.first().copied(),
        Some(cur) => {
            let idx = options.iter().position(|o| *o == cur)?;
            options.get(idx + 1).copied()
        }
    }
}

/// 字符串版本的 [`cycle_option`]，候选值一般取自当前数据源
pub fn cycle_text(current: &Option<String>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(cur) => {
            let idx = options.iter().position(|o| o.eq_ignore_ascii_case(cur))?;
            options.get(idx + 1).cloned()
        }
    }
}

/// 从记录中收集去重、排序后的候选值（空值忽略）
pub fn distinct_values<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    field: impl Fn(&T) -> &str,
) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for item in items {
        let v = field(item).trim();
        if v.is_empty() || values.iter().any(|x| x.eq_ignore_ascii_case(v)) {
            continue;
        }
        values.push(v.to_string());
    }
    values.sort_by_key(|v| v.to_lowercase());
    values
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
    pub status: Option<String>,
    pub blocked: Option<bool>,
}

impl RecordFilter<Company> for CompanyFilter {
    fn matches(&self, item: &Company) -> bool {
        text_matches(&self.status, &item.status) && self.blocked.is_none_or(|b| b == item.blocked)
    }

    fn is_active(&self) -> bool {
        self.status.is_some() || self.blocked.is_some()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = &self.status {
            push_part(&mut parts, "status", s);
        }
        if let Some(b) = self.blocked {
            push_part(&mut parts, "blocked", if b { "yes" } else { "no" });
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFilter {
    pub status: Option<String>,
    pub method: Option<String>,
    pub window: TimeWindow,
    pub now: DateTime<Utc>,
}

impl Default for PaymentFilter {
    fn default() -> Self {
        Self {
            status: None,
            method: None,
            window: TimeWindow::All,
            now: Utc::now(),
        }
    }
}

impl RecordFilter<Payment> for PaymentFilter {
    fn matches(&self, item: &Payment) -> bool {
        text_matches(&self.status, &item.status)
            && text_matches(&self.method, &item.payment_method)
            && self.window.contains(item.paid_at.as_deref(), self.now)
    }

    fn is_active(&self) -> bool {
        self.status.is_some() || self.method.is_some() || self.window != TimeWindow::All
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = &self.status {
            push_part(&mut parts, "status", s);
        }
        if let Some(m) = &self.method {
            push_part(&mut parts, "method", m);
        }
        if self.window != TimeWindow::All {
            parts.push(self.window.label().to_string());
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub plan: Option<String>,
    pub duration: Option<DurationLabel>,
    pub status: Option<SubscriptionStatus>,
}

impl RecordFilter<SubscriptionRow> for SubscriptionFilter {
    fn matches(&self, item: &SubscriptionRow) -> bool {
        text_matches(&self.plan, &item.record.plan_name)
            && self.duration.is_none_or(|d| d == item.duration)
            && self.status.is_none_or(|s| s == item.status)
    }

    fn is_active(&self) -> bool {
        self.plan.is_some() || self.duration.is_some() || self.status.is_some()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(p) = &self.plan {
            push_part(&mut parts, "plan", p);
        }
        if let Some(d) = self.duration {
            push_part(&mut parts, "duration", d.to_string());
        }
        if let Some(s) = self.status {
            push_part(&mut parts, "status", s.as_str());
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
}

impl RecordFilter<Ticket> for TicketFilter {
    fn matches(&self, item: &Ticket) -> bool {
        self.status.is_none_or(|s| s == item.status)
            && self.priority.is_none_or(|p| p == item.priority)
            && text_matches(&self.category, &item.category)
    }

    fn is_active(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || self.category.is_some()
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = self.status {
            push_part(&mut parts, "status", s.as_str());
        }
        if let Some(p) = self.priority {
            push_part(&mut parts, "priority", p.as_str());
        }
        if let Some(c) = &self.category {
            push_part(&mut parts, "category", c);
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFilter {
    pub category: Option<String>,
    pub window: TimeWindow,
    /// 时间窗口的基准时间，刷新数据时更新
    pub now: DateTime<Utc>,
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            category: None,
            window: TimeWindow::All,
            now: Utc::now(),
        }
    }
}

impl RecordFilter<Notification> for NotificationFilter {
    fn matches(&self, item: &Notification) -> bool {
        text_matches(&self.category, &item.category)
            && self.window.contains(item.created_at.as_deref(), self.now)
    }

    fn is_active(&self) -> bool {
        self.category.is_some() || self.window != TimeWindow::All
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(c) = &self.category {
            push_part(&mut parts, "category", c);
        }
        if self.window != TimeWindow::All {
            parts.push(self.window.label().to_string());
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFilter {
    pub status: Option<ContactStatus>,
}

impl RecordFilter<ContactRequest> for ContactFilter {
    fn matches(&self, item: &ContactRequest) -> bool {
        self.status.is_none_or(|s| s == item.status)
    }

    fn is_active(&self) -> bool {
        self.status.is_some()
    }

    fn describe(&self) -> String {
        self.status
            .map(|s| format!("status={}", s.label()))
            .unwrap_or_default()
    }
}
