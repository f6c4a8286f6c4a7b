//! 后端返回的数据形状
//!
//! 后端 JSON 只做宽松解析：字段缺失给默认值，数字字段兼容字符串与 null，
//! id 同时兼容 `_id` 与 `id`。

pub mod company;
pub mod contact;
pub mod email;
pub mod notification;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod ticket;

pub use company::Company;
pub use contact::{ContactRequest, ContactStatus};
pub use email::{EmailTemplate, RecipientGroup, SendEmailPayload, UpdateEmailTemplatePayload};
pub use notification::Notification;
pub use payment::{Payment, PaymentStats};
pub use plan::{AddOn, AddOnPayload, PlanUpdate, SubscriptionPlan};
pub use subscription::{
    AssignSubscriptionPayload, Subscription, UpdateSubscriptionPayload,
};
pub use ticket::{Ticket, TicketMessage, TicketPriority, TicketStats, TicketStatus};

/// 可在列表中做关键字搜索的记录
pub trait Searchable {
    /// 参与搜索的字段
    fn search_fields(&self) -> Vec<&str>;
}

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// 数字 / 数字字符串 / null → f64，无法识别时为 0
    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }

    pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64_or_zero(deserializer).map(|v| v.max(0) as u64)
    }

    /// 字符串字段：null 或非字符串值统一转成字符串 / 空串
    pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
    }

    /// 布尔字段兼容 "true"/"false" 与 0/1
    pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            Some(Value::String(s)) => matches!(s.trim(), "true" | "TRUE" | "1" | "yes"),
            _ => false,
        })
    }

    /// 时间字段可能是字符串、毫秒数或 null
    pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(deserializer)?;
        Ok(match v {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// 大小写不敏感的子串匹配；空关键字匹配所有记录
pub fn matches_search<T: Searchable>(item: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// 空字符串显示为 N/A
pub fn or_na(s: &str) -> &str {
    if s.trim().is_empty() { "N/A" } else { s }
}
