use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Re-Opened")]
    ReOpened,
    Withdrawn,
    Completed,
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::ReOpened,
        TicketStatus::Withdrawn,
        TicketStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Pending => "Pending",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::ReOpened => "Re-Opened",
            TicketStatus::Withdrawn => "Withdrawn",
            TicketStatus::Completed => "Completed",
            TicketStatus::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// 打开工单时是否需要自动流转到 In Progress
    pub fn needs_auto_progress(self) -> bool {
        !matches!(
            self,
            TicketStatus::InProgress | TicketStatus::Completed | TicketStatus::Withdrawn
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Unknown,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Urgent => "Urgent",
            TicketPriority::Unknown => "Unknown",
        }
    }
}

fn default_status() -> TicketStatus {
    TicketStatus::Pending
}

fn default_priority() -> TicketPriority {
    TicketPriority::Unknown
}

/// 工单消息：后端可能直接给字符串，也可能给带时间的对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMessage")]
pub struct TicketMessage {
    pub message: String,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Text(String),
    Structured {
        #[serde(alias = "text", alias = "content", default)]
        message: String,
        #[serde(alias = "createdAt", alias = "timestamp", default)]
        created_at: Option<String>,
    },
}

impl From<RawMessage> for TicketMessage {
    fn from(raw: RawMessage) -> Self {
        match raw {
            RawMessage::Text(message) => Self {
                message,
                created_at: None,
            },
            RawMessage::Structured {
                message,
                created_at,
            } => Self {
                message,
                created_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id", alias = "id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default = "default_status")]
    pub status: TicketStatus,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub category: String,
    #[serde(rename = "subCategory", default, deserialize_with = "lenient::string_or_empty")]
    pub sub_category: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(rename = "userMessages", default)]
    pub user_messages: Vec<TicketMessage>,
    #[serde(rename = "adminMessages", default)]
    pub admin_messages: Vec<TicketMessage>,
    #[serde(rename = "resolvedDescription", default)]
    pub resolved_description: Option<String>,
    #[serde(rename = "companyName", default, deserialize_with = "lenient::string_or_empty")]
    pub company_name: String,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::opt_timestamp")]
    pub created_at: Option<String>,
}

impl Searchable for Ticket {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.id,
            &self.category,
            &self.sub_category,
            &self.description,
        ]
    }
}

/// 工单统计，缺失字段按 0 处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketStats {
    #[serde(alias = "totalTickets", deserialize_with = "lenient::u64_or_zero")]
    pub total: u64,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub pending: u64,
    #[serde(alias = "inProgress", deserialize_with = "lenient::u64_or_zero")]
    pub in_progress: u64,
    #[serde(alias = "reOpened", deserialize_with = "lenient::u64_or_zero")]
    pub re_opened: u64,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub completed: u64,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub withdrawn: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketStatusPayload {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketReplyPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketResolvePayload {
    pub status: TicketStatus,
    #[serde(rename = "resolvedDescription")]
    pub resolved_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let s: TicketStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(s, TicketStatus::InProgress);
        let s: TicketStatus = serde_json::from_str("\"Re-Opened\"").unwrap();
        assert_eq!(s, TicketStatus::ReOpened);
        let s: TicketStatus = serde_json::from_str("\"Escalated\"").unwrap();
        assert_eq!(s, TicketStatus::Unknown);
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(TicketStatus::parse("in progress"), Some(TicketStatus::InProgress));
    }

    #[test]
    fn auto_progress_only_for_open_states() {
        assert!(TicketStatus::Pending.needs_auto_progress());
        assert!(TicketStatus::ReOpened.needs_auto_progress());
        assert!(!TicketStatus::InProgress.needs_auto_progress());
        assert!(!TicketStatus::Completed.needs_auto_progress());
        assert!(!TicketStatus::Withdrawn.needs_auto_progress());
    }

    #[test]
    fn messages_accept_strings_and_objects() {
        let t: Ticket = serde_json::from_str(
            r#"{"_id":"t1","status":"Pending","priority":"High","category":"Billing",
                "userMessages":["help", {"message":"still broken","createdAt":"2026-01-01"}],
                "adminMessages":[]}"#,
        )
        .unwrap();
        assert_eq!(t.user_messages.len(), 2);
        assert_eq!(t.user_messages[0].message, "help");
        assert_eq!(t.user_messages[1].created_at.as_deref(), Some("2026-01-01"));
        assert_eq!(t.priority, TicketPriority::High);
    }
}
