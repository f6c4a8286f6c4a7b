use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    Pending,
    Connected,
}

impl ContactStatus {
    /// 列表中的显示文案：未处理的请求显示为 Open
    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::Pending => "Open",
            ContactStatus::Connected => "Connected",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Pending => "Pending",
            ContactStatus::Connected => "Connected",
        }
    }

    /// 排序权重：Open 在前，Connected 在后
    pub fn sort_rank(self) -> u8 {
        match self {
            ContactStatus::Pending => 0,
            ContactStatus::Connected => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ContactStatus::Pending => ContactStatus::Connected,
            ContactStatus::Connected => ContactStatus::Pending,
        }
    }
}

fn default_status() -> ContactStatus {
    ContactStatus::Pending
}

fn status_lenient<'de, D>(deserializer: D) -> Result<ContactStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = lenient::string_or_empty(deserializer)?;
    Ok(match raw.trim().to_ascii_lowercase().as_str() {
        "connected" => ContactStatus::Connected,
        _ => ContactStatus::Pending,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(rename = "_id", alias = "id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, alias = "companyName", deserialize_with = "lenient::string_or_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub email: String,
    #[serde(default, alias = "message", deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(default = "default_status", deserialize_with = "status_lenient")]
    pub status: ContactStatus,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::opt_timestamp")]
    pub created_at: Option<String>,
}

impl Searchable for ContactRequest {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.company, &self.email, &self.description]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactStatusPayload {
    pub status: ContactStatus,
}

/// Open 在前、Connected 在后；同状态内保持原有顺序
pub fn sort_open_first(items: &mut [ContactRequest]) {
    items.sort_by_key(|c| c.status.sort_rank());
}
