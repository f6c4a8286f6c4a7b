use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(alias = "_id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string_or_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::opt_timestamp")]
    pub created_at: Option<String>,
}

impl Searchable for Notification {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description, &self.kind, &self.category]
    }
}
