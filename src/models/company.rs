use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

/// 注册公司（用户）记录；管理端只会修改 `blocked`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(alias = "_id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(rename = "companyName", default, deserialize_with = "lenient::string_or_empty")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub website: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub status: String,
    #[serde(default, alias = "isBlocked", deserialize_with = "lenient::bool_or_false")]
    pub blocked: bool,
    #[serde(default, alias = "logoUrl")]
    pub logo: Option<String>,
}

impl Searchable for Company {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.company_name, &self.email, &self.website]
    }
}

/// 切换封禁状态的请求体
#[derive(Debug, Clone, Serialize)]
pub struct BlockPayload {
    pub blocked: bool,
}
