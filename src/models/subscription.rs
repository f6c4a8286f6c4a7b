use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

/// 订阅记录；状态与周期标签由 [`crate::subscription`] 在本地推导
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(alias = "_id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(rename = "companyName", default, deserialize_with = "lenient::string_or_empty")]
    pub company_name: String,
    #[serde(rename = "userEmail", default, alias = "email", deserialize_with = "lenient::string_or_empty")]
    pub user_email: String,
    #[serde(default, alias = "planName", deserialize_with = "lenient::string_or_empty")]
    pub plan_name: String,
    #[serde(default, alias = "startDate", deserialize_with = "lenient::opt_timestamp")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate", deserialize_with = "lenient::opt_timestamp")]
    pub end_date: Option<String>,
    #[serde(default, alias = "autoRenewal", deserialize_with = "lenient::bool_or_false")]
    pub auto_renewal: bool,
    #[serde(default, alias = "canceledAt", deserialize_with = "lenient::opt_timestamp")]
    pub canceled_at: Option<String>,
}

impl Searchable for Subscription {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.company_name, &self.user_email, &self.plan_name]
    }
}

/// 给用户分配订阅
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignSubscriptionPayload {
    pub email: String,
    pub plan_name: String,
    pub start_date: String,
    pub end_date: String,
    pub auto_renewal: bool,
}

/// 修改订阅，仅发送有变化的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSubscriptionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_renewal: Option<bool>,
}

impl UpdateSubscriptionPayload {
    pub fn is_empty(&self) -> bool {
        self.plan_name.is_none() && self.end_date.is_none() && self.auto_renewal.is_none()
    }
}

/// 批量停用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkDeactivatePayload {
    pub ids: Vec<String>,
}
