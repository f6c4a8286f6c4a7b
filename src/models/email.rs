use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

/// 事务邮件模板；`emailType` 创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    #[serde(rename = "_id", alias = "id", deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(rename = "emailType", default, deserialize_with = "lenient::string_or_empty")]
    pub email_type: String,
    #[serde(rename = "emailSubject", default, deserialize_with = "lenient::string_or_empty")]
    pub email_subject: String,
    #[serde(rename = "emailBody", default, deserialize_with = "lenient::string_or_empty")]
    pub email_body: String,
}

impl Searchable for EmailTemplate {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.email_subject, &self.email_type, &self.email_body]
    }
}

/// 模板更新请求体，不携带 emailType
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateEmailTemplatePayload {
    #[serde(rename = "emailSubject")]
    pub email_subject: String,
    #[serde(rename = "emailBody")]
    pub email_body: String,
}

/// 自定义邮件的收件人分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "group", content = "emails", rename_all = "snake_case")]
pub enum RecipientGroup {
    AllUsers,
    ActiveSubscribers,
    InactiveSubscribers,
    Custom(Vec<String>),
}

impl RecipientGroup {
    pub fn label(&self) -> String {
        match self {
            RecipientGroup::AllUsers => "全部用户".to_string(),
            RecipientGroup::ActiveSubscribers => "有效订阅用户".to_string(),
            RecipientGroup::InactiveSubscribers => "无效订阅用户".to_string(),
            RecipientGroup::Custom(list) => format!("指定邮箱（{} 个）", list.len()),
        }
    }

    /// 解析逗号/分号/空白分隔的邮箱列表，去重并过滤明显非法的地址
    pub fn custom_from_input(input: &str) -> crate::error::Result<Self> {
        let mut emails: Vec<String> = Vec::new();
        for raw in input.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            let email = raw.trim();
            if email.is_empty() {
                continue;
            }
            let valid = email
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if !valid {
                return Err(crate::error::ConsoleError::InvalidInput(format!(
                    "invalid email address: {email}"
                )));
            }
            if !emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
                emails.push(email.to_string());
            }
        }
        if emails.is_empty() {
            return Err(crate::error::ConsoleError::InvalidInput(
                "at least one recipient is required".into(),
            ));
        }
        Ok(RecipientGroup::Custom(emails))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendEmailPayload {
    pub recipients: RecipientGroup,
    pub subject: String,
    pub body: String,
}
