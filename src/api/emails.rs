use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::{ConsoleError, Result};
use crate::models::{EmailTemplate, SendEmailPayload, UpdateEmailTemplatePayload};

pub async fn list_templates(client: &AdminClient) -> Result<Vec<EmailTemplate>> {
    client.get(&["admin", "email-contents"]).await
}

/// 更新模板主题与正文；emailType 不随请求提交
pub async fn update_template(
    client: &AdminClient,
    id: &str,
    payload: &UpdateEmailTemplatePayload,
) -> Result<()> {
    if payload.email_subject.trim().is_empty() {
        return Err(ConsoleError::InvalidInput("subject is required".into()));
    }
    let path = ["admin", "email-contents", record_id(id)?];
    client.send(Method::PUT, &path, payload).await
}

/// 向收件人分组发送自定义邮件
pub async fn send(client: &AdminClient, payload: &SendEmailPayload) -> Result<()> {
    if payload.subject.trim().is_empty() || payload.body.trim().is_empty() {
        return Err(ConsoleError::InvalidInput(
            "subject and body are required".into(),
        ));
    }
    tracing::info!(recipients = %payload.recipients.label(), "sending custom email");
    client.send(Method::POST, &["admin", "emails", "send"], payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use crate::models::RecipientGroup;
    use serde_json::json;

    #[tokio::test]
    async fn send_posts_group_subject_and_body() {
        let backend = StubBackend::start().await;
        let payload = SendEmailPayload {
            recipients: RecipientGroup::ActiveSubscribers,
            subject: "Maintenance".into(),
            body: "<p>Tonight</p>".into(),
        };
        send(&backend.client(), &payload).await.unwrap();
        assert_eq!(
            backend.requests()[0].body,
            json!({
                "recipients": {"group": "active_subscribers"},
                "subject": "Maintenance",
                "body": "<p>Tonight</p>"
            })
        );
    }

    #[tokio::test]
    async fn template_update_requires_subject() {
        let backend = StubBackend::start().await;
        let payload = UpdateEmailTemplatePayload {
            email_subject: " ".into(),
            email_body: "<p>x</p>".into(),
        };
        assert!(update_template(&backend.client(), "e1", &payload).await.is_err());
        assert!(backend.requests().is_empty());
    }
}
