use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::{ConsoleError, Result};
use crate::logging::time::parse_datetime_string;
use crate::models::subscription::BulkDeactivatePayload;
use crate::models::{AssignSubscriptionPayload, Subscription, UpdateSubscriptionPayload};
use crate::subscription::SubscriptionRow;

pub async fn list(client: &AdminClient) -> Result<Vec<Subscription>> {
    client.get(&["admin", "subscriptions"]).await
}

/// 检查分配请求：邮箱、套餐必填，结束日期晚于开始日期
fn validate_assign(payload: &AssignSubscriptionPayload) -> Result<()> {
    if !payload.email.contains('@') {
        return Err(ConsoleError::InvalidInput(format!(
            "invalid email address: {}",
            payload.email
        )));
    }
    if payload.plan_name.trim().is_empty() {
        return Err(ConsoleError::InvalidInput("plan is required".into()));
    }
    let start = parse_datetime_string(&payload.start_date)?;
    let end = parse_datetime_string(&payload.end_date)?;
    if end <= start {
        return Err(ConsoleError::InvalidInput(
            "end date must be after start date".into(),
        ));
    }
    Ok(())
}

/// 按用户邮箱分配订阅
pub async fn assign(client: &AdminClient, payload: &AssignSubscriptionPayload) -> Result<()> {
    validate_assign(payload)?;
    client
        .send(Method::POST, &["admin", "subscriptions", "assign"], payload)
        .await
}

/// 修改套餐、结束日期或自动续费；没有任何改动时不发请求
///
/// # Returns
///
/// * `Ok(true)` - 已提交
/// * `Ok(false)` - 没有改动
pub async fn update(
    client: &AdminClient,
    id: &str,
    payload: &UpdateSubscriptionPayload,
) -> Result<bool> {
    if payload.is_empty() {
        return Ok(false);
    }
    if let Some(end) = &payload.end_date {
        parse_datetime_string(end)?;
    }
    let path = ["admin", "subscriptions", record_id(id)?];
    client.send(Method::PUT, &path, payload).await?;
    Ok(true)
}

/// 停用单个订阅；只有当前有效的订阅可以停用
pub async fn deactivate(client: &AdminClient, row: &SubscriptionRow) -> Result<()> {
    if !row.is_active() {
        return Err(ConsoleError::InvalidInput(
            "subscription is already inactive".into(),
        ));
    }
    let path = ["admin", "subscriptions", record_id(row.id())?, "deactivate"];
    client.send(Method::PUT, &path, &serde_json::json!({})).await
}

/// 批量停用：只提交有效订阅的 id，空集合直接拒绝
///
/// # Returns
///
/// 实际提交的 id 列表
pub async fn bulk_deactivate(
    client: &AdminClient,
    rows: &[&SubscriptionRow],
) -> Result<Vec<String>> {
    let ids: Vec<String> = rows
        .iter()
        .filter(|r| r.is_active())
        .map(|r| r.id().to_string())
        .collect();
    if ids.is_empty() {
        return Err(ConsoleError::InvalidInput(
            "no active subscriptions selected".into(),
        ));
    }
    client
        .send(
            Method::PUT,
            &["admin", "subscriptions", "deactivate"],
            &BulkDeactivatePayload { ids: ids.clone() },
        )
        .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn row(id: &str, end: &str) -> SubscriptionRow {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        SubscriptionRow::derive(
            Subscription {
                id: id.into(),
                company_name: "Acme".into(),
                user_email: "ops@acme.io".into(),
                plan_name: "Pro".into(),
                start_date: Some("2026-01-01".into()),
                end_date: Some(end.into()),
                auto_renewal: false,
                canceled_at: None,
            },
            now,
        )
    }

    #[tokio::test]
    async fn deactivating_inactive_subscription_is_rejected_locally() {
        let backend = StubBackend::start().await;
        let expired = row("s1", "2026-02-01");
        assert!(deactivate(&backend.client(), &expired).await.is_err());
        assert!(backend.requests().is_empty());

        let live = row("s2", "2026-06-01");
        deactivate(&backend.client(), &live).await.unwrap();
        assert_eq!(backend.count("PUT", "/admin/subscriptions/s2/deactivate"), 1);
    }

    #[tokio::test]
    async fn bulk_deactivate_sends_only_active_ids() {
        let backend = StubBackend::start().await;
        let a = row("a", "2026-06-01");
        let b = row("b", "2025-06-01");
        let c = row("c", "2027-01-01");
        let sent = bulk_deactivate(&backend.client(), &[&a, &b, &c]).await.unwrap();
        assert_eq!(sent, ["a", "c"]);
        assert_eq!(backend.requests()[0].body, json!({"ids": ["a", "c"]}));

        assert!(bulk_deactivate(&backend.client(), &[&b]).await.is_err());
        assert!(bulk_deactivate(&backend.client(), &[]).await.is_err());
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn assign_validates_before_sending() {
        let backend = StubBackend::start().await;
        let mut payload = AssignSubscriptionPayload {
            email: "ops@acme.io".into(),
            plan_name: "Pro".into(),
            start_date: "2026-03-01".into(),
            end_date: "2026-02-01".into(),
            auto_renewal: true,
        };
        assert!(assign(&backend.client(), &payload).await.is_err());
        payload.end_date = "2026-04-01".into();
        assign(&backend.client(), &payload).await.unwrap();
        assert_eq!(backend.count("POST", "/admin/subscriptions/assign"), 1);
    }

    #[tokio::test]
    async fn empty_update_is_skipped() {
        let backend = StubBackend::start().await;
        let sent = update(&backend.client(), "s1", &UpdateSubscriptionPayload::default())
            .await
            .unwrap();
        assert!(!sent);
        assert!(backend.requests().is_empty());
    }
}
