use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::Result;
use crate::models::plan::ContactFlagPayload;
use crate::models::{AddOn, AddOnPayload, PlanUpdate, SubscriptionPlan};

pub async fn list(client: &AdminClient) -> Result<Vec<SubscriptionPlan>> {
    client.get(&["admin", "plans"]).await
}

/// 提交已暂存的价格/额度修改；空修改不发请求
///
/// # Returns
///
/// * `Ok(true)` - 已提交
/// * `Ok(false)` - 没有暂存内容
pub async fn update_price(client: &AdminClient, id: &str, update: &PlanUpdate) -> Result<bool> {
    if update.is_empty() {
        return Ok(false);
    }
    let path = ["admin", "plans", record_id(id)?, "price"];
    client.send(Method::PUT, &path, update).await?;
    Ok(true)
}

/// 切换“联系销售”标记
pub async fn set_contact(client: &AdminClient, id: &str, is_contact: bool) -> Result<()> {
    let path = ["admin", "plans", record_id(id)?, "contact"];
    client
        .send(Method::PUT, &path, &ContactFlagPayload { is_contact })
        .await
}

pub async fn list_addons(client: &AdminClient) -> Result<Vec<AddOn>> {
    client.get(&["admin", "addons"]).await
}

/// 新建增值包；后端返回新记录
pub async fn create_addon(client: &AdminClient, payload: &AddOnPayload) -> Result<AddOn> {
    payload.validate()?;
    client.send_for(Method::POST, &["admin", "addons"], payload).await
}

pub async fn update_addon(client: &AdminClient, id: &str, payload: &AddOnPayload) -> Result<()> {
    payload.validate()?;
    let path = ["admin", "addons", record_id(id)?];
    client.send(Method::PUT, &path, payload).await
}

pub async fn delete_addon(client: &AdminClient, id: &str) -> Result<()> {
    let path = ["admin", "addons", record_id(id)?];
    client.delete(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use serde_json::json;

    #[tokio::test]
    async fn price_update_carries_only_staged_fields() {
        let backend = StubBackend::start().await;
        let update = PlanUpdate {
            yearly_price: Some(290.0),
            max_editors: Some(10),
            ..Default::default()
        };
        assert!(update_price(&backend.client(), "p1", &update).await.unwrap());
        assert_eq!(
            backend.requests()[0].body,
            json!({"yearlyPrice": 290.0, "maxEditors": 10})
        );
        assert!(!update_price(&backend.client(), "p1", &PlanUpdate::default()).await.unwrap());
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn create_addon_decodes_returned_record() {
        let backend = StubBackend::start().await;
        backend.respond(
            "POST",
            "/admin/addons",
            201,
            json!({"data": {"_id": "a9", "name": "Extra viewers", "quantity": 5, "price": "15"}}),
        );
        let payload = AddOnPayload {
            name: "Extra viewers".into(),
            description: String::new(),
            quantity: 5,
            price: 15.0,
            popular: false,
        };
        let created = create_addon(&backend.client(), &payload).await.unwrap();
        assert_eq!(created.id, "a9");
        assert_eq!(created.price, 15.0);
    }

    #[tokio::test]
    async fn delete_addon_uses_delete_verb() {
        let backend = StubBackend::start().await;
        delete_addon(&backend.client(), "a9").await.unwrap();
        assert_eq!(backend.count("DELETE", "/admin/addons/a9"), 1);
    }
}
