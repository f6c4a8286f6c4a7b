use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::Result;
use crate::models::contact::{ContactStatusPayload, sort_open_first};
use crate::models::{ContactRequest, ContactStatus};

/// 获取联系请求，Open 在前
pub async fn list(client: &AdminClient) -> Result<Vec<ContactRequest>> {
    let mut items: Vec<ContactRequest> = client.get(&["admin", "contact-requests"]).await?;
    sort_open_first(&mut items);
    Ok(items)
}

pub async fn set_status(client: &AdminClient, id: &str, status: ContactStatus) -> Result<()> {
    let path = ["admin", "contact-requests", record_id(id)?];
    client
        .send(Method::PUT, &path, &ContactStatusPayload { status })
        .await
}

pub async fn delete(client: &AdminClient, id: &str) -> Result<()> {
    let path = ["admin", "contact-requests", record_id(id)?];
    client.delete(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use serde_json::json;

    #[tokio::test]
    async fn list_is_sorted_open_first() {
        let backend = StubBackend::start().await;
        backend.respond(
            "GET",
            "/admin/contact-requests",
            200,
            json!([
                {"_id": "1", "status": "Connected"},
                {"_id": "2", "status": "Pending"}
            ]),
        );
        let items = list(&backend.client()).await.unwrap();
        assert_eq!(items[0].id, "2");
        assert_eq!(items[1].status, ContactStatus::Connected);
    }

    #[tokio::test]
    async fn status_update_uses_wire_name() {
        let backend = StubBackend::start().await;
        set_status(&backend.client(), "1", ContactStatus::Connected)
            .await
            .unwrap();
        assert_eq!(backend.requests()[0].body, json!({"status": "Connected"}));
    }
}
