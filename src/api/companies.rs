use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::Result;
use crate::models::Company;
use crate::models::company::BlockPayload;

/// 获取全部注册公司
pub async fn list(client: &AdminClient) -> Result<Vec<Company>> {
    client.get(&["admin", "companies"]).await
}

/// 设置公司的封禁状态
///
/// # Arguments
///
/// * `client` - 管理员客户端
/// * `id` - 公司 id
/// * `blocked` - 新的封禁状态
pub async fn set_blocked(client: &AdminClient, id: &str, blocked: bool) -> Result<()> {
    let path = ["admin", "companies", record_id(id)?, "block"];
    client.send(Method::PUT, &path, &BlockPayload { blocked }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use serde_json::json;

    #[tokio::test]
    async fn list_accepts_wrapped_payload() {
        let backend = StubBackend::start().await;
        backend.respond(
            "GET",
            "/admin/companies",
            200,
            json!({"data": [{"_id": "c1", "companyName": "Acme", "isBlocked": false}]}),
        );
        let companies = list(&backend.client()).await.unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].company_name, "Acme");
    }

    #[tokio::test]
    async fn toggling_block_sends_exactly_one_put() {
        let backend = StubBackend::start().await;
        set_blocked(&backend.client(), "c1", true).await.unwrap();
        assert_eq!(backend.count("PUT", "/admin/companies/c1/block"), 1);
        assert_eq!(backend.requests()[0].body, json!({"blocked": true}));
    }
}
