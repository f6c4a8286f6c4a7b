use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminClient, ApiClient, decode};
use crate::error::{ConsoleError, Result};
use crate::models::lenient;
use crate::session::Session;

/// 登录请求参数
#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

/// 登录响应数据
#[derive(Debug, Deserialize)]
struct LoginResp {
    #[serde(alias = "accessToken")]
    token: String,
    #[serde(default, alias = "expiresAt", deserialize_with = "lenient::opt_timestamp")]
    expires_at: Option<String>,
}

/// 管理员邮箱密码登录
///
/// # Arguments
///
/// * `api` - 未登录的 API 客户端
/// * `email` - 管理员邮箱
/// * `password` - 密码
///
/// # Returns
///
/// * `Ok(AdminClient)` - 携带新会话的客户端
/// * `Err(ConsoleError)` - 登录失败，错误信息优先取后端文案
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<AdminClient> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ConsoleError::InvalidInput(
            "email and password are required".into(),
        ));
    }
    let body = serde_json::to_value(LoginPayload { email, password })?;
    let text = api
        .execute(Method::POST, &["auth", "admin", "login"], None, Some(body))
        .await?;
    let resp: LoginResp = decode(&text)?;
    if resp.token.trim().is_empty() {
        return Err(ConsoleError::Unauthorized("empty token in login response".into()));
    }
    tracing::info!(email, "admin login succeeded");
    Ok(AdminClient::new(
        api.clone(),
        Session::new(resp.token, resp.expires_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use serde_json::json;

    #[tokio::test]
    async fn login_returns_client_with_session() {
        let backend = StubBackend::start().await;
        backend.respond(
            "POST",
            "/auth/admin/login",
            200,
            json!({"data": {"token": "abc", "expiresAt": "2030-01-01T00:00:00Z"}}),
        );
        let client = login(&backend.api(), "admin@x.io", "pw").await.unwrap();
        assert_eq!(client.session().token, "abc");
        assert_eq!(client.session().expires_at.as_deref(), Some("2030-01-01T00:00:00Z"));
        let reqs = backend.requests();
        assert_eq!(reqs[0].body, json!({"email": "admin@x.io", "password": "pw"}));
        assert!(reqs[0].authorization.is_none());
    }

    #[tokio::test]
    async fn numeric_expiry_is_accepted() {
        let backend = StubBackend::start().await;
        backend.respond(
            "POST",
            "/auth/admin/login",
            200,
            json!({"token": "abc", "expiresAt": 1893456000000_i64}),
        );
        let client = login(&backend.api(), "admin@x.io", "pw").await.unwrap();
        let expected = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(client.session().expires_at(), Some(expected));
    }

    #[tokio::test]
    async fn bad_credentials_surface_backend_message() {
        let backend = StubBackend::start().await;
        backend.respond(
            "POST",
            "/auth/admin/login",
            401,
            json!({"message": "Invalid credentials"}),
        );
        let err = login(&backend.api(), "admin@x.io", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn empty_fields_never_reach_the_network() {
        let backend = StubBackend::start().await;
        assert!(login(&backend.api(), " ", "pw").await.is_err());
        assert!(backend.requests().is_empty());
    }
}
