//! 后端 REST API 访问层
//!
//! 所有数据请求都经由显式传入的 [`AdminClient`]（HTTP 客户端 + 会话）发出。

pub mod auth;
pub mod companies;
pub mod contacts;
pub mod emails;
pub mod notifications;
pub mod payments;
pub mod plans;
pub mod subscriptions;
pub mod tickets;

#[cfg(test)]
pub(crate) mod stub;

use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ConsoleError, Result};
use crate::http_client::client_for_url_with_timeout;
use crate::session::Session;

/// 未登录的 API 客户端，只负责拼接地址与发送请求
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ConsoleError::Config(format!("invalid api base url {}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "api base url cannot carry a path: {}",
                cfg.base_url
            )));
        }
        let http = client_for_url_with_timeout(base_url.as_str(), Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// 在基础地址后逐段追加路径；每段单独编码，id 中的 `/` 不会拆出新路径
    ///
    /// # Arguments
    ///
    /// * `path` - 路径段，例如 `["admin", "plans", id, "price"]`
    pub(crate) fn url(&self, path: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config(format!("api base url cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    /// 发送请求并返回响应文本
    ///
    /// 带令牌的请求遇到 401/403 时返回 [`ConsoleError::Unauthorized`]，
    /// 其它非 2xx 响应转成 [`ConsoleError::Api`]
    async fn execute(
        &self,
        method: Method,
        path: &[&str],
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<String> {
        let url = self.url(path)?;
        let path = url.path().to_string();
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut req = self
            .http
            .request(method.clone(), url)
            .header("X-Request-Id", &request_id);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(%method, %path, request_id = %request_id, error = %e, "request failed");
                return Err(e.into());
            }
        };
        let status = resp.status();
        let text = resp.text().await?;
        tracing::info!(
            %method,
            %path,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api request"
        );

        if status.is_success() {
            return Ok(text);
        }
        let message = extract_error(status, &text);
        if token.is_some() && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ConsoleError::Unauthorized(message));
        }
        Err(ConsoleError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// 已登录的管理员客户端
#[derive(Debug, Clone)]
pub struct AdminClient {
    api: ApiClient,
    session: Session,
}

impl AdminClient {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    async fn call(&self, method: Method, path: &[&str], body: Option<Value>) -> Result<String> {
        self.api
            .execute(method, path, Some(&self.session.token), body)
            .await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let text = self.call(Method::GET, path, None).await?;
        decode(&text)
    }

    /// 发送带 JSON 请求体的修改请求，忽略响应体
    pub(crate) async fn send<B: Serialize>(&self, method: Method, path: &[&str], body: &B) -> Result<()> {
        let body = serde_json::to_value(body)?;
        self.call(method, path, Some(body)).await?;
        Ok(())
    }

    /// 发送修改请求并解析响应体
    pub(crate) async fn send_for<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let text = self.call(method, path, Some(body)).await?;
        decode(&text)
    }

    pub(crate) async fn delete(&self, path: &[&str]) -> Result<()> {
        self.call(Method::DELETE, path, None).await?;
        Ok(())
    }
}

/// 提取和格式化 API 错误信息
///
/// 优先使用后端返回 JSON 中的 `message` / `error` 字段
///
/// # Arguments
///
/// * `status` - HTTP 状态码
/// * `text` - 响应主体内容
pub(crate) fn extract_error(status: StatusCode, text: &str) -> String {
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = body.get(key) {
                if !msg.trim().is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    format!("HTTP {}: {}", status, text)
}

/// 列表接口可能直接返回数组，也可能包一层 `{ "data": ... }`
pub(crate) fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text)?
    };
    Ok(serde_json::from_value(unwrap_data(value))?)
}

/// 检查记录 id 非空，返回去掉首尾空白后的 id
pub(crate) fn record_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ConsoleError::InvalidInput("record id is empty".into()));
    }
    Ok(id)
}
