//! 测试用的进程内后端：记录收到的请求，按 (method, path) 返回预设响应

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde_json::{Value, json};

use super::{AdminClient, ApiClient};
use crate::config::ApiConfig;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
struct Shared {
    log: Mutex<Vec<Recorded>>,
    routes: Mutex<HashMap<(String, String), (u16, Value)>>,
}

pub struct StubBackend {
    pub base_url: String,
    shared: Arc<Shared>,
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, axum::Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let record = Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        authorization: header("authorization"),
        request_id: header("x-request-id"),
    };
    let key = (record.method.clone(), record.path.clone());
    shared.log.lock().unwrap().push(record);
    let (status, body) = shared
        .routes
        .lock()
        .unwrap()
        .get(&key)
        .cloned()
        .unwrap_or((200, json!({"message": "ok"})));
    (StatusCode::from_u16(status).unwrap(), axum::Json(body))
}

impl StubBackend {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            shared,
        }
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.shared
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
        }
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).unwrap()
    }

    pub fn client(&self) -> AdminClient {
        AdminClient::new(self.api(), Session::new("test-token", None))
    }
}
