use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 后端返回非 2xx，message 优先取后端提供的文案
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Time parse error: {0}")]
    TimeParse(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// 会话失效类错误：需要清理本地会话缓存并回到登录页
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ConsoleError::Api { status, .. } => Some(*status),
            ConsoleError::Unauthorized(_) => Some(401),
            ConsoleError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
