//! 客户端错误类型
//!
//! API 调用的错误不在本地恢复：原样返回给调用方（视图），由视图通过 PageStore::notify_exception 展示为通知。

use thiserror::Error;

/// 传输层错误（网络、非 2xx 状态、响应体无法解析、地址非法）
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// 非 2xx 时的状态码
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 路由错误
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("No route matches path '{0}'")]
    NotFound(String),

    #[error("Unknown route name: {0}")]
    UnknownName(String),

    #[error("Redirect loop while resolving '{0}'")]
    RedirectLoop(String),

    #[error("Failed to load view for '{path}': {reason}")]
    ViewLoad { path: String, reason: String },
}
