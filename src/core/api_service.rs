//! 通用 JSON 请求封装
//!
//! 端点路径相对 [api] base_url 拼接；非 2xx、网络错误、响应体解析失败都以 ApiError 返回，不做重试。

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiSection;
use crate::core::ApiError;

/// 单次请求描述：方法、相对端点、可选 JSON 请求体
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub endpoint: String,
    pub data: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            data: None,
        }
    }

    pub fn post<B: Serialize>(endpoint: impl Into<String>, data: &B) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            data: Some(data),
        })
    }
}

/// 持有 reqwest Client 与基础地址
#[derive(Debug, Clone)]
pub struct ApiService {
    client: Client,
    base_url: Url,
}

impl ApiService {
    pub fn new(section: &ApiSection) -> Result<Self, ApiError> {
        let mut base = section.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// 发送请求并把响应体解析为 T
    pub async fn fetch<T: DeserializeOwned>(&self, request: FetchRequest) -> Result<T, ApiError> {
        let url = self.endpoint_url(&request.endpoint)?;
        tracing::debug!(method = %request.method, %url, "api request");

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                endpoint = %request.endpoint,
                "api request failed"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
