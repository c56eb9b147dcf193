//! 分类服务 HTTP 接口（axum）
//!
//! - GET  {base}/                     版本
//! - GET  {base}/classifier/schema    属性显示名
//! - POST {base}/classifier/classify  分类

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::classifier::{
    ClassificationSchemaDto, ClassifiedMessageDto, ClassifierError, ClassifierService,
    ClassifyingMessageDto,
};

pub const VERSION: &str = "1.0.0";

impl IntoResponse for ClassifierError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClassifierError::Llm(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// 创建路由；base_path 为空或 "/" 时挂在根路径，`api`、`/api/` 都按 `/api` 处理
pub fn create_router(service: Arc<ClassifierService>, base_path: &str) -> Router {
    let api = Router::new()
        .route("/", get(version))
        .route("/classifier/schema", get(schema))
        .route("/classifier/classify", post(classify))
        .with_state(service);

    let base = base_path.trim_matches('/');
    if base.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{base}"), api)
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({ "version": VERSION }))
}

async fn schema(State(service): State<Arc<ClassifierService>>) -> Json<ClassificationSchemaDto> {
    Json(service.get_schema())
}

async fn classify(
    State(service): State<Arc<ClassifierService>>,
    Json(body): Json<ClassifyingMessageDto>,
) -> Result<Json<ClassifiedMessageDto>, ClassifierError> {
    let result = service.classify(&body).await.map_err(|e| {
        tracing::error!(error = %e, "classification failed");
        e
    })?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient, RetryConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(llm: MockLlmClient) -> Router {
        let retry = RetryConfig {
            attempts: 1,
            ..RetryConfig::default()
        };
        create_router(Arc::new(ClassifierService::new(Arc::new(llm), retry)), "/api")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_version_and_schema() {
        let router = app(MockLlmClient::new());
        let response = router
            .clone()
            .oneshot(Request::get("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["version"], VERSION);

        let response = router
            .oneshot(Request::get("/api/classifier/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["attributeLabels"]["serial_number"], "Серийный номер");
    }

    #[tokio::test]
    async fn test_base_path_without_slashes_is_normalized() {
        for base in ["api", "api/", "/api/"] {
            let service = Arc::new(ClassifierService::new(
                Arc::new(MockLlmClient::new()),
                RetryConfig::default(),
            ));
            let response = create_router(service, base)
                .oneshot(Request::get("/api/classifier/schema").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "base path {base:?}");
        }
    }

    #[tokio::test]
    async fn test_empty_base_path_mounts_at_root() {
        let service = Arc::new(ClassifierService::new(
            Arc::new(MockLlmClient::new()),
            RetryConfig::default(),
        ));
        let response = create_router(service, "/")
            .oneshot(Request::get("/classifier/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let router = app(MockLlmClient::new());
        let request = Request::post("/api/classifier/classify")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"text": "Сломалась клавиатура", "generateAnswer": true}"#,
            ))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["missingAttributes"], json!(["serial_number"]));
        assert_eq!(body["keywords"], json!(["Ноутбук", "Клавиатура"]));
        assert!(body["answer"].as_str().unwrap().contains("- Серийный номер"));
    }

    #[tokio::test]
    async fn test_llm_failure_maps_to_bad_gateway() {
        let router = app(MockLlmClient::scripted(vec![Err(LlmError::Request("down".into()))]));
        let request = Request::post("/api/classifier/classify")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "t"}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["detail"]
            .as_str()
            .unwrap()
            .contains("down"));
    }
}
