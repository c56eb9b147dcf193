//! 分类客户端集成测试
//!
//! 用 wiremock 启动假后端，覆盖 URL 拼接、请求体字段名、状态码与解析错误。

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use triage::classifier::{ClassifierApi, ClassifyingMessageDto, HttpClassifierApi};
use triage::config::{ApiSection, AppConfig};
use triage::core::{ApiError, ApiService, App, Injector};
use triage::router::{RouteName, ViewKind};

fn client(server: &MockServer) -> HttpClassifierApi {
    let section = ApiSection {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
    };
    HttpClassifierApi::new(Arc::new(ApiService::new(&section).unwrap()))
}

#[tokio::test]
async fn test_get_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/classifier/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attributeLabels": {
                "equipment_type": "Тип оборудования",
                "serial_number": "Серийный номер"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let schema = client(&server).get_classification_schema().await.unwrap();
    assert_eq!(schema.attribute_labels.len(), 2);
    assert_eq!(schema.attribute_labels["serial_number"], "Серийный номер");
}

#[tokio::test]
async fn test_classify_posts_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classifier/classify"))
        .and(body_json(json!({
            "name": "Иван",
            "text": "Не работает клавиатура",
            "generateAnswer": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "attributes": [
                { "name": "failure_point", "value": "Клавиатура" },
                { "name": "serial_number", "value": null }
            ],
            "missingAttributes": ["serial_number"],
            "keywords": ["Клавиатура"],
            "answer": "Уточните серийный номер"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ClassifyingMessageDto {
        name: Some("Иван".into()),
        topic: None,
        text: "Не работает клавиатура".into(),
        generate_answer: true,
    };
    let result = client(&server).classify(&request).await.unwrap();
    assert!(!result.valid);
    assert_eq!(result.attributes.len(), 2);
    assert!(result.attributes[1].value.is_null());
    assert_eq!(result.missing_attributes, vec!["serial_number"]);
    assert_eq!(result.answer.as_deref(), Some("Уточните серийный номер"));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classifier/classify"))
        .respond_with(ResponseTemplate::new(502).set_body_string(r#"{"detail":"llm down"}"#))
        .mount(&server)
        .await;

    let err = client(&server)
        .classify(&ClassifyingMessageDto::new("t"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    match err {
        ApiError::Status { body, .. } => assert!(body.contains("llm down")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/classifier/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).get_classification_schema().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_app_mounts_classifier_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/classifier/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "attributeLabels": {} })))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.api.base_url = format!("{}/api/", server.uri());
    let app = App::new(Injector::from_config(config).unwrap());
    assert!(app.store.is_loading());

    let navigation = app.router.navigate("/").await.unwrap();
    assert_eq!(navigation.name, Some(RouteName::Main));
    assert_eq!(navigation.path, "/classifier");
    assert_eq!(navigation.view(), Some(ViewKind::ClassifierPage));
    assert!(!app.store.is_loading());

    let schema = app.injector.classifier.get_classification_schema().await.unwrap();
    assert!(schema.attribute_labels.is_empty());
}
