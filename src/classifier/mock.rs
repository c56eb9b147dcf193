//! Mock 分类客户端（后端不可用时使用，无需网络）
//!
//! classify 固定返回一组关键词；schema 直接取内置属性表。

use async_trait::async_trait;

use crate::classifier::dto::{ClassificationSchemaDto, ClassifiedMessageDto, ClassifyingMessageDto};
use crate::classifier::schema::attribute_labels;
use crate::classifier::ClassifierApi;
use crate::core::ApiError;

const MOCK_KEYWORDS: &[&str] = &[
    "Ремонт",
    "Apple, Asus",
    "Ноутбук",
    "X1704ZA-AU342",
    "12345, 12345-345-234",
];

#[derive(Debug, Default)]
pub struct MockClassifierApi;

#[async_trait]
impl ClassifierApi for MockClassifierApi {
    async fn get_classification_schema(&self) -> Result<ClassificationSchemaDto, ApiError> {
        Ok(ClassificationSchemaDto {
            attribute_labels: attribute_labels(),
        })
    }

    async fn classify(
        &self,
        _request: &ClassifyingMessageDto,
    ) -> Result<ClassifiedMessageDto, ApiError> {
        Ok(ClassifiedMessageDto {
            valid: false,
            attributes: Vec::new(),
            missing_attributes: Vec::new(),
            keywords: MOCK_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            answer: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_classify_returns_canned_keywords() {
        let api = MockClassifierApi;
        let result = api
            .classify(&ClassifyingMessageDto::new("t"))
            .await
            .unwrap();
        assert!(!result.valid);
        assert!(result.attributes.is_empty());
        assert!(result.missing_attributes.is_empty());
        assert_eq!(
            result.keywords,
            vec!["Ремонт", "Apple, Asus", "Ноутбук", "X1704ZA-AU342", "12345, 12345-345-234"]
        );
        assert!(result.answer.is_none());
    }

    #[tokio::test]
    async fn test_mock_schema_lists_builtin_attributes() {
        let schema = MockClassifierApi.get_classification_schema().await.unwrap();
        assert_eq!(schema.attribute_labels.len(), 3);
        assert_eq!(schema.attribute_labels["equipment_type"], "Тип оборудования");
    }
}
