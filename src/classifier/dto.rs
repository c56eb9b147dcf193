//! 分类服务的数据传输对象（JSON 字段为 camelCase）

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 属性键 -> 显示名
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSchemaDto {
    pub attribute_labels: BTreeMap<String, String>,
}

/// 待分类的消息
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyingMessageDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub text: String,
    #[serde(default)]
    pub generate_answer: bool,
}

impl ClassifyingMessageDto {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierAttributeDto {
    pub name: String,
    pub value: serde_json::Value,
}

/// 分类结果；missing_attributes 与 keywords 的顺序由服务端决定，客户端不依赖顺序语义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedMessageDto {
    pub valid: bool,
    pub attributes: Vec<ClassifierAttributeDto>,
    pub missing_attributes: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub answer: Option<String>,
}
