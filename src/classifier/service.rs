//! 分类服务（服务端）
//!
//! 流程：规范化用户输入 → 按属性表构造提示词 → LLM 结构化抽取 → 去空值 → 按属性表校验与转换 →
//! 缺少属性且请求要求时生成回复草稿。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::classifier::dto::{
    ClassificationSchemaDto, ClassifiedMessageDto, ClassifierAttributeDto, ClassifyingMessageDto,
};
use crate::classifier::schema::{attribute_labels, translit, SCHEMA_ATTRIBUTES};
use crate::llm::{structured_chat, LlmClient, LlmError, Message, RetryConfig};

pub const MAX_TEXT_LEN: usize = 2048;
pub const MAX_TOPIC_LEN: usize = 512;
pub const MAX_NAME_LEN: usize = 64;

static SPACES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \u{00A0}\t]{2,}").expect("valid regex"));
static DASHES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

const SYSTEM_PROMPT: &str =
    "You are an assistant in the help desk of a company that manufactures micro electronics devices";

const RESPONSE_JSON_FORMAT: &str = r#"
{
  "attributes": {
    "attribute_name_1": "attribute_1_value",
    "attribute_name_2": "attribute_2_value"
    ...
  }
}
"#;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// LLM 返回的属性（保持 LLM 输出的键顺序）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmClassificationResponse {
    #[serde(deserialize_with = "ordered_attributes")]
    pub attributes: Vec<(String, Option<String>)>,
}

fn ordered_attributes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, Option<String>)>, D::Error> {
    let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::Null => Ok((key, None)),
            serde_json::Value::String(s) => Ok((key, Some(s))),
            other => Err(D::Error::custom(format!(
                "attribute '{key}' must be a string or null, got {other}"
            ))),
        })
        .collect()
}

impl LlmClassificationResponse {
    fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    fn contains(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }
}

/// 校验结果：valid_attributes 按属性表顺序，缺失的属性值为占位值或 None
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub missing_attributes: Vec<String>,
    pub valid_attributes: Vec<(String, Option<String>)>,
}

pub struct ClassifierService {
    llm: Arc<dyn LlmClient>,
    retry: RetryConfig,
}

impl ClassifierService {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryConfig) -> Self {
        Self { llm, retry }
    }

    pub fn get_schema(&self) -> ClassificationSchemaDto {
        ClassificationSchemaDto {
            attribute_labels: attribute_labels(),
        }
    }

    pub async fn classify(
        &self,
        body: &ClassifyingMessageDto,
    ) -> Result<ClassifiedMessageDto, ClassifierError> {
        let topic = normalize_user_str(body.topic.as_deref(), MAX_TOPIC_LEN, "Topic");
        let text = normalize_user_str(Some(&body.text), MAX_TEXT_LEN, "Text");
        let customer_name = normalize_user_str(body.name.as_deref(), MAX_NAME_LEN, "Name");

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(&topic, &text)),
        ];

        let result: LlmClassificationResponse =
            structured_chat(self.llm.as_ref(), &messages, &self.retry).await?;
        let result = normalize_classification_result(result);
        let validation = validate_classification_result(&result);

        let (prompt_tokens, completion_tokens, total_tokens) = self.llm.token_usage();
        tracing::info!(
            valid = validation.valid,
            missing = ?validation.missing_attributes,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "message classified"
        );

        let answer = (!validation.valid && body.generate_answer)
            .then(|| generate_answer(&customer_name, &validation));

        let attributes = validation
            .valid_attributes
            .iter()
            .filter(|(name, _)| !validation.missing_attributes.contains(name))
            .map(|(name, value)| ClassifierAttributeDto {
                name: name.clone(),
                value: serde_json::Value::String(normalize_attr_value(value.as_deref())),
            })
            .collect();

        let keywords = result
            .attributes
            .iter()
            .filter_map(|(_, value)| value.clone())
            .collect();

        Ok(ClassifiedMessageDto {
            valid: validation.valid,
            attributes,
            missing_attributes: validation.missing_attributes,
            keywords,
            answer,
        })
    }
}

/// 折叠连续空白与连字符，超长截断（按字符），去首尾空白；None 视为空串
pub fn normalize_user_str(raw: Option<&str>, max_len: usize, title: &str) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let value = SPACES_REGEX.replace_all(raw, " ");
    let value = DASHES_REGEX.replace_all(&value, "-");

    let value: String = if value.chars().count() > max_len {
        tracing::warn!(title, max_len, "user input is longer than allowed, truncating");
        value.chars().take(max_len).collect()
    } else {
        value.into_owned()
    };

    value.trim().to_string()
}

pub fn build_user_prompt(topic: &str, text: &str) -> String {
    let attributes_schema = SCHEMA_ATTRIBUTES
        .iter()
        .map(|attr| {
            let mut line = format!("Attribute with name '{}'.", attr.name);
            if let Some(hint) = attr.hint {
                line.push(' ');
                line.push_str(hint);
            }
            if attr.is_enum {
                line.push_str(" Exact list of possible attribute values: ");
            } else {
                line.push_str(" Example list of some of attribute values: ");
            }
            line.push_str(&attr.examples.join(", "));
            line.push('.');
            line
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"
Below there is a text in Russian between tag BEGIN:MESSAGE and END:MESSAGE.
Also below there is topic of that text between tag BEGIN:TOPIC and END:TOPIC.
You have to try to extract from that text as much as possible attributes by the following schema:

{attributes_schema}

Use the following JSON format to output found attributes:

{RESPONSE_JSON_FORMAT}

Attribute must have first value if there are many suitable values. Set null for attributes with no value.

BEGIN:TOPIC
{topic}
END:TOPIC

BEGIN:MESSAGE
{text}
END:MESSAGE
"#
    )
}

/// 去掉 null 与空串
pub fn normalize_classification_result(
    mut data: LlmClassificationResponse,
) -> LlmClassificationResponse {
    data.attributes
        .retain(|(_, value)| value.as_deref().is_some_and(|v| !v.is_empty()));
    data
}

pub fn validate_classification_result(data: &LlmClassificationResponse) -> ValidationResult {
    let mut missing_attributes = Vec::new();
    let mut valid_attributes = Vec::new();

    for attr in SCHEMA_ATTRIBUTES {
        let mut value = if data.contains(attr.name) {
            data.get(attr.name).map(str::to_string)
        } else {
            missing_attributes.push(attr.name.to_string());
            None
        };

        if let Some(v) = value.as_mut().filter(|v| !v.is_empty()) {
            if attr.upper_case {
                *v = v.to_uppercase();
            }
            if attr.convert_latin {
                *v = translit(v);
            }
        }

        if value.is_none() {
            value = attr.empty_placeholder.map(str::to_string);
        }

        valid_attributes.push((attr.name.to_string(), value));
    }

    ValidationResult {
        valid: missing_attributes.is_empty(),
        missing_attributes,
        valid_attributes,
    }
}

/// 回复草稿：按姓名问候并列出缺失属性的显示名
pub fn generate_answer(name: &str, validation: &ValidationResult) -> String {
    let greeting = if name.is_empty() {
        "Здравствуйте!".to_string()
    } else {
        format!("Здравствуйте, {name}!")
    };

    let missing = SCHEMA_ATTRIBUTES
        .iter()
        .filter(|attr| validation.missing_attributes.iter().any(|m| m == attr.name))
        .map(|attr| format!("- {}", attr.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{greeting}
Спасибо, что обратились в нашу службу поддержки! Чтобы мы могли максимально эффективно и оперативно помочь вам с вашей проблемой, нам потребуется дополнительная информация.

Пожалуйста, укажите следующие данные:
{missing}

Как только мы получим эти данные, наши специалисты смогут более точно диагностировать проблему и предложить возможные решения.

Спасибо за сотрудничество!
"
    )
}

fn normalize_attr_value(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
