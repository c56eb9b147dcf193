//! 结构化请求：从 LLM 的自由文本回复中找出 JSON 并解析为目标类型，失败时按 RetryConfig 重试

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::LlmSection;
use crate::llm::{LlmClient, LlmError, Message};

/// 重试策略：最多 attempts 次，失败之间等待 delay
///
/// 单次请求超过 request_timeout 视为失败
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmSection> for RetryConfig {
    fn from(section: &LlmSection) -> Self {
        Self {
            attempts: section.attempts.max(1),
            delay: Duration::from_millis(section.retry_delay_ms),
            request_timeout: Duration::from_secs(section.timeouts.request),
        }
    }
}

/// 从 `start`（指向 `{`）截取与之配对的完整对象。
///
/// 字符串字面量内的原始控制字符（LLM 常直接输出换行、制表符）转义后再交给 serde_json。
/// 括号不配对时返回 None；返回值为 (转义后的对象文本, 原文中对象结束的字节位置)
fn balanced_object(text: &str, start: usize) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    out.push(c);
                }
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => out.push(c),
            }
            continue;
        }

        out.push(c);
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((out, start + offset + c.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

/// 扫描文本中所有以 `{` 开头的合法 JSON 对象；解析失败的位置跳过一个字节继续
pub fn extract_json_from_text(text: &str) -> Vec<Value> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find('{') {
        let start = pos + rel;
        let parsed = balanced_object(text, start).and_then(|(object, end)| {
            let value = serde_json::from_str::<Value>(&object).ok()?;
            Some((value, end))
        });
        match parsed {
            Some((value, end)) => {
                found.push(value);
                pos = end;
            }
            None => pos = start + 1,
        }
    }
    found
}

/// 取第一个能反序列化为 T 的 JSON
pub fn parse_llm_response_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let candidates = extract_json_from_text(text);
    if candidates.is_empty() {
        return Err(LlmError::NoJson);
    }

    candidates
        .into_iter()
        .find_map(|value| serde_json::from_value(value).ok())
        .ok_or(LlmError::SchemaMismatch)
}

/// 发送对话并解析结构化结果；请求失败与解析失败同样计入重试
pub async fn structured_chat<T: DeserializeOwned>(
    client: &dyn LlmClient,
    messages: &[Message],
    retry: &RetryConfig,
) -> Result<T, LlmError> {
    let attempts = retry.attempts.max(1);
    let mut last = LlmError::EmptyResponse;

    for attempt in 1..=attempts {
        let reply = tokio::time::timeout(retry.request_timeout, client.complete(messages)).await;
        let result = match reply {
            Ok(Ok(text)) => parse_llm_response_json(&text),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LlmError::Request(format!(
                "timed out after {}s",
                retry.request_timeout.as_secs()
            ))),
        };
        match result {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Request to LLM attempt failed");
                last = e;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(retry.delay).await;
        }
    }

    Err(LlmError::Exhausted {
        attempts,
        last: Box::new(last),
    })
}
