//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）及结构化请求

pub mod deepseek;
pub mod mock;
pub mod openai;
pub mod structured;
pub mod traits;

use std::sync::Arc;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use structured::{extract_json_from_text, parse_llm_response_json, structured_chat, RetryConfig};
pub use traits::{LlmClient, LlmError, Message, Role};

use crate::config::LlmSection;

/// 按 [llm] provider 创建客户端；未知 provider 回退到 OpenAI 兼容客户端
pub fn create_llm_client(section: &LlmSection) -> Arc<dyn LlmClient> {
    match section.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::info!("Using mock LLM client");
            Arc::new(MockLlmClient::new())
        }
        "deepseek" => Arc::new(create_deepseek_client(
            Some(section.model.as_str()),
            section.base_url.as_deref(),
        )),
        other => {
            if other != "openai" {
                tracing::warn!(provider = other, "Unknown LLM provider, falling back to openai");
            }
            Arc::new(OpenAiClient::new(
                section.base_url.as_deref(),
                &section.model,
                None,
            ))
        }
    }
}
