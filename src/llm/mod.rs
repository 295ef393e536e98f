//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//!
//! DeepSeek 走 OpenAI 兼容协议，只是固定 base_url 与默认模型，因此不单独建客户端类型。

pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;
use crate::core::AgentError;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

/// 依次取第一个存在的环境变量
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| std::env::var(k).ok())
}

/// 显式参数 > DEEPSEEK_MODEL > deepseek-chat
fn deepseek_model(explicit: Option<&str>, from_env: Option<String>) -> String {
    explicit
        .map(String::from)
        .or(from_env)
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string())
}

/// DeepSeek 端点上的 OpenAI 兼容客户端；Key 取 DEEPSEEK_API_KEY，其次 OPENAI_API_KEY
pub fn create_deepseek_client(model: Option<&str>) -> OpenAiClient {
    let api_key = first_env(&["DEEPSEEK_API_KEY", "OPENAI_API_KEY"]);
    let model = deepseek_model(model, first_env(&["DEEPSEEK_MODEL"]));
    OpenAiClient::new(Some(DEEPSEEK_BASE_URL), &model, api_key.as_deref())
}

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容）
///
/// 有 DEEPSEEK_API_KEY，或 provider=deepseek 且只有 OPENAI_API_KEY 时走 DeepSeek 端点；
/// 否则有 OPENAI_API_KEY 时走 OpenAI 兼容端点（可配 base_url）；两者皆无则报配置错误。
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, AgentError> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();
    let use_deepseek = has_deepseek_key || (provider == "deepseek" && has_openai_key);
    let use_openai = has_openai_key && provider != "deepseek";
    let timeout = cfg.llm.timeouts.request;

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        tracing::info!("Using DeepSeek LLM ({})", model);
        Ok(Arc::new(
            create_deepseek_client(Some(&model)).with_request_timeout(timeout),
        ))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        tracing::info!("Using OpenAI LLM ({})", model);
        Ok(Arc::new(
            OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, None)
                .with_request_timeout(timeout),
        ))
    } else {
        Err(AgentError::ConfigError(
            "no LLM API key found (set DEEPSEEK_API_KEY or OPENAI_API_KEY)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_model_precedence() {
        assert_eq!(
            deepseek_model(Some(DEEPSEEK_REASONER), Some("from-env".to_string())),
            DEEPSEEK_REASONER
        );
        assert_eq!(deepseek_model(None, Some("from-env".to_string())), "from-env");
        assert_eq!(deepseek_model(None, None), DEEPSEEK_CHAT);
    }

    #[test]
    fn test_first_env_skips_missing() {
        assert_eq!(first_env(&["TUTOR_TEST_SURELY_UNSET_VAR"]), None);
    }
}
