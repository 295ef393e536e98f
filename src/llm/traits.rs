//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：给定完整 prompt 与生成参数，返回原始文本。
//! 返回的文本一律视为不可信，由 output 层负责提取、修复与校验。

use async_trait::async_trait;
use thiserror::Error;

use crate::agents::AgentConfiguration;

/// LLM 后端错误（网络、超时、限流、空回复等）；上层不重试，直接作为 AgentError::Unexpected 上抛
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Client config error: {0}")]
    Config(String),
}

/// LLM 客户端 trait：prompt 进，文本出
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 按 Agent 配置（模型、温度、最大输出）完成一次生成
    async fn generate(
        &self,
        prompt: &str,
        config: &AgentConfiguration,
    ) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
