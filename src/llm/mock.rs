//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 三种模式：固定回复、按顺序回放脚本、按 prompt 计算回复；所有收到的 prompt 都会被记录，
//! 便于断言重试次数与纠错 prompt 的内容。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agents::AgentConfiguration;
use crate::llm::{LlmClient, LlmError};

type ReplyFn = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

enum Mode {
    Fixed(String),
    /// 脚本用完后重复最后一条
    Scripted(Mutex<VecDeque<Result<String, LlmError>>>),
    Func(ReplyFn),
}

/// Mock 客户端：确定性回复，并记录每次调用的 prompt
pub struct MockLlmClient {
    mode: Mode,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    /// 每次都返回同一段文本
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::with_mode(Mode::Fixed(reply.into()))
    }

    /// 依次返回脚本中的回复（可包含错误）；最后一条会被重复使用
    pub fn scripted(replies: Vec<Result<String, LlmError>>) -> Self {
        Self::with_mode(Mode::Scripted(Mutex::new(replies.into())))
    }

    /// 便捷版：全部是成功回复的脚本
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// 回复由 prompt 决定（用于并发 / 无状态测试）
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self::with_mode(Mode::Func(Box::new(f)))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的全部 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        prompt: &str,
        _config: &AgentConfiguration,
    ) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.mode {
            Mode::Fixed(reply) => Ok(reply.clone()),
            Mode::Scripted(queue) => {
                let mut queue = queue
                    .lock()
                    .map_err(|_| LlmError::Request("mock script poisoned".to_string()))?;
                if queue.len() > 1 {
                    queue.pop_front().unwrap_or(Err(LlmError::EmptyResponse))
                } else {
                    queue.front().cloned().unwrap_or(Err(LlmError::EmptyResponse))
                }
            }
            Mode::Func(f) => f(prompt),
        }
    }
}
