//! 重试编排器：解析失败时带纠错信息重新生成
//!
//! 状态：Attempting -> Success | Retryable（生成纠错 prompt 再调用 LLM）| Exhausted（TerminalParseFailure）。
//! 只有内容级失败（结构 / 语法 / 契约）会重试；LLM 后端错误立即以 AgentError::Unexpected 上抛。
//! 重试严格串行：上一轮结果确定之前不会发起下一轮。

use crate::agents::AgentConfiguration;
use crate::core::{AgentError, RecoveryAction, RecoveryEngine};
use crate::llm::LlmClient;
use crate::output::{parse_output, Contract, OutputSchema, RepairMode};

/// 默认重试次数：1 次首轮 + 2 次纠错
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub repair: RepairMode,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            repair: RepairMode::default(),
        }
    }
}

/// 成功结果：强类型值 + 实际解析次数 + 通过校验的原始文本
#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
    pub raw: String,
}

/// 一次编排所需的只读依赖
pub struct Orchestrator<'a> {
    pub llm: &'a dyn LlmClient,
    pub config: &'a AgentConfiguration,
    pub schema: &'a OutputSchema,
    pub recovery: &'a RecoveryEngine,
    pub retry: RetryConfig,
}

impl<'a> Orchestrator<'a> {
    /// 首次生成 + 解析；失败时按预算纠错重试
    pub async fn generate<T: Contract>(&self, prompt: &str) -> Result<RetryOutcome<T>, AgentError> {
        let text = self.llm.generate(prompt, self.config).await?;
        self.resolve(prompt, text).await
    }

    /// 从已有的首轮输出开始跑状态机；prompt 为原任务 prompt，用于拼纠错 prompt
    pub async fn resolve<T: Contract>(
        &self,
        prompt: &str,
        initial_text: String,
    ) -> Result<RetryOutcome<T>, AgentError> {
        let mut attempt: u32 = 0;
        let mut text = initial_text;

        loop {
            let err = match parse_output::<T>(&text, self.schema, self.retry.repair) {
                Ok(value) => {
                    tracing::debug!(schema = self.schema.name(), attempt, "Output accepted");
                    return Ok(RetryOutcome {
                        value,
                        attempts: attempt + 1,
                        raw: text,
                    });
                }
                Err(err) => err,
            };

            tracing::warn!(
                schema = self.schema.name(),
                attempt,
                kind = %err.kind,
                "Model output rejected: {}",
                err.message
            );

            match self
                .recovery
                .handle(&err, attempt, self.retry.max_retries, prompt)
            {
                RecoveryAction::RetryWithPrompt(correction) => {
                    text = self.llm.generate(&correction, self.config).await?;
                    attempt += 1;
                }
                RecoveryAction::Abort => {
                    tracing::error!(
                        schema = self.schema.name(),
                        attempts = attempt + 1,
                        "Retry budget exhausted"
                    );
                    return Err(AgentError::TerminalParseFailure {
                        attempts: attempt + 1,
                        raw: text,
                        cause: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct A {
        a: f64,
    }

    impl Contract for A {}

    struct Fixture {
        config: AgentConfiguration,
        schema: OutputSchema,
        recovery: RecoveryEngine,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: AgentConfiguration::new("mock", "sys"),
                schema: OutputSchema::of::<A>().unwrap(),
                recovery: RecoveryEngine::new(),
            }
        }

        fn orchestrator<'a>(&'a self, llm: &'a MockLlmClient, max_retries: u32) -> Orchestrator<'a> {
            Orchestrator {
                llm,
                config: &self.config,
                schema: &self.schema,
                recovery: &self.recovery,
                retry: RetryConfig {
                    max_retries,
                    repair: RepairMode::Lenient,
                },
            }
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let fx = Fixture::new();
        let llm = MockLlmClient::fixed("{\"a\": 1}");
        let out: RetryOutcome<A> = fx.orchestrator(&llm, 2).generate("TASK").await.unwrap();
        assert_eq!(out.value, A { a: 1.0 });
        assert_eq!(out.attempts, 1);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_recovers_on_second_attempt() {
        let fx = Fixture::new();
        let llm = MockLlmClient::replies(["not json", "```json\n{\"a\": 3,}\n```"]);
        let out: RetryOutcome<A> = fx.orchestrator(&llm, 2).generate("TASK").await.unwrap();
        assert_eq!(out.value, A { a: 3.0 });
        assert_eq!(out.attempts, 2);
        let prompts = llm.prompts();
        assert_eq!(prompts[0], "TASK");
        assert!(prompts[1].contains("Correction Required"));
        assert!(prompts[1].contains("not json"));
    }

    #[tokio::test]
    async fn test_exhaustion_counts() {
        let fx = Fixture::new();
        let llm = MockLlmClient::fixed("still no json");
        let err = fx
            .orchestrator(&llm, 2)
            .generate::<A>("TASK")
            .await
            .unwrap_err();
        match err {
            AgentError::TerminalParseFailure { attempts, raw, cause } => {
                assert_eq!(attempts, 3);
                assert_eq!(raw, "still no json");
                assert!(cause.is_structural());
            }
            other => panic!("unexpected error: {other}"),
        }
        // 1 次首轮 + 2 次纠错
        assert_eq!(llm.call_count(), 3);
        let corrections = llm
            .prompts()
            .iter()
            .filter(|p| p.contains("Correction Required"))
            .count();
        assert_eq!(corrections, 2);
    }

    #[tokio::test]
    async fn test_zero_retries() {
        let fx = Fixture::new();
        let llm = MockLlmClient::fixed("{\"b\": 1}");
        let err = fx.orchestrator(&llm, 0).generate::<A>("TASK").await.unwrap_err();
        assert!(err.parse_cause().unwrap().is_schema());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_during_retry_not_retried() {
        let fx = Fixture::new();
        let llm = MockLlmClient::scripted(vec![
            Ok("garbage".to_string()),
            Err(LlmError::Timeout(30)),
            Ok("{\"a\": 1}".to_string()),
        ]);
        let err = fx.orchestrator(&llm, 2).generate::<A>("TASK").await.unwrap_err();
        assert!(matches!(err, AgentError::Unexpected(LlmError::Timeout(30))));
        assert_eq!(llm.call_count(), 2);
    }
}
