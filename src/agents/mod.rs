//! Agent 模板与具体变体
//!
//! 每个变体只提供三样东西：AgentConfiguration、输出契约（OutputSchema）、build_prompt；
//! 清洗 -> 拼 prompt -> 生成 -> 提取 / 校验 / 纠错重试 由共享的 [`execute`] 完成。
//! Agent 不持有任何跨调用状态，会话历史只通过 SessionState 参数传入、以新快照返回。

pub mod coach;
pub mod quiz;
pub mod recommend;

use std::sync::Arc;

use serde::Serialize;

pub use coach::CoachAgent;
pub use quiz::QuizAgent;
pub use recommend::RecommendAgent;

use crate::config::{AgentOverride, GenerationSection, PipelineSection};
use crate::core::{AgentError, Orchestrator, RecoveryEngine, RetryConfig};
use crate::llm::LlmClient;
use crate::output::{Contract, OutputSchema};
use crate::sanitize::{sanitize_with_limit, DEFAULT_MAX_INPUT_CHARS};
use crate::session::{AgentContext, Message, SessionState};

/// 单个 Agent 的生成参数；构造后只读
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfiguration {
    /// 为空时由 LLM 客户端使用其默认模型
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_prompt: String,
}

impl AgentConfiguration {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let defaults = GenerationSection::default();
        Self {
            model: model.into(),
            temperature: defaults.temperature,
            max_output_tokens: defaults.max_output_tokens,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// [generation] 默认值 + [agents.<name>] 覆盖
    pub fn from_sections(
        system_prompt: impl Into<String>,
        generation: &GenerationSection,
        overrides: &AgentOverride,
    ) -> Self {
        Self {
            model: overrides.model.clone().unwrap_or_default(),
            temperature: overrides.temperature.unwrap_or(generation.temperature),
            max_output_tokens: overrides
                .max_output_tokens
                .unwrap_or(generation.max_output_tokens),
            system_prompt: system_prompt.into(),
        }
    }
}

/// 变体策略：配置 + 契约 + prompt 拼装
pub trait AgentVariant: Send + Sync {
    type Output: Contract;

    /// 日志用名称
    fn name(&self) -> &'static str;

    fn configuration(&self) -> &AgentConfiguration;

    fn schema(&self) -> &OutputSchema;

    /// 纯函数：input 已清洗，context 的历史已按窗口截断
    fn build_prompt(&self, input: &str, context: &AgentContext, session: &SessionState) -> String;
}

/// 所有变体共享的管线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub retry: RetryConfig,
    pub max_input_chars: usize,
    pub history_window: usize,
    pub correction_excerpt_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineSection::default())
    }
}

impl From<&PipelineSection> for PipelineSettings {
    fn from(section: &PipelineSection) -> Self {
        Self {
            retry: RetryConfig {
                max_retries: section.max_retries,
                repair: section.repair,
            },
            max_input_chars: section.max_input_chars,
            history_window: section.history_window,
            correction_excerpt_chars: section.correction_excerpt_chars,
        }
    }
}

impl PipelineSettings {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }
}

/// execute 的结果：强类型输出 + 追加了本轮对话的新会话快照
#[derive(Debug, Clone)]
pub struct AgentResponse<T> {
    pub output: T,
    pub session: SessionState,
    /// 实际解析次数（1 表示首轮即通过）
    pub attempts: u32,
}

/// 共享模板：清洗 -> 拼 prompt -> 生成 -> 提取 / 校验 / 纠错重试 -> 新会话快照
pub async fn execute<V: AgentVariant>(
    llm: &dyn LlmClient,
    variant: &V,
    settings: &PipelineSettings,
    input: &str,
    context: &AgentContext,
    session: &SessionState,
) -> Result<AgentResponse<V::Output>, AgentError> {
    let max_input_chars = if settings.max_input_chars == 0 {
        DEFAULT_MAX_INPUT_CHARS
    } else {
        settings.max_input_chars
    };
    let sanitized = sanitize_with_limit(input, max_input_chars);

    let bounded;
    let context = if context.recent_history.len() > settings.history_window {
        bounded = context.clone().bounded(settings.history_window);
        &bounded
    } else {
        context
    };

    tracing::info!(
        agent = variant.name(),
        session_id = %session.session_id,
        input_chars = sanitized.chars().count(),
        history = context.recent_history.len(),
        "Executing agent"
    );

    let prompt = variant.build_prompt(&sanitized, context, session);
    let recovery = RecoveryEngine::new().with_excerpt_chars(settings.correction_excerpt_chars);
    let orchestrator = Orchestrator {
        llm,
        config: variant.configuration(),
        schema: variant.schema(),
        recovery: &recovery,
        retry: settings.retry,
    };

    let outcome = orchestrator
        .generate::<V::Output>(&prompt)
        .await
        .map_err(|e| {
            tracing::error!(
                agent = variant.name(),
                session_id = %session.session_id,
                "Agent failed: {}",
                e
            );
            e
        })?;

    let reply = compact_json(&outcome.value).unwrap_or_else(|| outcome.raw.clone());
    let next = session
        .appended(Message::user(sanitized))
        .appended(Message::agent(reply));

    tracing::info!(
        agent = variant.name(),
        session_id = %session.session_id,
        attempts = outcome.attempts,
        "Agent completed"
    );

    Ok(AgentResponse {
        output: outcome.value,
        session: next,
        attempts: outcome.attempts,
    })
}

fn compact_json<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_string(value).ok()
}

/// 变体 + 注入的 LLM + 管线参数；`&self` 调用，可在多个任务间共享
pub struct Agent<V> {
    llm: Arc<dyn LlmClient>,
    variant: V,
    settings: PipelineSettings,
}

impl<V: AgentVariant> Agent<V> {
    pub fn new(llm: Arc<dyn LlmClient>, variant: V) -> Self {
        Self {
            llm,
            variant,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn variant(&self) -> &V {
        &self.variant
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn execute(
        &self,
        input: &str,
        context: &AgentContext,
        session: &SessionState,
    ) -> Result<AgentResponse<V::Output>, AgentError> {
        execute(
            self.llm.as_ref(),
            &self.variant,
            &self.settings,
            input,
            context,
            session,
        )
        .await
    }
}
