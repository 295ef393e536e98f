//! Tutor - 学习辅导智能体的输出解析与无状态执行管线
//!
//! 模块划分：
//! - **agents**: Agent 模板（共享 execute）与三个变体：辅导反馈 / 题目生成 / 路径推荐
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **contracts**: 各变体的输出契约（强类型 + JSON Schema + 语义检查）
//! - **core**: 错误分类、恢复引擎、纠错重试编排器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: tracing 日志初始化
//! - **output**: LLM 文本 -> 去围栏 -> 截取 -> 修复 -> 解析 -> 契约校验
//! - **prompt**: 确定性的 prompt 拼装
//! - **sanitize**: 用户输入清洗与长度限制
//! - **session**: 消息、会话快照、单次调用上下文

pub mod agents;
pub mod config;
pub mod contracts;
pub mod core;
pub mod llm;
pub mod observability;
pub mod output;
pub mod prompt;
pub mod sanitize;
pub mod session;

pub use agents::{
    execute, Agent, AgentConfiguration, AgentResponse, AgentVariant, CoachAgent,
    PipelineSettings, QuizAgent, RecommendAgent,
};
pub use core::{AgentError, ParseError, ParseErrorKind};
pub use llm::{LlmClient, LlmError};
pub use session::{AgentContext, LearnerProfile, Message, Role, SessionState};
