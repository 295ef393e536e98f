//! Agent 错误类型与恢复动作
//!
//! 内容级错误（ParseError：结构提取 / JSON 语法 / 契约校验）由重试编排器在本地消化；
//! 重试耗尽后包装为 AgentError::TerminalParseFailure；LLM 后端错误直接以 Unexpected 上抛。

use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;

/// 内容级失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// 去掉代码围栏后找不到任何 `{...}` / `[...]` 结构
    StructuralExtraction,
    /// 提取出候选片段，但修复后仍无法解析为 JSON
    JsonSyntax,
    /// JSON 合法，但违反输出契约（缺字段、类型错、枚举/范围越界）
    SchemaValidation,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::StructuralExtraction => "structural extraction failure",
            ParseErrorKind::JsonSyntax => "JSON syntax failure",
            ParseErrorKind::SchemaValidation => "schema validation failure",
        };
        f.write_str(name)
    }
}

/// 单次解析失败：诊断信息 + 原始 LLM 文本 + 可选底层原因
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// LLM 返回的原始文本（不是截取后的候选片段）
    pub raw: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ParseError {
    pub fn structural(message: impl Into<String>, raw: &str) -> Self {
        Self {
            kind: ParseErrorKind::StructuralExtraction,
            message: message.into(),
            raw: raw.to_string(),
            source: None,
        }
    }

    pub fn syntax(raw: &str, source: serde_json::Error) -> Self {
        Self {
            kind: ParseErrorKind::JsonSyntax,
            message: format!("invalid JSON: {}", source),
            raw: raw.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn schema(message: impl Into<String>, raw: &str) -> Self {
        Self {
            kind: ParseErrorKind::SchemaValidation,
            message: message.into(),
            raw: raw.to_string(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_structural(&self) -> bool {
        self.kind == ParseErrorKind::StructuralExtraction
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ParseErrorKind::JsonSyntax
    }

    pub fn is_schema(&self) -> bool {
        self.kind == ParseErrorKind::SchemaValidation
    }
}

/// Agent 对外暴露的错误：要么重试耗尽，要么后端失败
#[derive(Error, Debug)]
pub enum AgentError {
    /// 重试预算用完仍未得到合法输出；携带最后一次原始文本与最后一次诊断
    #[error("Terminal parse failure after {attempts} attempts: {cause}")]
    TerminalParseFailure {
        attempts: u32,
        raw: String,
        #[source]
        cause: ParseError,
    },

    /// LLM 后端失败（网络、超时、限流等），不在本层重试
    #[error("LLM error: {0}")]
    Unexpected(#[from] LlmError),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AgentError {
    pub fn is_terminal_parse_failure(&self) -> bool {
        matches!(self, AgentError::TerminalParseFailure { .. })
    }

    /// 终止性解析失败时返回最后一次诊断
    pub fn parse_cause(&self) -> Option<&ParseError> {
        match self {
            AgentError::TerminalParseFailure { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// 恢复引擎根据解析失败与剩余预算给出的建议动作
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    /// 将纠错提示发给 LLM 重新生成
    RetryWithPrompt(String),
    /// 预算耗尽，终止
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_names_kind() {
        let err = ParseError::structural("no braces", "hello");
        let text = err.to_string();
        assert!(text.contains("structural extraction failure"));
        assert!(text.contains("no braces"));
        assert_eq!(err.raw, "hello");
    }

    #[test]
    fn test_syntax_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ParseError::syntax("```{```", source);
        assert!(err.is_syntax());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_terminal_failure_exposes_cause() {
        let err = AgentError::TerminalParseFailure {
            attempts: 3,
            raw: "oops".to_string(),
            cause: ParseError::schema("quality: bad", "oops"),
        };
        assert!(err.is_terminal_parse_failure());
        assert!(err.parse_cause().unwrap().is_schema());
        assert!(err.to_string().contains("3 attempts"));
    }
}
