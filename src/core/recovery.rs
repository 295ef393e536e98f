//! 错误恢复引擎
//!
//! 根据解析失败与剩余重试预算返回 RecoveryAction：还有预算时生成纠错 prompt（RetryWithPrompt），否则 Abort。

use crate::core::{ParseError, ParseErrorKind, RecoveryAction};
use crate::sanitize::truncate_chars;

/// 纠错 prompt 中引用上一轮输出的默认最大字符数
pub const DEFAULT_EXCERPT_CHARS: usize = 4000;

/// 把解析失败翻译成下一轮给 LLM 的纠错指令
#[derive(Debug, Clone)]
pub struct RecoveryEngine {
    excerpt_chars: usize,
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    /// attempt 为已完成的重试次数（首次生成为 0）
    pub fn handle(
        &self,
        err: &ParseError,
        attempt: u32,
        max_retries: u32,
        original_prompt: &str,
    ) -> RecoveryAction {
        if attempt >= max_retries {
            return RecoveryAction::Abort;
        }
        RecoveryAction::RetryWithPrompt(self.correction_prompt(original_prompt, err))
    }

    /// 原任务 + 失败诊断 + 上一轮（截断后的）错误输出 + 只输出 JSON 的要求
    pub fn correction_prompt(&self, original_prompt: &str, err: &ParseError) -> String {
        let hint = match err.kind {
            ParseErrorKind::StructuralExtraction => {
                "Your previous reply did not contain a JSON object."
            }
            ParseErrorKind::JsonSyntax => "Your previous reply contained malformed JSON.",
            ParseErrorKind::SchemaValidation => {
                "Your previous reply was valid JSON but did not match the required schema."
            }
        };
        let excerpt = truncate_chars(&err.raw, self.excerpt_chars);
        let ellipsis = if excerpt.len() < err.raw.len() { "\n...(truncated)" } else { "" };

        format!(
            "{original_prompt}\n\n\
             ## Correction Required\n\
             {hint}\n\
             Error: {message}\n\n\
             Previous reply:\n\
             <<<\n{excerpt}{ellipsis}\n>>>\n\n\
             Fix the problem and reply again with ONLY the corrected JSON, no markdown and no other text.",
            message = err.message,
        )
    }
}
