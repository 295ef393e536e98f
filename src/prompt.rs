//! Prompt 拼装
//!
//! 纯函数式拼装：system prompt + 学习者画像 + 最近对话摘录 + 各 Agent 自定义段落 + 清洗后的输入 + 输出格式说明。
//! 相同输入必定得到相同 prompt，不做任何 I/O。

use crate::output::OutputSchema;
use crate::session::{LearnerProfile, Message};

/// 对话摘录中单条消息的最大字符数
const TRANSCRIPT_MESSAGE_CHARS: usize = 500;

/// 输出格式说明（拼在 Schema 前面）
pub const OUTPUT_INSTRUCTION: &str = "Respond with ONLY one JSON value that validates against the JSON Schema below. \
Do not wrap it in markdown code fences and do not add any explanation before or after it.";

/// 分段拼装 prompt；段落按调用顺序输出
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system: String,
    sections: Vec<(String, String)>,
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system: system_prompt.into(),
            sections: Vec::new(),
        }
    }

    /// 追加一个 `## 标题` 段落；正文为空时跳过
    pub fn section(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.trim().is_empty() {
            self.sections.push((title.into(), body));
        }
        self
    }

    pub fn profile(self, profile: &LearnerProfile) -> Self {
        self.section("Learner Profile", render_profile(profile))
    }

    /// 最近 k 条消息，按时间顺序
    pub fn transcript(self, messages: &[Message], k: usize) -> Self {
        self.section("Recent Conversation", render_transcript(messages, k))
    }

    pub fn input(self, sanitized_input: &str) -> Self {
        self.section("Learner Input", sanitized_input.to_string())
    }

    pub fn output_schema(self, schema: &OutputSchema) -> Self {
        let body = format!("{}\n\n{}", OUTPUT_INSTRUCTION, schema.to_prompt_string());
        self.section("Output Format", body)
    }

    pub fn build(self) -> String {
        let mut out = self.system.trim().to_string();
        for (title, body) in self.sections {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&format!("## {}\n{}", title, body.trim_end()));
        }
        out
    }
}

pub fn render_profile(profile: &LearnerProfile) -> String {
    let mut s = String::new();
    let fields = [
        ("Role", &profile.role),
        ("Level", &profile.level),
        ("Current topic", &profile.current_topic),
    ];
    for (label, value) in fields {
        if let Some(v) = value {
            s.push_str(&format!("- {}: {}\n", label, v));
        }
    }
    s
}

/// `[role] content` 逐行输出；内容压成单行并截断
pub fn render_transcript(messages: &[Message], k: usize) -> String {
    let start = messages.len().saturating_sub(k);
    messages[start..]
        .iter()
        .map(|m| {
            let condensed = m.content.split_whitespace().collect::<Vec<_>>().join(" ");
            let mut line = format!("[{}] ", m.role.as_str());
            let mut chars = condensed.chars();
            line.extend(chars.by_ref().take(TRANSCRIPT_MESSAGE_CHARS));
            if chars.next().is_some() {
                line.push_str("...");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
