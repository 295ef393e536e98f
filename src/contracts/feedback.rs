//! 辅导反馈契约
//!
//! `{ response, feedback: { quality, reasoning, improvements[] }, nextPrompt?, score? }`

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::output::Contract;

/// 回答质量评级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Excellent,
    Good,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetail {
    pub quality: Quality,
    /// 评级理由
    pub reasoning: String,
    /// 可执行的改进建议
    pub improvements: Vec<String>,
}

/// 辅导 Agent 的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoachingFeedback {
    /// 对学习者的直接回复
    pub response: String,
    pub feedback: FeedbackDetail,
    /// 下一道追问（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_prompt: Option<String>,
    /// 0..=100 的得分（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 100))]
    pub score: Option<f64>,
}

impl Contract for CoachingFeedback {
    fn check(&self) -> Result<(), String> {
        if self.response.trim().is_empty() {
            return Err("response: must not be blank".to_string());
        }
        if let Some(score) = self.score {
            if !(0.0..=100.0).contains(&score) {
                return Err(format!("score: {} is outside 0..=100", score));
            }
        }
        Ok(())
    }
}
