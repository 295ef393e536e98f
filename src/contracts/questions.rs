//! 题目集契约
//!
//! `{ questions: [{ id, text, options: [{id, text}], correctAnswer, explanation, difficulty? }] }`

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::output::Contract;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[schemars(length(min = 2))]
    pub options: Vec<AnswerOption>,
    /// 必须是 options 中某一项的 id
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// 题目生成 Agent 的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSet {
    #[schemars(length(min = 1))]
    pub questions: Vec<Question>,
}

impl Contract for QuestionSet {
    fn check(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (i, q) in self.questions.iter().enumerate() {
            if !seen.insert(q.id.as_str()) {
                return Err(format!("questions[{}].id: duplicate id '{}'", i, q.id));
            }
            let mut option_ids = HashSet::new();
            for o in &q.options {
                if !option_ids.insert(o.id.as_str()) {
                    return Err(format!(
                        "questions[{}].options: duplicate option id '{}'",
                        i, o.id
                    ));
                }
            }
            if !option_ids.contains(q.correct_answer.as_str()) {
                return Err(format!(
                    "questions[{}].correctAnswer: '{}' is not one of the option ids",
                    i, q.correct_answer
                ));
            }
        }
        Ok(())
    }
}
