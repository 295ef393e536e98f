//! 辅导反馈 Agent：评价学习者的回答并给出改进建议与下一道追问

use crate::agents::{AgentConfiguration, AgentVariant};
use crate::config::AppConfig;
use crate::contracts::CoachingFeedback;
use crate::core::AgentError;
use crate::output::OutputSchema;
use crate::prompt::PromptBuilder;
use crate::session::{AgentContext, SessionState};

pub const COACH_SYSTEM_PROMPT: &str = "You are a patient technical interview coach. \
Evaluate the learner's latest answer for correctness and depth, explain your rating briefly, \
list concrete improvements, and when useful ask one follow-up question that builds on their answer. \
Rate quality as excellent, good or needs_improvement and give a score from 0 to 100.";

pub struct CoachAgent {
    config: AgentConfiguration,
    schema: OutputSchema,
}

impl CoachAgent {
    pub fn new(config: AgentConfiguration) -> Result<Self, AgentError> {
        Ok(Self {
            config,
            schema: OutputSchema::of::<CoachingFeedback>()?,
        })
    }

    /// 默认 system prompt + 配置文件中的 [generation] / [agents.coach]
    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        Self::new(AgentConfiguration::from_sections(
            COACH_SYSTEM_PROMPT,
            &cfg.generation,
            &cfg.agents.coach,
        ))
    }
}

impl AgentVariant for CoachAgent {
    type Output = CoachingFeedback;

    fn name(&self) -> &'static str {
        "coach"
    }

    fn configuration(&self) -> &AgentConfiguration {
        &self.config
    }

    fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    fn build_prompt(&self, input: &str, context: &AgentContext, session: &SessionState) -> String {
        let lesson = session
            .topic_id
            .as_ref()
            .map(|t| format!("- Lesson: {}", t))
            .unwrap_or_default();

        PromptBuilder::new(&self.config.system_prompt)
            .profile(&context.profile)
            .section("Session", lesson)
            .transcript(&context.recent_history, context.recent_history.len())
            .input(input)
            .output_schema(&self.schema)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LearnerProfile, Message};

    fn agent() -> CoachAgent {
        CoachAgent::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn test_prompt_contains_all_parts() {
        let session = SessionState::new("u1")
            .with_topic("rust-ownership")
            .appended(Message::agent("What is a move?"));
        let ctx = AgentContext::from_session(
            LearnerProfile::new().role("backend engineer").level("junior"),
            &session,
            10,
        );
        let prompt = agent().build_prompt("It transfers ownership.", &ctx, &session);

        assert!(prompt.starts_with(COACH_SYSTEM_PROMPT));
        assert!(prompt.contains("- Role: backend engineer"));
        assert!(prompt.contains("- Lesson: rust-ownership"));
        assert!(prompt.contains("[agent] What is a move?"));
        assert!(prompt.contains("It transfers ownership."));
        assert!(prompt.contains("nextPrompt"));
        assert!(prompt.contains("needs_improvement"));
    }

    #[test]
    fn test_prompt_is_pure() {
        let session = SessionState::new("u1").with_session_id("s1");
        let ctx = AgentContext::new(LearnerProfile::new());
        let a = agent();
        assert_eq!(
            a.build_prompt("x", &ctx, &session),
            a.build_prompt("x", &ctx, &session)
        );
    }
}
