//! 题目生成 Agent：按主题与难度生成单选题

use crate::agents::{AgentConfiguration, AgentVariant};
use crate::config::AppConfig;
use crate::contracts::{Difficulty, QuestionSet};
use crate::core::AgentError;
use crate::output::OutputSchema;
use crate::prompt::PromptBuilder;
use crate::session::{AgentContext, SessionState};

pub const QUIZ_SYSTEM_PROMPT: &str = "You write multiple-choice questions for a technical learning platform. \
Every question has a unique id, at least two options with unique ids, exactly one correct option \
referenced by correctAnswer, and a short explanation of why that option is right.";

const DEFAULT_QUESTION_COUNT: usize = 5;

pub struct QuizAgent {
    config: AgentConfiguration,
    schema: OutputSchema,
    question_count: usize,
    difficulty: Option<Difficulty>,
}

impl QuizAgent {
    pub fn new(config: AgentConfiguration) -> Result<Self, AgentError> {
        Ok(Self {
            config,
            schema: OutputSchema::of::<QuestionSet>()?,
            question_count: DEFAULT_QUESTION_COUNT,
            difficulty: None,
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        Self::new(AgentConfiguration::from_sections(
            QUIZ_SYSTEM_PROMPT,
            &cfg.generation,
            &cfg.agents.quiz,
        ))
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count.max(1);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    fn requirements(&self, context: &AgentContext, session: &SessionState) -> String {
        let mut s = format!("- Number of questions: {}\n", self.question_count);
        match self.difficulty {
            Some(d) => s.push_str(&format!("- Difficulty: {}\n", d.as_str())),
            None => s.push_str("- Difficulty: match the learner's level\n"),
        }
        let topic = context
            .profile
            .current_topic
            .as_deref()
            .or(session.topic_id.as_deref());
        if let Some(topic) = topic {
            s.push_str(&format!("- Topic: {}\n", topic));
        }
        s
    }
}

impl AgentVariant for QuizAgent {
    type Output = QuestionSet;

    fn name(&self) -> &'static str {
        "quiz"
    }

    fn configuration(&self) -> &AgentConfiguration {
        &self.config
    }

    fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    fn build_prompt(&self, input: &str, context: &AgentContext, session: &SessionState) -> String {
        PromptBuilder::new(&self.config.system_prompt)
            .profile(&context.profile)
            .section("Quiz Requirements", self.requirements(context, session))
            .transcript(&context.recent_history, context.recent_history.len())
            .input(input)
            .output_schema(&self.schema)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LearnerProfile;

    #[test]
    fn test_requirements_in_prompt() {
        let agent = QuizAgent::from_config(&AppConfig::default())
            .unwrap()
            .with_question_count(3)
            .with_difficulty(Difficulty::Hard);
        let session = SessionState::new("u1").with_topic("sql-joins");
        let ctx = AgentContext::new(LearnerProfile::new().level("intermediate"));
        let prompt = agent.build_prompt("focus on outer joins", &ctx, &session);

        assert!(prompt.contains("- Number of questions: 3"));
        assert!(prompt.contains("- Difficulty: hard"));
        assert!(prompt.contains("- Topic: sql-joins"));
        assert!(prompt.contains("focus on outer joins"));
        assert!(prompt.contains("correctAnswer"));
    }

    #[test]
    fn test_profile_topic_wins_over_session_topic() {
        let agent = QuizAgent::from_config(&AppConfig::default()).unwrap();
        let session = SessionState::new("u1").with_topic("lesson-7");
        let ctx = AgentContext::new(LearnerProfile::new().topic("indexes"));
        let prompt = agent.build_prompt("", &ctx, &session);
        assert!(prompt.contains("- Topic: indexes"));
        assert!(prompt.contains("match the learner's level"));
        assert!(!prompt.contains("## Learner Input"));
    }
}
