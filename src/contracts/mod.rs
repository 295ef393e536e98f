//! 各 Agent 的输出契约

pub mod feedback;
pub mod questions;
pub mod recommendation;

pub use feedback::{CoachingFeedback, FeedbackDetail, Quality};
pub use questions::{AnswerOption, Difficulty, Question, QuestionSet};
pub use recommendation::{LearningPath, RecommendedItem};
