//! 单次调用的上下文：学习者画像 + 最近历史窗口（不持久化）

use serde::{Deserialize, Serialize};

use crate::session::{Message, SessionState};

/// 调用方提供的学习者画像
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// 目标岗位 / 角色，如 "backend engineer"
    pub role: Option<String>,
    /// 水平，如 "beginner"
    pub level: Option<String>,
    pub current_topic: Option<String>,
}

impl LearnerProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.current_topic = Some(topic.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentContext {
    pub profile: LearnerProfile,
    /// 最近历史（按时间顺序），长度不超过构造时的窗口
    pub recent_history: Vec<Message>,
}

impl AgentContext {
    pub fn new(profile: LearnerProfile) -> Self {
        Self {
            profile,
            recent_history: Vec::new(),
        }
    }

    /// 从会话快照复制最近 window 条消息
    pub fn from_session(profile: LearnerProfile, session: &SessionState, window: usize) -> Self {
        Self {
            profile,
            recent_history: session.recent(window).to_vec(),
        }
    }

    /// 历史窗口 = 0 时清空；否则只保留最近 window 条
    pub fn bounded(mut self, window: usize) -> Self {
        let excess = self.recent_history.len().saturating_sub(window);
        self.recent_history.drain(..excess);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn test_from_session_bounds_window() {
        let mut session = SessionState::new("u1");
        for i in 0..15 {
            session = session.appended_with(Role::User, format!("m{}", i));
        }
        let ctx = AgentContext::from_session(LearnerProfile::new().level("beginner"), &session, 10);
        assert_eq!(ctx.recent_history.len(), 10);
        assert_eq!(ctx.recent_history[0].content, "m5");
        assert_eq!(ctx.recent_history[9].content, "m14");
    }

    #[test]
    fn test_bounded_trims_oldest() {
        let ctx = AgentContext {
            profile: LearnerProfile::default(),
            recent_history: vec![Message::user("a"), Message::user("b"), Message::user("c")],
        }
        .bounded(2);
        let contents: Vec<_> = ctx.recent_history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }
}
