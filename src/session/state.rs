//! 会话状态快照
//!
//! SessionState 由调用方（持久化层）持有；Agent 只读取快照并返回追加了新消息的新快照，从不原地修改。
//! 消息序列只追加不改写，时间戳在会话内单调不减。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::{Message, Role};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub user_id: String,
    /// 当前课程 / 主题 id（可选）
    pub topic_id: Option<String>,
    messages: Vec<Message>,
    /// 调用方自定义上下文（例如可推荐的课程目录），本层不解释
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SessionState {
    /// 新会话：随机 session_id，空历史
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            topic_id: None,
            messages: Vec::new(),
            context: Map::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_metadata_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 最近 n 条消息，保持时间顺序
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// 返回追加一条消息后的新快照；时间戳早于最后一条时被抬到最后一条的时间
    pub fn appended(&self, message: Message) -> SessionState {
        let mut next = self.clone();
        next.push(message);
        next
    }

    /// 便捷版：按角色与内容追加
    pub fn appended_with(&self, role: Role, content: impl Into<String>) -> SessionState {
        self.appended(Message::new(role, content))
    }

    fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_appended_returns_new_snapshot() {
        let s0 = SessionState::new("u1");
        let s1 = s0.appended(Message::user("hi"));
        assert!(s0.is_empty());
        assert_eq!(s1.len(), 1);
        assert_eq!(s1.session_id, s0.session_id);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let now = Utc::now();
        let s = SessionState::new("u1")
            .appended(Message::user("later").at(now))
            .appended(Message::agent("earlier").at(now - Duration::seconds(30)));
        let msgs = s.messages();
        assert!(msgs[1].timestamp >= msgs[0].timestamp);
        assert_eq!(msgs[1].content, "earlier");
    }

    #[test]
    fn test_recent_keeps_order() {
        let mut s = SessionState::new("u1");
        for i in 0..5 {
            s = s.appended_with(Role::User, format!("m{}", i));
        }
        let recent: Vec<_> = s.recent(3).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(recent, vec!["m2", "m3", "m4"]);
        assert_eq!(s.recent(99).len(), 5);
    }

    #[test]
    fn test_serde_roundtrip_roles_lowercase() {
        let s = SessionState::new("u1").appended(Message::agent("ok"));
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"role\":\"agent\""));
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
