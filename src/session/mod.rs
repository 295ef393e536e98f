//! 会话层：消息、会话快照（调用方持有）、单次调用上下文

pub mod context;
pub mod message;
pub mod state;

pub use context::{AgentContext, LearnerProfile};
pub use message::{Message, Role};
pub use state::SessionState;
