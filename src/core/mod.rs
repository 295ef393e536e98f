//! 核心编排层：错误分类、恢复引擎、重试编排器

pub mod error;
pub mod orchestrator;
pub mod recovery;

pub use error::{AgentError, ParseError, ParseErrorKind, RecoveryAction};
pub use orchestrator::{Orchestrator, RetryConfig, RetryOutcome, DEFAULT_MAX_RETRIES};
pub use recovery::RecoveryEngine;
