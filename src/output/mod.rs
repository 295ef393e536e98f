//! 输出层：LLM 文本 -> JSON -> 契约校验后的强类型值

pub mod contract;
pub mod extract;

use serde::Deserialize;

pub use contract::{Contract, OutputSchema};
pub use extract::{
    escape_stray_quotes, extract_candidate, extract_json, remove_trailing_commas, strip_fences,
};

use crate::core::ParseError;

/// 解析前的修复力度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// 不修复，候选片段必须是合法 JSON
    Off,
    /// 只去尾逗号
    TrailingCommas,
    /// 去尾逗号；严格解析仍失败时再尝试转义字符串内的裸引号
    #[default]
    Lenient,
}

/// 提取 + 校验：一次完整的解析尝试
pub fn parse_output<T: Contract>(
    raw: &str,
    schema: &OutputSchema,
    mode: RepairMode,
) -> Result<T, ParseError> {
    let value = extract_json(raw, mode)?;
    schema.validate(&value, raw)
}
