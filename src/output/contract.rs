//! 输出契约与校验
//!
//! 每个 Agent 的输出是一个静态声明的 Rust 类型（Contract）；schemars 由类型生成 JSON Schema，
//! jsonschema 按 Schema 做结构校验（必填、类型、枚举、数值范围），再反序列化为强类型，
//! 最后执行 Schema 无法表达的语义检查（Contract::check）。任何一步失败都不会返回部分结果。

use jsonschema::Validator;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::core::{AgentError, ParseError};

/// 输出契约：可生成 Schema、可序列化 / 反序列化，并可追加语义校验
pub trait Contract: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static {
    /// Schema 无法表达的约束（如引用完整性）；错误信息需指出字段
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// 编译好的契约 Schema：构造一次，只读共享
pub struct OutputSchema {
    name: String,
    schema: Value,
    validator: Validator,
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSchema").field("name", &self.name).finish()
    }
}

impl OutputSchema {
    pub fn of<T: Contract>() -> Result<Self, AgentError> {
        let root = schema_for!(T);
        let name = root
            .schema
            .metadata
            .as_ref()
            .and_then(|m| m.title.clone())
            .unwrap_or_else(|| std::any::type_name::<T>().to_string());
        let schema = serde_json::to_value(&root)
            .map_err(|e| AgentError::ConfigError(format!("schema for {name}: {e}")))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| AgentError::ConfigError(format!("invalid schema for {name}: {e}")))?;
        Ok(Self {
            name,
            schema,
            validator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn json(&self) -> &Value {
        &self.schema
    }

    /// 拼入 prompt 的 Schema 文本
    pub fn to_prompt_string(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_default()
    }

    /// 结构校验 + 强类型转换 + 语义检查；raw 为 LLM 原始文本，写入错误便于诊断
    pub fn validate<T: Contract>(&self, value: &Value, raw: &str) -> Result<T, ParseError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(value)
            .map(|e| {
                let path = e.instance_path.to_string();
                let path = if path.is_empty() { "(root)".to_string() } else { path };
                format!("{}: {}", path, e)
            })
            .collect();
        if !violations.is_empty() {
            return Err(ParseError::schema(
                format!("{} violates contract: {}", self.name, violations.join("; ")),
                raw,
            ));
        }

        let typed: T = serde_json::from_value(value.clone()).map_err(|e| {
            ParseError::schema(format!("{} does not match contract: {}", self.name, e), raw)
                .with_source(e)
        })?;

        typed.check().map_err(|msg| {
            ParseError::schema(format!("{} violates contract: {}", self.name, msg), raw)
        })?;
        Ok(typed)
    }
}
