//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `TUTOR__*` 覆盖（双下划线表示嵌套，如 `TUTOR__PIPELINE__MAX_RETRIES=3`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::output::RepairMode;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
    pub generation: GenerationSection,
    pub agents: AgentsSection,
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai；优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmProviderSection,
    #[serde(default)]
    pub openai: LlmProviderSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            deepseek: LlmProviderSection::default(),
            openai: LlmProviderSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmProviderSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次生成请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [pipeline] 段：清洗、提取修复、重试相关参数（所有 Agent 共享）
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// 首次生成之外的最大纠错重试次数（2 即最多 3 次解析）
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub repair: RepairMode,
    /// 用户输入清洗后的最大字符数
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// 拼入 prompt 的最近消息条数
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// 纠错 prompt 中引用上一轮错误输出的最大字符数
    #[serde(default = "default_correction_excerpt_chars")]
    pub correction_excerpt_chars: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            repair: RepairMode::default(),
            max_input_chars: default_max_input_chars(),
            history_window: default_history_window(),
            correction_excerpt_chars: default_correction_excerpt_chars(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_input_chars() -> usize {
    2000
}

fn default_history_window() -> usize {
    10
}

fn default_correction_excerpt_chars() -> usize {
    4000
}

/// [generation] 段：各 Agent 未单独配置时的生成参数
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSection {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

/// [agents.*] 段：按 Agent 覆盖模型与生成参数
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentsSection {
    #[serde(default)]
    pub coach: AgentOverride,
    #[serde(default)]
    pub quiz: AgentOverride,
    #[serde(default)]
    pub recommend: AgentOverride,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentOverride {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// 从 config 目录加载配置，环境变量 TUTOR__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 TUTOR__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("TUTOR")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.pipeline.max_retries, 2);
        assert_eq!(cfg.pipeline.max_input_chars, 2000);
        assert_eq!(cfg.pipeline.history_window, 10);
        assert_eq!(cfg.pipeline.repair, RepairMode::Lenient);
        assert_eq!(cfg.llm.timeouts.request, 60);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[pipeline]
max_retries = 4
repair = "trailing_commas"

[agents.quiz]
temperature = 0.2
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.pipeline.max_retries, 4);
        assert_eq!(cfg.pipeline.repair, RepairMode::TrailingCommas);
        assert_eq!(cfg.pipeline.history_window, 10);
        assert_eq!(cfg.agents.quiz.temperature, Some(0.2));
        assert!(cfg.agents.coach.temperature.is_none());
    }
}
