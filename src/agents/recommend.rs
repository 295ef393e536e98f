//! 学习路径推荐 Agent：从候选目录中挑选并排序下一步学习内容
//!
//! 候选目录由调用方放在 `SessionState.context["catalog"]`（`[{id, title}]`），
//! 已完成项放在 `context["completed"]`（`[id]`）；两者缺省时由模型自行给出。

use serde_json::Value;

use crate::agents::{AgentConfiguration, AgentVariant};
use crate::config::AppConfig;
use crate::contracts::LearningPath;
use crate::core::AgentError;
use crate::output::OutputSchema;
use crate::prompt::PromptBuilder;
use crate::session::{AgentContext, SessionState};

pub const RECOMMEND_SYSTEM_PROMPT: &str = "You plan personalised learning paths. \
Rank the most relevant next items for the learner with a relevanceScore between 0 and 1 and a one-sentence reason, \
order them into a study path that only uses ids you recommended, and name the skills they should focus on. \
Only recommend ids from the available items when a catalog is given, and never recommend completed items.";

const DEFAULT_MAX_ITEMS: usize = 5;

pub struct RecommendAgent {
    config: AgentConfiguration,
    schema: OutputSchema,
    max_items: usize,
}

impl RecommendAgent {
    pub fn new(config: AgentConfiguration) -> Result<Self, AgentError> {
        Ok(Self {
            config,
            schema: OutputSchema::of::<LearningPath>()?,
            max_items: DEFAULT_MAX_ITEMS,
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        Self::new(AgentConfiguration::from_sections(
            RECOMMEND_SYSTEM_PROMPT,
            &cfg.generation,
            &cfg.agents.recommend,
        ))
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }
}

/// `- id: title`；非对象条目原样输出紧凑 JSON
fn render_catalog(catalog: Option<&Value>) -> String {
    let Some(items) = catalog.and_then(Value::as_array) else {
        return String::new();
    };
    items
        .iter()
        .map(|item| {
            let id = item.get("id").and_then(Value::as_str);
            let title = item.get("title").and_then(Value::as_str);
            match (id, title) {
                (Some(id), Some(title)) => format!("- {}: {}", id, title),
                (Some(id), None) => format!("- {}", id),
                _ => format!("- {}", item),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_completed(completed: Option<&Value>) -> String {
    completed
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

impl AgentVariant for RecommendAgent {
    type Output = LearningPath;

    fn name(&self) -> &'static str {
        "recommend"
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
            .section(
                "Constraints",
                format!("- Recommend at most {} items", self.max_items),
            )
            .section("Available Items", render_catalog(session.context.get("catalog")))
            .section("Completed Items", render_completed(session.context.get("completed")))
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
    use serde_json::json;

    #[test]
    fn test_catalog_and_completed_rendered() {
        let agent = RecommendAgent::from_config(&AppConfig::default())
            .unwrap()
            .with_max_items(3);
        let session = SessionState::new("u1")
            .with_context_value(
                "catalog",
                json!([{"id": "sql-101", "title": "SQL basics"}, {"id": "sql-201"}, 42]),
            )
            .with_context_value("completed", json!(["sql-101"]));
        let ctx = AgentContext::new(LearnerProfile::new().role("data analyst"));
        let prompt = agent.build_prompt("what next?", &ctx, &session);

        assert!(prompt.contains("- Recommend at most 3 items"));
        assert!(prompt.contains("- sql-101: SQL basics"));
        assert!(prompt.contains("- sql-201"));
        assert!(prompt.contains("- 42"));
        assert!(prompt.contains("## Completed Items\nsql-101"));
        assert!(prompt.contains("relevanceScore"));
    }

    #[test]
    fn test_no_catalog_section_when_absent() {
        let agent = RecommendAgent::from_config(&AppConfig::default()).unwrap();
        let session = SessionState::new("u1");
        let prompt = agent.build_prompt("x", &AgentContext::default(), &session);
        assert!(!prompt.contains("Available Items"));
        assert!(!prompt.contains("Completed Items"));
    }
}
