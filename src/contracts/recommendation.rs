//! 学习路径推荐契约
//!
//! `{ recommendedItems: [{ id, relevanceScore, reasoning }], path: [id], focusAreas: [string] }`

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::output::Contract;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub id: String,
    /// 相关度 0.0..=1.0
    #[schemars(range(min = 0, max = 1))]
    pub relevance_score: f64,
    pub reasoning: String,
}

/// 推荐 Agent 的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub recommended_items: Vec<RecommendedItem>,
    /// 建议学习顺序，元素为 recommendedItems 中的 id
    pub path: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl LearningPath {
    /// 按相关度从高到低排序的推荐项（相同分数保持原顺序）
    pub fn ranked(&self) -> Vec<&RecommendedItem> {
        let mut items: Vec<&RecommendedItem> = self.recommended_items.iter().collect();
        items.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        items
    }
}

impl Contract for LearningPath {
    fn check(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        for (i, item) in self.recommended_items.iter().enumerate() {
            if !(0.0..=1.0).contains(&item.relevance_score) {
                return Err(format!(
                    "recommendedItems[{}].relevanceScore: {} is outside 0..=1",
                    i, item.relevance_score
                ));
            }
            if !ids.insert(item.id.as_str()) {
                return Err(format!(
                    "recommendedItems[{}].id: duplicate id '{}'",
                    i, item.id
                ));
            }
        }
        if let Some(unknown) = self.path.iter().find(|p| !ids.contains(p.as_str())) {
            return Err(format!(
                "path: '{}' is not a recommended item id",
                unknown
            ));
        }
        Ok(())
    }
}
