//! 从 LLM 原始文本中提取 JSON
//!
//! 严格按顺序执行四步：去代码围栏 -> 截取 `{...}` / `[...]` 边界 -> 尽力修复 -> 解析。
//! 任一步失败都返回携带原始文本的 ParseError，供重试编排器生成纠错 prompt。

use serde_json::Value;

use crate::core::ParseError;
use crate::output::RepairMode;

const FENCE: &str = "```";

/// 第 1 步：去掉 ```json ... ``` 或裸 ``` 围栏
///
/// 先做首尾剥离；若仍残留围栏标记且不全在 JSON 结构内部（字符串值里的代码片段），
/// 则退回到取第一个与最后一个 ``` 之间的内容。
pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut s = trimmed;
    if let Some(rest) = s.strip_prefix(FENCE) {
        s = drop_language_tag(rest);
    }
    if let Some(rest) = s.trim_end().strip_suffix(FENCE) {
        s = rest;
    }
    if !s.contains(FENCE) || fences_within_structure(s) {
        return s.trim().to_string();
    }

    match (trimmed.find(FENCE), trimmed.rfind(FENCE)) {
        (Some(first), Some(last)) if first < last => {
            drop_language_tag(&trimmed[first + FENCE.len()..last])
                .trim()
                .to_string()
        }
        _ => s.trim().to_string(),
    }
}

/// 所有 ``` 都落在最外层 `{`/`[` 与最后一个 `}`/`]` 之间
fn fences_within_structure(s: &str) -> bool {
    let (Some(start), Some(end)) = (s.find(['{', '[']), s.rfind(['}', ']'])) else {
        return false;
    };
    s.match_indices(FENCE)
        .all(|(idx, _)| idx > start && idx + FENCE.len() <= end)
}

/// 围栏开头那一行若只是语言标记（json / JSON / 空），整行丢掉
fn drop_language_tag(s: &str) -> &str {
    match s.find('\n') {
        Some(idx) => {
            let tag = s[..idx].trim();
            let is_tag = tag.len() <= 16
                && tag
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if is_tag {
                &s[idx + 1..]
            } else {
                s
            }
        }
        None => s
            .strip_prefix("json")
            .or_else(|| s.strip_prefix("JSON"))
            .unwrap_or(s),
    }
}

/// 第 2 步：取第一个 `{` 到最后一个 `}`；不成立时退回 `[` / `]`
///
/// 两者都不成立但存在开括号时（输出被截断），从第一个开括号取到结尾，交给解析步骤报语法错误；
/// 完全没有开括号才返回 None。
pub fn extract_candidate(text: &str) -> Option<&str> {
    slice_between(text, '{', '}')
        .or_else(|| slice_between(text, '[', ']'))
        .or_else(|| {
            let start = text.find(['{', '['])?;
            Some(&text[start..])
        })
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// 去掉紧挨 `}` / `]` 前的尾逗号；字符串字面量内部的逗号不动
pub fn remove_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// 宽松修复：把字符串值内部未转义的双引号转义
///
/// 引号之后（跳过空白）若是 `:` `}` `]`、结尾，或是 `,` 且其后紧跟新的键/元素，则视为字符串结束；
/// 否则视为正文里的引号并转义。属于尽力而为，可能误判，只在严格解析失败后使用。
pub fn escape_stray_quotes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }
        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' if closes_string(&chars[i + 1..]) => {
                in_string = false;
                out.push(c);
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

fn closes_string(rest: &[char]) -> bool {
    let mut iter = rest.iter().copied().filter(|c| !c.is_whitespace());
    match iter.next() {
        None | Some(':') | Some('}') | Some(']') => true,
        Some(',') => matches!(
            iter.next(),
            None | Some('"') | Some('{') | Some('[') | Some('}') | Some(']')
        ),
        _ => false,
    }
}

/// 完整管线：原始文本 -> serde_json::Value
pub fn extract_json(raw: &str, mode: RepairMode) -> Result<Value, ParseError> {
    let unfenced = strip_fences(raw);
    let candidate = extract_candidate(&unfenced).ok_or_else(|| {
        ParseError::structural("no JSON object or array found in model output", raw)
    })?;
    tracing::debug!(candidate_chars = candidate.len(), ?mode, "Extracted JSON candidate");

    let repaired = match mode {
        RepairMode::Off => candidate.to_string(),
        RepairMode::TrailingCommas | RepairMode::Lenient => remove_trailing_commas(candidate),
    };

    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            if mode == RepairMode::Lenient {
                let lenient = escape_stray_quotes(&repaired);
                if lenient != repaired {
                    if let Ok(value) = serde_json::from_str::<Value>(&lenient) {
                        tracing::debug!("Recovered JSON after escaping stray quotes");
                        return Ok(value);
                    }
                }
            }
            Err(ParseError::syntax(raw, strict_err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_strip_fence_surrounded_by_prose() {
        let raw = "Sure! Here is the result:\n```json\n{\"a\": 2}\n```\nLet me know.";
        assert_eq!(strip_fences(raw), "{\"a\": 2}");
    }

    #[test]
    fn test_strip_single_line_fence() {
        assert_eq!(strip_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_backticks_inside_string_values_kept() {
        let raw = r#"{"response": "Use ```let x = 5;``` here, not ```var```"}"#;
        assert_eq!(strip_fences(raw), raw);
        let value = extract_json(raw, RepairMode::Lenient).unwrap();
        assert_eq!(value["response"], "Use ```let x = 5;``` here, not ```var```");
    }

    #[test]
    fn test_fenced_json_with_inner_backticks() {
        let raw = "Here:\n```json\n{\"a\": \"see ```x``` and ```y```\"}\n```\nDone.";
        let value = extract_json(raw, RepairMode::Lenient).unwrap();
        assert_eq!(value["a"], "see ```x``` and ```y```");
    }

    #[test]
    fn test_backwards_braces_are_syntax_failure() {
        let err = extract_json("} backwards {", RepairMode::Lenient).unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_candidate_prefers_object() {
        assert_eq!(extract_candidate("x {\"a\":[1]} y"), Some("{\"a\":[1]}"));
        assert_eq!(extract_candidate("list: [1,2,3]."), Some("[1,2,3]"));
        // 只有开括号时按截断输出处理，交给解析步骤报语法错误
        assert_eq!(extract_candidate("} backwards {"), Some("{"));
        assert_eq!(extract_candidate("{\"a\": \"cut"), Some("{\"a\": \"cut"));
        assert_eq!(extract_candidate("no json here"), None);
    }

    #[test]
    fn test_trailing_commas_outside_strings_only() {
        assert_eq!(
            remove_trailing_commas(r#"{"a": [1, 2, ], "b": ",}", }"#),
            r#"{"a": [1, 2 ], "b": ",}" }"#
        );
    }

    #[test]
    fn test_escape_stray_quotes() {
        let broken = r#"{"reasoning": "use the "Builder" pattern", "ok": true}"#;
        let fixed = escape_stray_quotes(broken);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["reasoning"], "use the \"Builder\" pattern");
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_escape_leaves_valid_json_alone() {
        let valid = r#"{"a": "x: \"y\"", "b": ["c", "d"]}"#;
        assert_eq!(escape_stray_quotes(valid), valid);
    }

    #[test]
    fn test_fenced_trailing_comma_recovers() {
        let value = extract_json("```json\n{\"a\":1,}\n```", RepairMode::Lenient).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_repair_off_rejects_trailing_comma() {
        let err = extract_json("{\"a\":1,}", RepairMode::Off).unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_no_structure() {
        let err = extract_json("no json here", RepairMode::Lenient).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(err.raw, "no json here");
    }

    #[test]
    fn test_unterminated_string_is_syntax_failure() {
        let raw = r#"{"a": "unterminated"#;
        let err = extract_json(raw, RepairMode::Lenient).unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.raw, raw);
    }

    #[test]
    fn test_lenient_only_after_strict_failure() {
        let raw = r#"{"a": "b\": c"}"#;
        let value = extract_json(raw, RepairMode::Lenient).unwrap();
        assert_eq!(value["a"], "b\": c");
    }
}
