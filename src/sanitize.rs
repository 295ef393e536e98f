//! 输入清洗：纵深防御，不是安全边界
//!
//! 去掉脚本类标记、注入惯用片段与一组固定的 SQL 关键字（不区分大小写），去首尾空白，并按字符数截断。
//! 纯函数，永不失败；只保证成本有界、剔除最明显的恶意片段。

use std::sync::OnceLock;

use regex::Regex;

/// 默认最大字符数
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2000;

static SCRIPT_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static EVENT_HANDLER_RE: OnceLock<Regex> = OnceLock::new();
static JS_URL_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static SQL_RE: OnceLock<Vec<Regex>> = OnceLock::new();

/// 先剔除注入惯用片段，再剔除单独的 SQL 关键字
const SQL_PATTERNS: &[&str] = &[
    r"(?i)'\s*or\s+'?1'?\s*=\s*'?1'?",
    r";\s*--",
    r"(?i)\b(?:select|insert|update|delete|drop|create|alter|truncate|exec(?:ute)?|union)\b",
];

fn script_block_re() -> &'static Regex {
    SCRIPT_BLOCK_RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|iframe)\b[^>]*>.*?</(?:script|style|iframe)\s*>")
            .unwrap()
    })
}

fn event_handler_re() -> &'static Regex {
    EVENT_HANDLER_RE
        .get_or_init(|| Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap())
}

fn js_url_re() -> &'static Regex {
    JS_URL_RE.get_or_init(|| Regex::new(r"(?i)javascript\s*:").unwrap())
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap())
}

fn sql_res() -> &'static [Regex] {
    SQL_RE.get_or_init(|| SQL_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect())
}

/// 按默认上限清洗
pub fn sanitize(raw: &str) -> String {
    sanitize_with_limit(raw, DEFAULT_MAX_INPUT_CHARS)
}

/// 清洗并截断到 max_chars 个字符（按 char 计，不会切断 UTF-8）
pub fn sanitize_with_limit(raw: &str, max_chars: usize) -> String {
    let mut text = script_block_re().replace_all(raw, "").into_owned();
    text = event_handler_re().replace_all(&text, "").into_owned();
    text = js_url_re().replace_all(&text, "").into_owned();
    text = tag_re().replace_all(&text, "").into_owned();

    let mut hits = 0usize;
    for re in sql_res() {
        if re.is_match(&text) {
            hits += 1;
            text = re.replace_all(&text, "").into_owned();
        }
    }
    if hits > 0 {
        tracing::warn!(patterns = hits, "Stripped SQL-like patterns from user input");
    }

    let trimmed = text.trim();
    truncate_chars(trimmed, max_chars).trim_end().to_string()
}

/// 截取前 max_chars 个字符
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(
            sanitize("  How do I pick the right index?  "),
            "How do I pick the right index?"
        );
    }

    #[test]
    fn test_bare_sql_keywords_removed() {
        let raw = format!(
            "<script>x()</script> please SELECT everything and DROP it {}",
            "f".repeat(3000)
        );
        let out = sanitize(&raw);
        assert!(!out.contains("SELECT"));
        assert!(!out.contains("DROP"));
        assert!(out.starts_with("please"));
        assert!(out.contains("everything and"));
        assert!(out.chars().count() <= 2000);

        let out = sanitize("Update the row, then Create a view");
        assert_eq!(out, "the row, then  a view");
    }

    #[test]
    fn test_keyword_inside_word_kept() {
        assert_eq!(sanitize("selection dropdown updates"), "selection dropdown updates");
    }

    #[test]
    fn test_removes_script_sql_and_bounds_length() {
        let raw = format!(
            "<script>alert('x')</script> hello; DROP TABLE users; {}",
            "a".repeat(3000)
        );
        let out = sanitize(&raw);
        assert!(out.chars().count() <= 2000);
        assert!(!out.to_lowercase().contains("<script"));
        assert!(!out.contains("alert"));
        assert!(!out.to_lowercase().contains("drop table"));
        assert!(out.starts_with("hello;"));
    }

    #[test]
    fn test_sql_patterns_case_insensitive() {
        let out = sanitize("x' Or '1'='1 then uNiOn SeLeCt password; delete FROM t");
        let lower = out.to_lowercase();
        assert!(!lower.contains("union"));
        assert!(!lower.contains("select"));
        assert!(!lower.contains("delete"));
        assert!(lower.contains("password"));
        assert!(!lower.contains("'1'='1"));
    }

    #[test]
    fn test_strips_handlers_and_tags() {
        let out = sanitize(r#"<img src=x onerror="steal()"><a href="javascript:go()">link</a> 3 < 4"#);
        assert!(!out.contains("onerror"));
        assert!(!out.to_lowercase().contains("javascript:"));
        assert!(!out.contains("<a"));
        assert!(out.contains("link"));
        assert!(out.contains("3 < 4"));
    }

    #[test]
    fn test_empty_and_hostile_only() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("<script>x</script>"), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "学习".repeat(10);
        assert_eq!(truncate_chars(&s, 3), "学习学");
        assert_eq!(sanitize_with_limit(&s, 5).chars().count(), 5);
    }
}
