//! Keyword classification of feedback text.

use super::types::FeedbackCategory;
use regex::Regex;
use std::sync::LazyLock;

/// Category patterns, checked in order; the first match wins.
static RULES: LazyLock<Vec<(FeedbackCategory, Regex)>> = LazyLock::new(|| {
    [
        (
            FeedbackCategory::Feature,
            r"(?i)功能|增加|添加|\b(?:feature|add|support)\b",
        ),
        (
            FeedbackCategory::Bug,
            r"(?i)错误|失败|\b(?:bug|error|crash|fails?|broken)\b",
        ),
        (
            FeedbackCategory::Performance,
            r"(?i)慢|性能|响应|\b(?:slow|performance|latency|lag)\b",
        ),
        (
            FeedbackCategory::Ux,
            r"(?i)难用|不直观|操作|\b(?:confusing|usability|unintuitive)\b",
        ),
        (
            FeedbackCategory::Doc,
            r"(?i)文档|说明|帮助|\b(?:docs?|documentation|help)\b",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| {
        (
            category,
            Regex::new(pattern).expect("category pattern is valid"),
        )
    })
    .collect()
});

/// Classifies feedback text by keyword.
#[must_use]
pub fn classify(content: &str) -> FeedbackCategory {
    RULES
        .iter()
        .find(|(_, re)| re.is_match(content))
        .map_or(FeedbackCategory::Other, |(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(RULES.len(), 5);
    }

    #[test]
    fn test_chinese_keywords() {
        assert_eq!(classify("希望增加导出功能"), FeedbackCategory::Feature);
        assert_eq!(classify("登录失败"), FeedbackCategory::Bug);
        assert_eq!(classify("页面加载太慢"), FeedbackCategory::Performance);
        assert_eq!(classify("界面难用"), FeedbackCategory::Ux);
        assert_eq!(classify("缺少文档"), FeedbackCategory::Doc);
    }

    #[test]
    fn test_english_keywords() {
        assert_eq!(classify("Please ADD dark mode"), FeedbackCategory::Feature);
        assert_eq!(classify("The app crashes... crash on save"), FeedbackCategory::Bug);
        assert_eq!(classify("Search is slow"), FeedbackCategory::Performance);
        assert_eq!(classify("The docs are outdated"), FeedbackCategory::Doc);
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(classify("Wrong address shown"), FeedbackCategory::Other);
        assert_eq!(classify("Looks great"), FeedbackCategory::Other);
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(classify("Add a retry when upload fails"), FeedbackCategory::Feature);
    }
}
