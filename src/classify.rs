use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{KakeiError, Result};

/// One classification rule: a category label and the merchant patterns that
/// put a spend into it.
pub struct Rule {
    pub category: String,
    pub patterns: Vec<Regex>,
}

/// Household classification rules. Merchant strings in exports are
/// half-width-katakana noise, so these are plain regexes over the normalized
/// merchant text, maintained by the user in a JSON file.
pub struct RuleBook {
    pub driver: Vec<Rule>,
    pub special: Vec<Rule>,
    pub bank_exclude: Vec<Regex>,
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    driver: Vec<RawRule>,
    #[serde(default)]
    special: Vec<RawRule>,
    #[serde(default)]
    bank_exclude: Vec<String>,
}

#[derive(Deserialize)]
struct RawRule {
    category: String,
    patterns: Vec<String>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| KakeiError::Other(format!("bad rule pattern {pattern:?}: {e}")))
}

fn compile_rules(raw: Vec<RawRule>) -> Result<Vec<Rule>> {
    raw.into_iter()
        .map(|r| {
            Ok(Rule {
                category: r.category,
                patterns: r.patterns.iter().map(|p| compile(p)).collect::<Result<_>>()?,
            })
        })
        .collect()
}

impl RuleBook {
    /// Without a rules file every spend classifies to the fallback bucket and
    /// nothing is excluded; the report still renders.
    pub fn empty() -> Self {
        RuleBook {
            driver: Vec::new(),
            special: Vec::new(),
            bank_exclude: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: RuleFile = serde_json::from_str(&text)
            .map_err(|e| KakeiError::Other(format!("bad rules file {}: {e}", path.display())))?;
        Ok(RuleBook {
            driver: compile_rules(raw.driver)?,
            special: compile_rules(raw.special)?,
            bank_exclude: raw
                .bank_exclude
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_>>()?,
        })
    }

    pub fn is_bank_excluded(&self, merchant: &str) -> bool {
        self.bank_exclude.iter().any(|re| re.is_match(merchant))
    }
}

/// Merchant text as the rules see it: NFKC-folded so half-width katakana and
/// full-width latin match rules written either way, upper-cased, runs of
/// whitespace collapsed to single spaces.
pub fn normalize_merchant(value: &str) -> String {
    value
        .nfkc()
        .collect::<String>()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First rule with a matching pattern wins; rule order in the file is the
/// priority order.
pub fn classify<'a>(merchant: &str, rules: &'a [Rule], fallback: &'a str) -> &'a str {
    for rule in rules {
        if rule.patterns.iter().any(|re| re.is_match(merchant)) {
            return &rule.category;
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn book(json: &str) -> RuleBook {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        RuleBook::load(file.path()).unwrap()
    }

    #[test]
    fn test_load_and_classify() {
        let book = book(
            r#"{
                "driver": [
                    {"category": "食費・日用品", "patterns": ["セブンイレブン", "ローソン"]},
                    {"category": "交通・車", "patterns": ["ENEOS", "ETC"]}
                ],
                "bank_exclude": ["ラクテンカ-ド"]
            }"#,
        );
        assert_eq!(
            classify("セブンイレブン1234", &book.driver, "その他"),
            "食費・日用品"
        );
        assert_eq!(classify("ENEOS SS", &book.driver, "その他"), "交通・車");
        assert_eq!(classify("不明な店", &book.driver, "その他"), "その他");
        assert!(book.is_bank_excluded("ラクテンカ-ドサ-ビス"));
        assert!(book.special.is_empty());
    }

    #[test]
    fn test_rule_order_is_priority() {
        let book = book(
            r#"{"driver": [
                {"category": "first", "patterns": ["AMAZON"]},
                {"category": "second", "patterns": ["AMAZON"]}
            ]}"#,
        );
        assert_eq!(classify("AMAZON.CO.JP", &book.driver, "x"), "first");
    }

    #[test]
    fn test_empty_pattern_matches_blank_merchant() {
        let book = book(r#"{"special": [{"category": "要確認(摘要空欄)", "patterns": ["^$"]}]}"#);
        assert_eq!(classify("", &book.special, "その他特別"), "要確認(摘要空欄)");
        assert_eq!(classify("店", &book.special, "その他特別"), "その他特別");
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"driver": [{"category": "x", "patterns": ["("]}]}"#)
            .unwrap();
        assert!(RuleBook::load(file.path()).is_err());
    }

    #[test]
    fn test_normalize_merchant() {
        assert_eq!(normalize_merchant("amazon  co\u{3000}jp"), "AMAZON CO JP");
        assert_eq!(normalize_merchant(""), "");
    }

    #[test]
    fn test_normalize_merchant_folds_width() {
        assert_eq!(normalize_merchant("ｾﾌﾞﾝｲﾚﾌﾞﾝ"), "セブンイレブン");
        assert_eq!(normalize_merchant("ＡＭＡＺＯＮ　ｃｏ"), "AMAZON CO");
        let book = book(r#"{"driver": [{"category": "食費", "patterns": ["セブンイレブン"]}]}"#);
        assert_eq!(
            classify(&normalize_merchant("ｾﾌﾞﾝｲﾚﾌﾞﾝ 1234"), &book.driver, "その他"),
            "食費"
        );
    }
}
