//! Ordered regex registry of sensitive endpoint references.
//!
//! Ships with built-in patterns for the document backend:
//!
//! | Name | Matches |
//! |------|---------|
//! | `oneoff-worker` | the one-off signing worker host |
//! | `validate-worker` | the key validation worker host |
//! | `object-storage` | any `*.r2.cloudflarestorage.com` host |
//! | `workers-dev` | any `*.workers.dev` host |
//! | `signed-url` | "signed ... url" phrases, case-insensitive |
//! | `validatekey` | the validation endpoint name, case-insensitive |
//! | `cryptograph` | the signing endpoint name, case-insensitive |
//!
//! The list deliberately over-matches: a false positive costs a redaction,
//! a false negative leaks an endpoint.

use std::sync::LazyLock;

use regex::Regex;

use super::Finding;
use crate::config::PatternsConfig;
use crate::error::Result;

/// A named, compiled matcher.
#[derive(Debug, Clone)]
pub struct PatternDef {
    pub name: String,
    pub regex: Regex,
}

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    (
        "oneoff-worker",
        r"(?i)cryptograph-oneoff\.shubhham-jain\.workers\.dev",
    ),
    ("validate-worker", r"(?i)validatekey\.shubhham-jain\.workers\.dev"),
    (
        "object-storage",
        r"(?i)(?:[a-z0-9-]+\.)*r2\.cloudflarestorage\.com",
    ),
    ("workers-dev", r"(?i)(?:[a-z0-9-]+\.)*workers\.dev"),
    ("signed-url", r"(?i)signed.*url"),
    ("validatekey", r"(?i)validatekey"),
    ("cryptograph", r"(?i)cryptograph"),
];

static BUILTIN: LazyLock<Vec<PatternDef>> = LazyLock::new(|| {
    BUILTIN_SOURCES
        .iter()
        .map(|(name, source)| PatternDef {
            name: (*name).to_string(),
            regex: Regex::new(source).expect("built-in pattern compiles"),
        })
        .collect()
});

/// Fixed, ordered set of sensitive-string matchers.
///
/// Detection is "any pattern matches"; order only affects replacement, where
/// each pattern rewrites the output of the previous one.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<PatternDef>,
}

impl PatternRegistry {
    /// Registry with all built-in patterns.
    pub fn new() -> Self {
        Self {
            patterns: BUILTIN.clone(),
        }
    }

    /// Registry with no patterns; nothing is ever sensitive.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Build from configuration: built-ins (if enabled) followed by `extra`.
    pub fn from_config(config: &PatternsConfig) -> Result<Self> {
        let mut registry = if config.builtin {
            Self::new()
        } else {
            Self::empty()
        };
        for (i, source) in config.extra.iter().enumerate() {
            registry.push(&format!("extra-{}", i), source)?;
        }
        Ok(registry)
    }

    /// Append a pattern. Fails if `source` is not a valid regex.
    pub fn push(&mut self, name: &str, source: &str) -> Result<()> {
        let regex = Regex::new(source)?;
        self.patterns.push(PatternDef {
            name: name.to_string(),
            regex,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// Replace every match of every pattern, in registry order, with `replacement`.
    pub fn redact_all(&self, text: &str, replacement: &str) -> String {
        let mut out = text.to_string();
        for def in &self.patterns {
            if def.regex.is_match(&out) {
                out = def
                    .regex
                    .replace_all(&out, regex::NoExpand(replacement))
                    .into_owned();
            }
        }
        out
    }

    /// Report which patterns match, with the matched text abbreviated.
    pub fn scan(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for def in &self.patterns {
            for mat in def.regex.find_iter(text) {
                findings.push(Finding {
                    pattern_name: def.name.clone(),
                    matched_text: abbreviate(mat.as_str()),
                });
            }
        }
        findings
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First 4 and last 4 chars, so findings can be logged without leaking the match.
fn abbreviate(matched: &str) -> String {
    let chars: Vec<char> = matched.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_patterns_in_order() {
        let registry = PatternRegistry::new();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "oneoff-worker",
                "validate-worker",
                "object-storage",
                "workers-dev",
                "signed-url",
                "validatekey",
                "cryptograph",
            ]
        );
    }

    #[test]
    fn matches_backend_hosts() {
        let registry = PatternRegistry::new();
        assert!(registry.matches_any("https://cryptograph-oneoff.shubhham-jain.workers.dev/x"));
        assert!(registry.matches_any("https://validatekey.shubhham-jain.workers.dev"));
        assert!(registry.matches_any("https://anything.else.workers.dev/path"));
        assert!(registry.matches_any("https://acct123.r2.cloudflarestorage.com/bucket/a.pdf"));
    }

    #[test]
    fn matches_endpoint_names_case_insensitively() {
        let registry = PatternRegistry::new();
        assert!(registry.matches_any("calling ValidateKey now"));
        assert!(registry.matches_any("CRYPTOGRAPH"));
        assert!(registry.matches_any("here is your Signed download URL"));
    }

    #[test]
    fn clean_text_does_not_match() {
        let registry = PatternRegistry::new();
        assert!(!registry.matches_any("https://example.com/docs/report.pdf"));
        assert!(!registry.matches_any("plain text with no endpoints"));
    }

    #[test]
    fn redact_all_replaces_every_occurrence() {
        let registry = PatternRegistry::new();
        let text = "a.workers.dev and b.workers.dev";
        let out = registry.redact_all(text, "[PROTECTED]");
        assert_eq!(out, "[PROTECTED] and [PROTECTED]");
    }

    #[test]
    fn redact_all_consumes_whole_subdomain() {
        let registry = PatternRegistry::new();
        let out = registry.redact_all(
            "https://cryptograph-oneoff.shubhham-jain.workers.dev/sign",
            "secure-document-service.local",
        );
        assert_eq!(out, "https://secure-document-service.local/sign");
    }

    #[test]
    fn replacement_is_literal() {
        let registry = PatternRegistry::new();
        let out = registry.redact_all("x.workers.dev", "$1-literal");
        assert_eq!(out, "$1-literal");
    }

    #[test]
    fn empty_registry_never_matches() {
        let registry = PatternRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.matches_any("x.workers.dev"));
        assert_eq!(registry.redact_all("x.workers.dev", "[P]"), "x.workers.dev");
    }

    #[test]
    fn from_config_appends_extra_patterns() {
        let config = PatternsConfig {
            builtin: true,
            extra: vec![r"files\.corp\.example".to_string()],
        };
        let registry = PatternRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 8);
        assert!(registry.matches_any("https://files.corp.example/a"));
    }

    #[test]
    fn from_config_without_builtins() {
        let config = PatternsConfig {
            builtin: false,
            extra: vec!["secret-host".to_string()],
        };
        let registry = PatternRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.matches_any("x.workers.dev"));
        assert!(registry.matches_any("secret-host"));
    }

    #[test]
    fn invalid_extra_pattern_is_rejected() {
        let config = PatternsConfig {
            builtin: true,
            extra: vec!["(unclosed".to_string()],
        };
        let err = PatternRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, crate::error::ShieldError::Pattern(_)));
    }

    #[test]
    fn scan_abbreviates_matches() {
        let registry = PatternRegistry::new();
        let findings = registry.scan("see validatekey.shubhham-jain.workers.dev");
        let finding = findings
            .iter()
            .find(|f| f.pattern_name == "validate-worker")
            .expect("should find validate-worker");
        assert_eq!(finding.matched_text, "vali....dev");
        assert!(!finding.matched_text.contains("shubhham"));
    }

    #[test]
    fn scan_masks_short_matches_entirely() {
        let registry = PatternRegistry::new();
        let findings = registry.scan("cryptograph");
        let finding = findings
            .iter()
            .find(|f| f.pattern_name == "cryptograph")
            .expect("should find cryptograph");
        assert_eq!(finding.matched_text, "***********");
    }
}
