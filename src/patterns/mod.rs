//! Sensitive-string detection and redaction.
//!
//! [`PatternRegistry`] decides *whether* a string is sensitive; [`Redactor`]
//! bundles it with the placeholders each surface uses and applies the
//! surface-specific pipeline (pattern replacement, then query masking).

pub mod registry;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::config::RedactionConfig;
pub use registry::{PatternDef, PatternRegistry};

/// A single pattern hit, safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub pattern_name: String,
    pub matched_text: String,
}

/// Credential-bearing query assignments that are always masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParam {
    Token,
    Expires,
    File,
}

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"token=[^&\s]+").expect("token mask regex"));
static EXPIRES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"expires=[^&\s]+").expect("expires mask regex"));
static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"file=[^&\s]+").expect("file mask regex"));
static SIGNED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)signed.*url").expect("signed url regex"));

impl QueryParam {
    fn regex(self) -> &'static Regex {
        match self {
            QueryParam::Token => &TOKEN_RE,
            QueryParam::Expires => &EXPIRES_RE,
            QueryParam::File => &FILE_RE,
        }
    }

    fn masked(self) -> &'static str {
        match self {
            QueryParam::Token => "token=***",
            QueryParam::Expires => "expires=***",
            QueryParam::File => "file=***",
        }
    }
}

/// Rewrite every `name=value` assignment of the given params to `name=***`.
pub fn mask_params(text: &str, params: &[QueryParam]) -> String {
    let mut out = text.to_string();
    for param in params {
        out = param
            .regex()
            .replace_all(&out, param.masked())
            .into_owned();
    }
    out
}

/// Looser mask for any "signed ... url" phrase.
pub fn mask_signed_url(text: &str) -> String {
    SIGNED_URL_RE
        .replace_all(text, "signed-url=***")
        .into_owned()
}

const LOCATION_PARAMS: &[QueryParam] = &[QueryParam::Token, QueryParam::Expires];
const ADDRESS_PARAMS: &[QueryParam] = &[QueryParam::Token, QueryParam::Expires, QueryParam::File];

/// Registry plus placeholders; one pipeline per surface.
#[derive(Debug, Clone)]
pub struct Redactor {
    registry: Arc<PatternRegistry>,
    config: RedactionConfig,
}

impl Redactor {
    pub fn new(registry: Arc<PatternRegistry>, config: RedactionConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn is_sensitive(&self, text: &str) -> bool {
        self.registry.matches_any(text)
    }

    /// Console arguments: placeholder, then token/expires, then signed-url phrases.
    pub fn console(&self, text: &str) -> String {
        let out = self.registry.redact_all(text, &self.config.placeholder);
        let out = mask_params(&out, LOCATION_PARAMS);
        mask_signed_url(&out)
    }

    /// Rendered document text. Idempotent.
    pub fn rendered_text(&self, text: &str) -> String {
        let out = self.registry.redact_all(text, &self.config.placeholder);
        mask_params(&out, LOCATION_PARAMS)
    }

    /// Rendered address objects also hide the `file=` assignment.
    pub fn address(&self, text: &str) -> String {
        let out = self
            .registry
            .redact_all(text, &self.config.address_placeholder);
        mask_params(&out, ADDRESS_PARAMS)
    }

    /// Reads of the current location.
    pub fn location(&self, text: &str) -> String {
        let out = self
            .registry
            .redact_all(text, &self.config.location_placeholder);
        mask_params(&out, LOCATION_PARAMS)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(Arc::new(PatternRegistry::new()), RedactionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_serialize_without_full_match() {
        let host = "cryptograph-oneoff.shubhham-jain.workers.dev";
        let findings = PatternRegistry::new().scan(&format!("https://{}/x", host));
        assert!(!findings.is_empty());
        let json = serde_json::to_string(&findings).unwrap();
        assert!(json.contains("\"pattern_name\":\"oneoff-worker\""));
        assert!(json.contains("\"matched_text\""));
        assert!(!json.contains(host));
    }

    #[test]
    fn masks_token_and_expires() {
        let out = mask_params(
            "/doc?token=abc123&expires=999&page=2",
            &[QueryParam::Token, QueryParam::Expires],
        );
        assert_eq!(out, "/doc?token=***&expires=***&page=2");
    }

    #[test]
    fn mask_stops_at_whitespace() {
        let out = mask_params("token=abc next words", &[QueryParam::Token]);
        assert_eq!(out, "token=*** next words");
    }

    #[test]
    fn masking_is_stable() {
        let once = mask_params("token=abc", &[QueryParam::Token]);
        let twice = mask_params(&once, &[QueryParam::Token]);
        assert_eq!(once, twice);
    }

    #[test]
    fn file_only_masked_when_requested() {
        let text = "?file=report.pdf";
        assert_eq!(mask_params(text, &[QueryParam::Token]), text);
        assert_eq!(mask_params(text, &[QueryParam::File]), "?file=***");
    }

    #[test]
    fn signed_url_phrase_is_masked() {
        assert_eq!(
            mask_signed_url("got Signed download URL ok"),
            "got signed-url=*** ok"
        );
    }

    #[test]
    fn console_pipeline_hides_hosts_and_tokens() {
        let redactor = Redactor::default();
        let out = redactor.console("GET https://x.workers.dev/a?token=s3cr3t");
        assert_eq!(out, "GET https://[PROTECTED]/a?token=***");
    }

    #[test]
    fn address_pipeline_uses_address_placeholder() {
        let redactor = Redactor::default();
        let out = redactor.address("https://b.r2.cloudflarestorage.com/k?file=a.pdf&token=t");
        assert_eq!(out, "https://secure-document-service.local/k?file=***&token=***");
    }

    #[test]
    fn location_pipeline_keeps_file_param() {
        let redactor = Redactor::default();
        let out = redactor.location("https://viewer.example/?file=a.pdf&expires=1");
        assert_eq!(out, "https://viewer.example/?file=a.pdf&expires=***");
    }

    #[test]
    fn rendered_text_is_idempotent() {
        let redactor = Redactor::default();
        let text = "fetch https://cryptograph-oneoff.shubhham-jain.workers.dev?token=a&expires=b signed link url";
        let once = redactor.rendered_text(text);
        assert_eq!(redactor.rendered_text(&once), once);
        assert!(!once.contains("workers.dev"));
    }
}
