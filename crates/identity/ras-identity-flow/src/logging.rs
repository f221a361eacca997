//! Prefix-tagged logging with secret redaction.
//!
//! Structured fields pass through [`redact`] before they reach `tracing`, so a
//! field named like a secret is replaced by [`REDACTED`] whatever its value.

use serde_json::Value;
use tracing::{debug, error, info, warn};

pub const REDACTED: &str = "[REDACTED]";

/// Lower-cased key fragments that mark a field as sensitive
const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "secret",
    "token",
    "code",
    "assertion",
    "certificate",
    "password",
    "private_key",
    "samlrequest",
    "samlresponse",
];

/// Maximum length of URLs written to log lines
pub const MAX_LOGGED_URL_CHARS: usize = 50;

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}

/// Copy of `value` with every sensitive field replaced, at any depth
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Shorten `value` to at most `max_chars` characters, marking the cut with `...`
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(max_chars).collect();
    shortened.push_str("...");
    shortened
}

/// Logger bound to one flow component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLogger {
    prefix: &'static str,
}

impl FlowLogger {
    pub const OAUTH: FlowLogger = FlowLogger::new("[OAuth]");
    pub const OIDC: FlowLogger = FlowLogger::new("[OIDC]");
    pub const SAML: FlowLogger = FlowLogger::new("[SAML]");
    pub const VALIDATOR: FlowLogger = FlowLogger::new("[FlowValidator]");

    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// The exact line handed to `tracing`, fields already redacted
    pub fn format(&self, message: &str, fields: &Value) -> String {
        match fields {
            Value::Null => format!("{} {}", self.prefix, message),
            Value::Object(map) if map.is_empty() => format!("{} {}", self.prefix, message),
            fields => format!("{} {} {}", self.prefix, message, redact(fields)),
        }
    }

    pub fn debug(&self, message: &str, fields: Value) {
        debug!(component = self.prefix, "{}", self.format(message, &fields));
    }

    pub fn info(&self, message: &str, fields: Value) {
        info!(component = self.prefix, "{}", self.format(message, &fields));
    }

    pub fn warn(&self, message: &str, fields: Value) {
        warn!(component = self.prefix, "{}", self.format(message, &fields));
    }

    pub fn error(&self, message: &str, fields: Value) {
        error!(component = self.prefix, "{}", self.format(message, &fields));
    }

    /// Security-relevant event such as a possible CSRF attempt
    pub fn security_event(&self, message: &str, fields: Value) {
        warn!(
            component = self.prefix,
            security_event = true,
            "{}",
            self.format(message, &fields)
        );
    }
}


#[cfg(test)]
mod tests {
    use super::capture::LogCapture;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensitive_keys() {
        for key in [
            "client_secret",
            "access_token",
            "idToken",
            "code",
            "code_verifier",
            "SAMLAssertion",
            "signing_certificate",
            "password",
            "SAMLRequest",
        ] {
            assert!(is_sensitive_key(key), "{} should be sensitive", key);
        }
        for key in ["provider", "redirect_uri", "scopes", "client_id", "issuer"] {
            assert!(!is_sensitive_key(key), "{} should not be sensitive", key);
        }
    }

    #[test]
    fn test_redact_nested() {
        let redacted = redact(&json!({
            "provider": "google",
            "client_secret": "hunter2",
            "response": {
                "access_token": "abc",
                "items": [{ "refresh_token": "def", "kind": "x" }]
            }
        }));

        assert_eq!(redacted["provider"], "google");
        assert_eq!(redacted["client_secret"], REDACTED);
        assert_eq!(redacted["response"]["access_token"], REDACTED);
        assert_eq!(redacted["response"]["items"][0]["refresh_token"], REDACTED);
        assert_eq!(redacted["response"]["items"][0]["kind"], "x");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://app.example/auth/callback", 11), "https://app...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_format_carries_prefix() {
        let line = FlowLogger::SAML.format("Built request", &json!({ "entity_id": "sp1" }));
        assert!(line.starts_with("[SAML] Built request"));
        assert!(line.contains("sp1"));

        assert_eq!(
            FlowLogger::OAUTH.format("Started", &Value::Null),
            "[OAuth] Started"
        );
    }

    #[test]
    fn test_secrets_never_reach_the_sink() {
        let capture = LogCapture::default();

        capture.run(|| {
            FlowLogger::OAUTH.info(
                "Exchanging",
                json!({ "client_id": "public-id", "client_secret": "hunter2", "code": "xyz123" }),
            );
            FlowLogger::VALIDATOR.security_event("State mismatch", json!({ "id_token": "eyJ" }));
        });

        let output = capture.contents();
        assert!(output.contains("[OAuth] Exchanging"));
        assert!(output.contains("public-id"));
        assert!(!output.contains("hunter2"));
        assert!(!output.contains("xyz123"));
        assert!(!output.contains("eyJ"));
        assert!(output.contains("[FlowValidator] State mismatch"));
        assert!(output.contains("security_event=true"));
    }
}
