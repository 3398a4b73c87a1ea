/// SSRF guard rejections.
///
/// The `rule` and `target` fields exist for internal logging; callers that
/// relay failures to an untrusted origin must use [`SsrfError::public_message`]
/// instead of `Display`, which would leak the triggering rule.
#[derive(Debug, thiserror::Error)]
pub enum SsrfError {
    #[error("invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("request to {target} rejected by rule {rule}")]
    Rejected { rule: String, target: String },
}

impl SsrfError {
    pub fn rejected(rule: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Rejected {
            rule: rule.into(),
            target: target.into(),
        }
    }

    /// Aggregate message safe to surface upstream.
    pub fn public_message(&self) -> &'static str {
        "host not allowed"
    }
}
