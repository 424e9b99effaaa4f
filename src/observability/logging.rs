//! Logging utilities with sensitive data redaction.

use std::fmt;

/// Wrapper for sensitive data that redacts on display
#[derive(Clone)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    /// Create a new redacted value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Get the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Redact a shared secret, keeping only its length
pub fn redact_secret(secret: &str) -> String {
    format!("[REDACTED; {} chars]", secret.len())
}

/// Shorten a signature header for logs
///
/// Keeps the algorithm prefix and the first eight digest characters,
/// enough to correlate deliveries without publishing the MAC.
pub fn redact_signature(signature: &str) -> String {
    let (prefix, digest) = match signature.split_once('=') {
        Some((prefix, digest)) => (prefix, digest),
        None => return "[REDACTED]".to_string(),
    };

    match digest.get(..8) {
        Some(head) if digest.len() > 8 => format!("{}={}...", prefix, head),
        _ => format!("{}=[REDACTED]", prefix),
    }
}

/// Redact a URL, hiding secrets in query parameters
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let value = if is_sensitive_param(&k) {
                        "[REDACTED]".to_string()
                    } else {
                        v.into_owned()
                    };
                    (k.into_owned(), value)
                })
                .collect();

            if pairs.is_empty() {
                return parsed.into();
            }

            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.into()
        }
        Err(_) => "[INVALID URL]".to_string(),
    }
}

fn is_sensitive_param(key: &str) -> bool {
    ["token", "secret", "access_token", "client_secret"]
        .iter()
        .any(|s| key.eq_ignore_ascii_case(s))
}
