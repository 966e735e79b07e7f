//! Privacy filters applied to commit metadata before it leaves the machine

use regex::Regex;
use std::sync::LazyLock;

/// Replacement written in place of every sensitive match.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Maximum length of a sanitized message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// Applied one after another, in this order.
const SENSITIVE_PATTERNS: [&str; 7] = [
    r"(?i)api[_-]?key",
    r"(?i)password",
    r"(?i)secret",
    r"(?i)token",
    r"(?i)credential",
    r"(?i)private[_-]?key",
    r"(?i)auth[_-]?token",
];

static SENSITIVE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SENSITIVE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Redacts credentials-looking words and caps the message length.
///
/// Messages longer than [`MAX_MESSAGE_CHARS`] are cut to 197 characters
/// followed by `...`, so the result is never longer than 200 characters.
pub fn sanitize_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for pattern in SENSITIVE.iter() {
        sanitized = pattern
            .replace_all(&sanitized, REDACTION_MARKER)
            .into_owned();
    }

    if sanitized.chars().count() > MAX_MESSAGE_CHARS {
        let keep = MAX_MESSAGE_CHARS - ELLIPSIS.len();
        let mut truncated: String = sanitized.chars().take(keep).collect();
        truncated.push_str(ELLIPSIS);
        return truncated;
    }

    sanitized
}

/// Masks the local part of an email address, keeping its first character
/// and the domain: `jdoe@example.com` → `j***@example.com`.
///
/// Values without `@` are returned unchanged.
pub fn anonymize_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => email.to_string(),
    }
}
