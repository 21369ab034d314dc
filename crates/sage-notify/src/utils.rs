//! Utility functions for outbound transports

/// Maximum length of a response body kept in log lines.
pub const MAX_BODY_LENGTH: usize = 500;

/// Truncate a string to at most `max_len` bytes without splitting a character.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

/// Redact the secret part of a webhook URL for logging.
///
/// Chat webhooks carry their credential in the path, so only the scheme and
/// host are kept.
pub fn redact_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => return "***".to_string(),
    };
    let host = rest.split(['/', '?']).next().unwrap_or_default();
    if rest.len() > host.len() {
        format!("{scheme}://{host}/***")
    } else {
        format!("{scheme}://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 5), "hello... [truncated]");
        assert_eq!(truncate_string("héllo", 2), "h... [truncated]");
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://hooks.slack.com/services/T000/B000/XXXX"),
            "https://hooks.slack.com/***"
        );
        assert_eq!(redact_url("http://drone-bridge:8090"), "http://drone-bridge:8090");
        assert_eq!(redact_url("not a url"), "***");
        assert_eq!(redact_url(""), "");
    }
}
