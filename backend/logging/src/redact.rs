//! Log Redaction
//!
//! Scrubs bot tokens and bearer credentials from strings before logging.
//! Telegram transport errors embed the request URL, which carries the bot token.

use std::sync::LazyLock;

use regex::Regex;

static BOT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}:[A-Za-z0-9_-]{30,}").expect("valid bot token regex"));
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").expect("valid bearer regex"));

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BOT_TOKEN_RE.replace_all(input, "[REDACTED_BOT_TOKEN]");
    BEARER_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_token_from_request_url() {
        let raw = "error sending request for url (https://api.telegram.org/bot123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw/GetFile)";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"));
        assert!(clean.contains("bot[REDACTED_BOT_TOKEN]/GetFile"));
    }

    #[test]
    fn strips_bearer_and_keeps_ids() {
        let clean = redact_sensitive_data("chat 5551234567 with Bearer eyJhbGciOiJIUzI1NiJ9");
        assert!(clean.contains("5551234567"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiJ9"));
    }
}
