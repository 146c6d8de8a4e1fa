use thiserror::Error;

use crate::types::Hosting;

/// How much of a raw response body is kept in a diagnostic.
const SNIPPET_CHARS: usize = 300;

/// Why a single image could not be turned into a shareable URL.
///
/// Every variant is per-item and non-fatal: the orchestrator reports it inline
/// next to any sibling successes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("empty image payload")]
    EmptyPayload,

    #[error("timeout")]
    Timeout,

    #[error("HTTP {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered, but not in a shape any extraction rule recognised.
    #[error("unrecognized response ({reason}): {snippet}")]
    Parse { reason: String, snippet: String },

    #[error("upload bounced back to the landing page")]
    LandingPage,

    #[error("{0} is not configured")]
    Unavailable(Hosting),
}

impl UploadError {
    pub fn parse(reason: impl Into<String>, body: &str) -> Self {
        Self::Parse {
            reason: reason.into(),
            snippet: body_snippet(body),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            snippet: body_snippet(body),
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// First few hundred characters of a body, whitespace collapsed.
pub fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}
