use std::{error::Error as StdError, fmt};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl LlmHttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LlmHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to a chat-completions endpoint.
#[derive(Debug)]
pub struct LlmHttpError {
    kind: LlmHttpErrorKind,
    status: Option<u16>,
    url: String,
    message: String,
    source: Option<anyhow::Error>,
}

impl LlmHttpError {
    pub fn kind(&self) -> LlmHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let kind = if err.is_timeout() {
            LlmHttpErrorKind::Timeout
        } else if err.is_connect() {
            LlmHttpErrorKind::Connect
        } else if err.is_request() {
            LlmHttpErrorKind::Request
        } else if err.is_body() {
            LlmHttpErrorKind::Body
        } else if err.is_decode() {
            LlmHttpErrorKind::Decode
        } else {
            LlmHttpErrorKind::Unknown
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: url.to_string(),
            message: err.to_string(),
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, url: &str, body: &str) -> Self {
        Self {
            kind: LlmHttpErrorKind::Status,
            status: Some(status),
            url: url.to_string(),
            message: preview_body(body),
            source: None,
        }
    }

    pub(crate) fn decode_error(status: u16, url: &str, reason: impl fmt::Display, body: &str) -> Self {
        Self {
            kind: LlmHttpErrorKind::Decode,
            status: Some(status),
            url: url.to_string(),
            message: format!("{reason} | body={}", preview_body(body)),
            source: None,
        }
    }
}

impl fmt::Display for LlmHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "llm http error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={status}")?;
        }
        write!(f, " url={}: {}", self.url, self.message)
    }
}

impl StdError for LlmHttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_body() {
        assert_eq!(preview_body("  "), "<empty body>");
        let long = "错".repeat(BODY_PREVIEW_LIMIT + 1);
        let p = preview_body(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn test_status_error_display() {
        let err = LlmHttpError::status_error(401, "https://x/v1/chat/completions", "invalid key");
        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=401"));
        assert!(msg.contains("invalid key"));
        assert_eq!(err.kind(), LlmHttpErrorKind::Status);
    }
}
