use thiserror::Error;

/// Failures talking to the hosted text-generation endpoint.
///
/// None of these reach the end user: the insight service turns every one of
/// them into a fallback string or "no signal".
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("API credential is not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Malformed structured response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for InsightError {
    fn from(e: reqwest::Error) -> Self {
        InsightError::Transport(e.to_string())
    }
}

/// Failures of the live analyst session
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LiveError {
    #[error("Microphone access denied: {0}")]
    CaptureDenied(String),

    #[error("Live session already {0}")]
    AlreadyRunning(&'static str),

    #[error("Failed to open live session: {0}")]
    ConnectFailed(String),

    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),
}

/// Mock sign-in failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Rejected calculator input
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = InsightError::Status {
            status: 429,
            body: "quota".into(),
        };
        assert_eq!(e.to_string(), "Endpoint returned status 429: quota");
        assert_eq!(
            LiveError::AlreadyRunning("active").to_string(),
            "Live session already active"
        );
        assert_eq!(
            AuthError::MissingField("email").to_string(),
            "Missing field: email"
        );
    }
}
