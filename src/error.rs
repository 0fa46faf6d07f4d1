use thiserror::Error;

/// Failures talking to the Sutro GraphQL API.
#[derive(Debug, Error)]
pub enum SutroError {
    /// Bad credentials, or the login response carried no token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure: connection refused, timeout, non-2xx status.
    #[error("Cannot connect to Sutro API: {0}")]
    Connect(String),

    /// Body was not JSON, or the JSON did not have the expected shape.
    #[error("Unexpected response from Sutro API: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SutroError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SutroError::Parse(err.to_string())
        } else {
            SutroError::Connect(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SutroError {
    fn from(err: serde_json::Error) -> Self {
        SutroError::Parse(err.to_string())
    }
}
