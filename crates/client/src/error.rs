use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered 401. The stored token has already been cleared;
    /// callers should send the user back to the login screen.
    #[error("session expired or missing, please log in again")]
    Unauthorized,
    #[error("request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("response envelope carried no data")]
    MissingData,
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// HTTP status behind the failure, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
