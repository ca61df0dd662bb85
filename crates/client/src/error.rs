use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with `success: false` or a non-2xx status.
    #[error("API error ({status}): {error}: {message}")]
    Api {
        status: u16,
        error: String,
        message: String,
    },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
