use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid API response: {0}")]
    ParseError(String),

    #[error("Remote endpoint returned {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("Sync endpoint URL is not configured")]
    NotConfigured,

    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}
