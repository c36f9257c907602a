#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found (404): {0}")]
    NotFound(String),

    #[error("Server error (5xx): {0}")]
    ServerError(String),

    #[error("Unexpected response: {0}")]
    UnexpectedStatus(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
