// Error types for the library surface. The binary wraps these in
// `anyhow` with extra context; the variants here are the failures a
// caller may want to tell apart (bad token vs. missing gist vs. network).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GistError>;

#[derive(Debug, Error)]
pub enum GistError {
    /// The server rejected the token (401 or 403).
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("gist not found: {0}")]
    NotFound(String),

    /// Transport-level failure: DNS, TLS, connection reset, timeout.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// File content could not be turned back into UTF-8 text.
    #[error("cannot decode content of '{file}': {reason}")]
    Decode { file: String, reason: String },

    /// Any other non-success status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The server answered 2xx but the body was not what we expected.
    #[error("unexpected response: {0}")]
    Response(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("editor error: {0}")]
    Editor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GistError::Response(err.to_string())
        } else {
            GistError::Network(err)
        }
    }
}

impl GistError {
    /// Whether the error came from the server refusing our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, GistError::Auth { .. })
    }
}
