use std::fmt;

use tracing::debug;

#[derive(Debug, PartialEq)]
pub enum Error {
    Transport(String),
    // non-2xx answer, body and content type kept verbatim
    Status {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    InvalidPayload(String),
    InvalidResource(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Transport(err) => write!(f, "Upstream request failed: {err}"),
            Error::Status { status, .. } => write!(f, "Upstream answered with status {status}"),
            Error::InvalidPayload(err) => write!(f, "Invalid upstream payload: {err}"),
            Error::InvalidResource(err) => write!(f, "Invalid resource: {err}"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        debug!("HTTP client error: {error}");
        if error.is_decode() {
            Error::InvalidPayload(error.to_string())
        } else {
            Error::Transport(error.to_string())
        }
    }
}
