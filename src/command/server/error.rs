use std::fmt;

use hyper::body::Bytes;
use hyper::StatusCode;
use serde_json::json;
use tracing::warn;

use crate::{character, upstream};

#[derive(Debug, PartialEq)]
pub enum Error {
    Initialization(String),
    Execution(String),
    // mappable to classical HTTP responses
    BadRequest(String),
    NotFound(String),
    Internal(String),
    // upstream answer relayed as-is
    UpstreamStatus {
        status_code: StatusCode,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    Custom {
        status_code: StatusCode,
        code: String,
        msg: Option<String>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Initialization(err) | Error::Execution(err) => write!(f, "{err}"),
            Error::BadRequest(err) => write!(f, "Bad Request: {err}"),
            Error::NotFound(err) => write!(f, "Not Found: {err}"),
            Error::Internal(err) => write!(f, "Internal Server Error: {err}"),
            Error::UpstreamStatus { status_code, .. } => {
                write!(f, "Upstream answered {status_code}")
            }
            Error::Custom {
                status_code,
                code: message,
                msg: details,
            } => {
                if let Some(details) = details {
                    write!(f, "Error {status_code}: {message} - {details}")
                } else {
                    write!(f, "Error {status_code}: {message}")
                }
            }
        }
    }
}

impl From<character::Error> for Error {
    fn from(error: character::Error) -> Self {
        match error {
            character::Error::Upstream(upstream::Error::Status {
                status,
                content_type,
                body,
            }) => match StatusCode::from_u16(status) {
                Ok(status_code) => Error::UpstreamStatus {
                    status_code,
                    content_type,
                    body,
                },
                Err(_) => {
                    warn!("Upstream answered with invalid status code {status}");
                    Error::Custom {
                        status_code: StatusCode::BAD_GATEWAY,
                        code: "UPSTREAM_INVALID_STATUS".to_string(),
                        msg: Some(format!("Upstream answered with status {status}")),
                    }
                }
            },
            character::Error::Upstream(upstream::Error::Transport(msg)) => Error::Custom {
                status_code: StatusCode::BAD_GATEWAY,
                code: "UPSTREAM_UNREACHABLE".to_string(),
                msg: Some(msg),
            },
            character::Error::Upstream(upstream::Error::InvalidPayload(msg)) => Error::Custom {
                status_code: StatusCode::BAD_GATEWAY,
                code: "UPSTREAM_INVALID_PAYLOAD".to_string(),
                msg: Some(msg),
            },
            character::Error::Upstream(upstream::Error::InvalidResource(msg)) => {
                Error::NotFound(msg)
            }
            character::Error::Cache(err) => Error::Custom {
                status_code: StatusCode::SERVICE_UNAVAILABLE,
                code: "CACHE_UNAVAILABLE".to_string(),
                msg: Some(format!("Cache lookup failed: {err}")),
            },
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Initialization(_) | Error::Execution(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::UpstreamStatus { status_code, .. } | Error::Custom { status_code, .. } => {
                *status_code
            }
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            Error::UpstreamStatus {
                content_type: Some(content_type),
                ..
            } => content_type,
            _ => "application/json",
        }
    }

    /// Response body: the upstream answer verbatim when relayed, a JSON error document otherwise.
    pub fn body(&self, request_id: Option<&String>) -> Bytes {
        let (code, message) = match self {
            Error::UpstreamStatus { body, .. } => return Bytes::from(body.clone()),
            Error::BadRequest(msg) => ("BAD_REQUEST", Some(msg.as_str())),
            Error::NotFound(msg) => ("NOT_FOUND", Some(msg.as_str())),
            Error::Initialization(msg) | Error::Execution(msg) | Error::Internal(msg) => {
                ("INTERNAL_SERVER_ERROR", Some(msg.as_str()))
            }
            Error::Custom { code, msg, .. } => (code.as_str(), msg.as_deref()),
        };

        let document = if let Some(request_id) = request_id {
            json!({
                "errors": [{
                    "code": code,
                    "message": message,
                    "detail": { "request_id": request_id }
                }]
            })
        } else {
            json!({
                "errors": [{
                    "code": code,
                    "message": message,
                }]
            })
        };

        Bytes::from(document.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache;

    #[test]
    fn test_error_display() {
        let error = Error::Initialization("Some init error".to_string());
        assert_eq!(format!("{error}"), "Some init error");

        let error = Error::BadRequest("unsupported route: POST /".to_string());
        assert_eq!(format!("{error}"), "Bad Request: unsupported route: POST /");

        let error = Error::NotFound("unknown route: GET /episodes".to_string());
        assert_eq!(format!("{error}"), "Not Found: unknown route: GET /episodes");

        let error = Error::UpstreamStatus {
            status_code: StatusCode::NOT_FOUND,
            content_type: None,
            body: vec![],
        };
        assert_eq!(format!("{error}"), "Upstream answered 404 Not Found");

        let error = Error::Custom {
            status_code: StatusCode::BAD_GATEWAY,
            code: "UPSTREAM_UNREACHABLE".to_string(),
            msg: Some("connection refused".to_string()),
        };
        assert_eq!(
            format!("{error}"),
            "Error 502 Bad Gateway: UPSTREAM_UNREACHABLE - connection refused"
        );
    }

    fn body_json(error: &Error, request_id: Option<&String>) -> serde_json::Value {
        serde_json::from_slice(&error.body(request_id)).unwrap()
    }

    #[test]
    fn test_upstream_status_is_relayed() {
        let body = br#"{"error":"Character not found"}"#.to_vec();
        let error: Error = character::Error::Upstream(upstream::Error::Status {
            status: 404,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.clone(),
        })
        .into();

        assert_eq!(
            error,
            Error::UpstreamStatus {
                status_code: StatusCode::NOT_FOUND,
                content_type: Some("application/json; charset=utf-8".to_string()),
                body: body.clone(),
            }
        );
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.content_type(), "application/json; charset=utf-8");
        assert_eq!(error.body(Some(&"ignored".to_string())), body);
    }

    #[test]
    fn test_upstream_status_without_content_type() {
        let error: Error = character::Error::Upstream(upstream::Error::Status {
            status: 500,
            content_type: None,
            body: b"oops".to_vec(),
        })
        .into();

        assert_eq!(error.content_type(), "application/json");
        assert_eq!(error.body(None), "oops");
    }

    #[test]
    fn test_invalid_resource_is_not_found() {
        let error: Error = character::Error::Upstream(upstream::Error::InvalidResource(
            "invalid character id `..`".to_string(),
        ))
        .into();

        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(&error, None)["errors"][0]["code"],
            json!("NOT_FOUND")
        );
    }

    #[test]
    fn test_invalid_upstream_status() {
        let error: Error = character::Error::Upstream(upstream::Error::Status {
            status: 1000,
            content_type: None,
            body: vec![],
        })
        .into();

        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_status_code_mapping() {
        let error: Error =
            character::Error::Upstream(upstream::Error::Transport("timeout".to_string())).into();
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let error: Error =
            character::Error::Upstream(upstream::Error::InvalidPayload("bad".to_string())).into();
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let error: Error =
            character::Error::Cache(cache::Error::Backend("refused".to_string())).into();
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(
            Error::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_with_request_id() {
        let error = Error::NotFound("unknown route: GET /episodes".to_string());
        let request_id = "4bf92f3577b34da6a3ce929d0e0e4736".to_string();

        assert_eq!(
            body_json(&error, Some(&request_id)),
            json!({
                "errors": [{
                    "code": "NOT_FOUND",
                    "message": "unknown route: GET /episodes",
                    "detail": { "request_id": request_id }
                }]
            })
        );
        assert_eq!(error.content_type(), "application/json");
    }

    #[test]
    fn test_body_cache_error() {
        let error: Error =
            character::Error::Cache(cache::Error::Execution("refused".to_string())).into();

        assert_eq!(
            body_json(&error, None),
            json!({
                "errors": [{
                    "code": "CACHE_UNAVAILABLE",
                    "message": "Cache lookup failed: refused",
                }]
            })
        );
    }
}
