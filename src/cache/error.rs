use std::fmt;

use redis::RedisError;
use tracing::warn;

#[derive(Debug, PartialEq)]
pub enum Error {
    Backend(String),
    Execution(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Backend(err) | Error::Execution(err) => write!(f, "{err}"),
        }
    }
}

impl From<RedisError> for Error {
    fn from(error: RedisError) -> Self {
        warn!("Redis cache error: {error}");
        Error::Backend(format!("Redis error: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use redis::RedisError;

    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::Backend("Connection refused".to_string());
        assert_eq!(format!("{error}"), "Connection refused");

        let error = Error::Execution("Failed to deserialize".to_string());
        assert_eq!(format!("{error}"), "Failed to deserialize");
    }

    #[test]
    fn test_from_redis_error() {
        let error = RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let error: Error = error.into();
        match error {
            Error::Backend(msg) => assert!(msg.starts_with("Redis error:")),
            Error::Execution(_) => panic!("Expected Backend error"),
        }
    }
}
