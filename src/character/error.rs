use std::fmt;

use crate::{cache, upstream};

#[derive(Debug, PartialEq)]
pub enum Error {
    Upstream(upstream::Error),
    Cache(cache::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Upstream(err) => write!(f, "{err}"),
            Error::Cache(err) => write!(f, "Cache lookup failed: {err}"),
        }
    }
}

impl From<upstream::Error> for Error {
    fn from(error: upstream::Error) -> Self {
        Error::Upstream(error)
    }
}

impl From<cache::Error> for Error {
    fn from(error: cache::Error) -> Self {
        Error::Cache(error)
    }
}
