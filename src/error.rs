use std::error::Error;
use std::fmt;

/// Custom Error and Result types to unify errors from all sources.
pub type CrawlerResult<T> = Result<T, CrawlerError>;

#[derive(Debug)]
pub enum CrawlerError {
    Http(String),
    Blocked,
    Config(String),
    Cache(String),
}

impl fmt::Display for CrawlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlerError::Http(s) => write!(f, "HTTP Error: {}", s),
            CrawlerError::Blocked => write!(f, "Blocked: challenge page served instead of content"),
            CrawlerError::Config(s) => write!(f, "Config Error: {}", s),
            CrawlerError::Cache(s) => write!(f, "Cache Error: {}", s),
        }
    }
}

impl Error for CrawlerError {}

impl From<reqwest::Error> for CrawlerError {
    fn from(error: reqwest::Error) -> Self {
        CrawlerError::Http(error.to_string())
    }
}

impl From<figment::Error> for CrawlerError {
    fn from(error: figment::Error) -> Self {
        CrawlerError::Config(error.to_string())
    }
}

impl From<std::io::Error> for CrawlerError {
    fn from(error: std::io::Error) -> Self {
        CrawlerError::Cache(error.to_string())
    }
}

impl From<serde_json::Error> for CrawlerError {
    fn from(error: serde_json::Error) -> Self {
        CrawlerError::Cache(error.to_string())
    }
}

impl From<tempfile::PersistError> for CrawlerError {
    fn from(error: tempfile::PersistError) -> Self {
        CrawlerError::Cache(error.error.to_string())
    }
}
