use std::fmt;

/// Custom error type for issuemd operations
#[derive(Debug)]
pub enum IssueMdError {
    /// Configuration errors (missing flag, missing file, bad repository URL)
    Config(String),
    /// GitHub API answered with a non-success status
    GitHub(String),
    /// Template formatter name outside the supported set
    UnknownFormatter(String),
    /// A git publishing step failed
    Git(String),
    /// File I/O errors
    Io(std::io::Error),
    /// JSON parsing errors
    Json(serde_json::Error),
    /// HTTP request errors
    Http(reqwest::Error),
    /// URL parsing errors
    Url(url::ParseError),
    /// Generic errors with message
    Generic(String),
}

impl fmt::Display for IssueMdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueMdError::Config(msg) => write!(f, "Configuration error: {}", msg),
            IssueMdError::GitHub(msg) => write!(f, "GitHub API error: {}", msg),
            IssueMdError::UnknownFormatter(name) => write!(f, "Unknown formatter: '{}'", name),
            IssueMdError::Git(msg) => write!(f, "Git error: {}", msg),
            IssueMdError::Io(err) => write!(f, "I/O error: {}", err),
            IssueMdError::Json(err) => write!(f, "JSON error: {}", err),
            IssueMdError::Http(err) => write!(f, "HTTP error: {}", err),
            IssueMdError::Url(err) => write!(f, "URL error: {}", err),
            IssueMdError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IssueMdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IssueMdError::Io(err) => Some(err),
            IssueMdError::Json(err) => Some(err),
            IssueMdError::Http(err) => Some(err),
            IssueMdError::Url(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IssueMdError {
    fn from(err: std::io::Error) -> Self {
        IssueMdError::Io(err)
    }
}

impl From<serde_json::Error> for IssueMdError {
    fn from(err: serde_json::Error) -> Self {
        IssueMdError::Json(err)
    }
}

impl From<reqwest::Error> for IssueMdError {
    fn from(err: reqwest::Error) -> Self {
        IssueMdError::Http(err)
    }
}

impl From<url::ParseError> for IssueMdError {
    fn from(err: url::ParseError) -> Self {
        IssueMdError::Url(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for IssueMdError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        IssueMdError::Config(err.to_string())
    }
}

impl IssueMdError {
    /// Transport-level failures (HTTP status or connection) abort a run
    /// but leave already written documents in place.
    pub fn is_transport(&self) -> bool {
        matches!(self, IssueMdError::GitHub(_) | IssueMdError::Http(_))
    }
}

/// Result type alias for issuemd operations
pub type Result<T> = std::result::Result<T, IssueMdError>;
