use thiserror::Error;

/// Wire-stable domain error kinds, carried verbatim across adapter, service,
/// and UI boundaries (see spec §6.5).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KinoError {
    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("server offline")]
    ServerOffline,

    #[error("authentication failed")]
    AuthFailed,

    #[error("library not found: {0}")]
    LibraryNotFound(String),

    #[error("no next episode")]
    NoNextEpisode,

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("adapter error: {0}")]
    Adapter(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl KinoError {
    /// Transient failures are retried by the adapter before being surfaced;
    /// permanent failures are surfaced immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, KinoError::ServerOffline)
    }

    /// Classify an HTTP status code the way the adapters do when translating
    /// a non-2xx response into a domain error.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 => KinoError::AuthFailed,
            404 => KinoError::ItemNotFound(body.into()),
            429 | 500..=599 => KinoError::ServerOffline,
            _ => KinoError::Adapter(format!("http {status}: {}", body.into())),
        }
    }
}

impl From<reqwest::Error> for KinoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            KinoError::ServerOffline
        } else {
            KinoError::Adapter(err.to_string())
        }
    }
}

impl From<sqlx::Error> for KinoError {
    fn from(err: sqlx::Error) -> Self {
        KinoError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for KinoError {
    fn from(err: serde_json::Error) -> Self {
        KinoError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KinoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiting_and_server_errors_are_transient() {
        assert!(KinoError::from_status(429, "").is_transient());
        assert!(KinoError::from_status(503, "").is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!KinoError::from_status(401, "").is_transient());
        assert!(!KinoError::from_status(404, "").is_transient());
        assert!(!KinoError::from_status(400, "").is_transient());
    }
}
