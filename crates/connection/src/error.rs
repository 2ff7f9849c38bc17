use tokio_tungstenite::tungstenite;

/// Errors opening or running the hub socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("certificate rejected: {0}")]
    Certificate(String),

    #[error("TLS error: {0}")]
    Tls(String),
}

impl TransportError {
    /// `true` when the server certificate failed validation.
    pub fn is_certificate(&self) -> bool {
        matches!(self, Self::Certificate(_))
    }
}

/// Errors loading the hub configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let err = TransportError::Certificate("UnknownIssuer".into());
        assert_eq!(err.to_string(), "certificate rejected: UnknownIssuer");
        assert!(err.is_certificate());
        assert!(!TransportError::Tls("handshake".into()).is_certificate());
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::MissingField("token").to_string(),
            "missing required field `token`"
        );
    }
}
