//! Opening the hub socket.
//!
//! [`Connector`] is the seam between the state machine and the network, so
//! the state machine can be driven against in-memory sockets.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Sink, Stream, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::error::TlsError;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::debug;

use hublink_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::error::TransportError;
use crate::types::HubEndpoint;

/// Outgoing half of an open socket.
pub type FrameSink = Pin<Box<dyn Sink<tungstenite::Message, Error = tungstenite::Error> + Send>>;

/// Incoming half of an open socket.
pub type FrameStream =
    Pin<Box<dyn Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Send>>;

/// Future returned by [`Connector::open`].
pub type OpenFuture =
    Pin<Box<dyn Future<Output = Result<(FrameSink, FrameStream), TransportError>> + Send>>;

/// Opens sockets to the hub.
pub trait Connector: Send + Sync {
    fn open(&self, endpoint: &HubEndpoint) -> OpenFuture;
}

/// Connector backed by `tokio-tungstenite` and rustls.
#[derive(Debug, Clone, Copy)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    /// Installs the ring crypto provider as the process default if none is
    /// installed yet.
    pub fn new() -> Self {
        // Fails only when a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TungsteniteConnector {
    fn open(&self, endpoint: &HubEndpoint) -> OpenFuture {
        let url = endpoint.url();
        let skip_verification = endpoint.tls && endpoint.ignore_cert_errors;

        Box::pin(async move {
            let mut ws_config = WebSocketConfig::default();
            ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
            ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

            let connector = skip_verification
                .then(|| tokio_tungstenite::Connector::Rustls(Arc::new(insecure_client_config())));

            debug!(url = %url, skip_verification, "opening socket");
            let (ws_stream, _) = tokio_tungstenite::connect_async_tls_with_config(
                url,
                Some(ws_config),
                false,
                connector,
            )
            .await
            .map_err(classify)?;

            let (write, read) = ws_stream.split();
            let sink: FrameSink = Box::pin(write);
            let stream: FrameStream = Box::pin(read);
            Ok((sink, stream))
        })
    }
}

/// Splits certificate rejections and other TLS failures out of socket errors.
pub(crate) fn classify(err: tungstenite::Error) -> TransportError {
    let tls = match &err {
        tungstenite::Error::Tls(TlsError::Rustls(e)) => Some(e),
        tungstenite::Error::Io(io) => io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>()),
        _ => None,
    }
    .map(|e| (matches!(e, rustls::Error::InvalidCertificate(_)), e.to_string()));

    match tls {
        Some((true, reason)) => TransportError::Certificate(reason),
        Some((false, reason)) => TransportError::Tls(reason),
        None => TransportError::Ws(err),
    }
}

fn insecure_client_config() -> rustls::ClientConfig {
    rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(SkipVerification))
        .with_no_client_auth()
}

/// Accepts any server certificate. Only used when the hub is configured to
/// ignore certificate errors.
#[derive(Debug)]
struct SkipVerification;

impl ServerCertVerifier for SkipVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
