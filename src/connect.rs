//! TCP/TLS bootstrap: turns a [`Config`] into a connected [`Engine`] with
//! the greeting already consumed.
//!
//! Generalizes the teacher's `connection::stream` dial helpers
//! (`connect_plain`/`connect_tls`/`create_tls_connector`) into one entry
//! point that also handles the [`Security::StartTls`] case, which the
//! teacher left to its callers to orchestrate by hand.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;

use crate::bytestream::{ByteStream, Transport};
use crate::config::{Config, Security};
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Builds a [`TlsConnector`] trusting the webpki-roots CA bundle, or the
/// caller's [`Config::cert_verifier`] override if one was supplied.
///
/// # Errors
/// Returns [`Error::Tls`] if rustls rejects the resulting client config
/// (only possible when a custom verifier is incompatible with the
/// configured protocol versions).
pub fn create_tls_connector(config: &Config) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder();
    let tls_config = if let Some(verifier) = config.cert_verifier() {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::clone(verifier))
            .with_no_client_auth()
    } else {
        let root_store = rustls::RootCertStore { roots: webpki_roots::TLS_SERVER_ROOTS.to_vec() };
        builder.with_root_certificates(root_store).with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(tls_config)))
}

/// Dials `config.host():config.port()`, establishes TLS up front for
/// [`Security::Implicit`], reads the server greeting, and negotiates
/// STARTTLS before returning for [`Security::StartTls`].
///
/// The returned engine is in [`crate::engine::EngineState::Connected`] (or
/// already `Authenticated`, for a PREAUTH greeting) and ready for
/// [`Engine::authenticate`].
///
/// # Errors
/// Returns [`Error::Timeout`] if the TCP handshake does not complete within
/// [`Config::connect_timeout`]. Returns [`Error::Io`]/[`Error::Tls`] for
/// transport or handshake failures, and [`Error::ProtocolError`] if the
/// greeting is malformed or the server refuses STARTTLS.
pub async fn connect(config: &Config, cancel: &CancellationToken) -> Result<Engine<Transport>> {
    let addr = format!("{}:{}", config.host(), config.port());
    let tcp = tokio::time::timeout(config.connect_timeout(), TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout()))??;

    let transport = if config.security() == Security::Implicit {
        let connector = create_tls_connector(config)?;
        let server_name = ServerName::try_from(config.host().to_string())
            .map_err(|_| Error::InvalidDnsName(config.host().to_string()))?;
        let tls = connector.connect(server_name, tcp).await?;
        Transport::Tls(Box::new(tls))
    } else {
        Transport::Plain(tcp)
    };

    let mut engine = Engine::new(transport);
    engine.read_greeting(cancel).await?;

    if config.security() == Security::StartTls {
        let connector = create_tls_connector(config)?;
        engine = engine.starttls(config.host(), &connector, cancel).await?;
    }

    Ok(engine)
}
