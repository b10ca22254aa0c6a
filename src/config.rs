//! Connection configuration.

use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::ServerCertVerifier;

/// How the connection reaches TLS, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// No TLS; traffic is sent in the clear. Only useful against a
    /// loopback test server.
    None,
    /// Connect in plaintext, then negotiate TLS via the STARTTLS command
    /// before authenticating.
    StartTls,
    /// Establish TLS as part of the initial TCP handshake (the historical
    /// "IMAPS" port 993 convention).
    Implicit,
}

impl Security {
    /// The conventional TCP port for this security mode.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Implicit => 993,
        }
    }
}

/// Connection parameters for a single server.
#[derive(Clone)]
pub struct Config {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) security: Security,
    pub(crate) connect_timeout: Duration,
    pub(crate) io_timeout: Duration,
    pub(crate) cert_verifier: Option<Arc<dyn ServerCertVerifier>>,
    pub(crate) id_parameters: Option<Vec<(String, String)>>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .field("cert_verifier", &self.cert_verifier.is_some())
            .field("id_parameters", &self.id_parameters)
            .finish()
    }
}

impl Config {
    /// Starts building a configuration for `host` using `security`'s
    /// default port.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        let host = host.into();
        let port = security.default_port();
        Self {
            host,
            port,
            security,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            cert_verifier: None,
            id_parameters: None,
        }
    }

    /// The server hostname, also used for TLS SNI and certificate
    /// validation.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The TCP port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The configured security mode.
    #[must_use]
    pub fn security(&self) -> Security {
        self.security
    }

    /// Timeout for establishing the TCP (and, for implicit TLS, the TLS)
    /// connection.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Timeout applied to individual command round-trips.
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Client identification parameters sent via the ID command (RFC 2971),
    /// if any.
    #[must_use]
    pub fn id_parameters(&self) -> Option<&[(String, String)]> {
        self.id_parameters.as_deref()
    }

    /// A custom certificate verifier, overriding the default webpki-roots
    /// trust store.
    #[must_use]
    pub fn cert_verifier(&self) -> Option<&Arc<dyn ServerCertVerifier>> {
        self.cert_verifier.as_ref()
    }

    /// Starts a builder seeded from this configuration.
    #[must_use]
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder { config: self }
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Starts a builder for `host` using `security`'s default port.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self { config: Config::new(host, security) }
    }

    /// Overrides the TCP port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Overrides the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Overrides the per-command I/O timeout.
    #[must_use]
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Supplies client identification parameters for the ID command.
    #[must_use]
    pub fn id_parameters(mut self, parameters: Vec<(String, String)>) -> Self {
        self.config.id_parameters = Some(parameters);
        self
    }

    /// Overrides certificate validation. Only for testing against servers
    /// with self-signed or otherwise non-public-CA certificates; the
    /// default is strict validation against the webpki-roots trust store.
    #[must_use]
    pub fn cert_verifier(mut self, verifier: Arc<dyn ServerCertVerifier>) -> Self {
        self.config.cert_verifier = Some(verifier);
        self
    }

    /// Finishes building the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        assert_eq!(Security::None.default_port(), 143);
        assert_eq!(Security::StartTls.default_port(), 143);
        assert_eq!(Security::Implicit.default_port(), 993);
    }

    #[test]
    fn builder_overrides_port() {
        let config = ConfigBuilder::new("imap.example.com", Security::Implicit)
            .port(9993)
            .build();
        assert_eq!(config.port(), 9993);
        assert_eq!(config.host(), "imap.example.com");
    }

    #[test]
    fn builder_sets_id_parameters() {
        let config = ConfigBuilder::new("imap.example.com", Security::StartTls)
            .id_parameters(vec![("name".into(), "imap-engine".into())])
            .build();
        assert_eq!(config.id_parameters().unwrap()[0].0, "name");
    }
}
