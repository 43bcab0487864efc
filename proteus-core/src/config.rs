//! # Client Configuration
//!
//! [`ClientConfig`] gathers everything needed to reach a reflection service: the address,
//! channel credentials, transport options and the metadata sent with every request.
//!
//! It can be built in code or deserialized from JSON:
//!
//! ```json
//! {
//!   "url": "https://api.example.com:443",
//!   "tls": { "enabled": true, "domain_name": "api.example.com" },
//!   "timeout_ms": 10000,
//!   "headers": [["authorization", "Bearer token"]]
//! }
//! ```
use crate::client::ClientConnectError;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The server URI (e.g., `http://localhost:50051`).
    pub url: String,
    pub tls: TlsConfig,
    /// Deadline applied to every reflection exchange.
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Option<Duration>,
    #[serde(rename = "connect_timeout_ms", deserialize_with = "millis")]
    pub connect_timeout: Option<Duration>,
    /// Metadata (headers) attached to every reflection exchange.
    pub headers: Vec<(String, String)>,
    /// Value of the `host` field of reflection requests. Most servers ignore it.
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    /// PEM encoded CA certificate to trust instead of the bundled web PKI roots.
    pub ca_certificate: Option<PathBuf>,
    /// Overrides the name checked against the server certificate.
    pub domain_name: Option<String>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// TLS is used when enabled explicitly or when the URL uses the `https` scheme.
    pub fn uses_tls(&self) -> bool {
        self.tls.enabled || self.url.starts_with("https://")
    }

    /// The URL actually dialed: `http://` becomes `https://` when TLS is enabled.
    ///
    /// tonic only negotiates TLS for `https` URIs, so keeping `http` would connect in plaintext.
    pub fn target_url(&self) -> String {
        match self.url.strip_prefix("http://") {
            Some(rest) if self.tls.enabled => format!("https://{rest}"),
            _ => self.url.clone(),
        }
    }

    /// Builds the tonic [`Endpoint`] described by this configuration.
    pub fn endpoint(&self) -> Result<Endpoint, ClientConnectError> {
        let url = self.target_url();
        let mut endpoint =
            Endpoint::new(url.clone()).map_err(|e| ClientConnectError::InvalidUrl(url, e))?;

        if let Some(timeout) = self.timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }

        if self.uses_tls() {
            endpoint = endpoint
                .tls_config(self.tls.client_tls_config()?)
                .map_err(ClientConnectError::InvalidTlsConfig)?;
        }

        Ok(endpoint)
    }

    /// Parses the configured headers into gRPC metadata.
    pub fn metadata(&self) -> Result<MetadataMap, ClientConnectError> {
        let mut metadata = MetadataMap::new();
        for (k, v) in &self.headers {
            let key = MetadataKey::from_str(k).map_err(|source| {
                ClientConnectError::InvalidMetadataKey {
                    key: k.clone(),
                    source,
                }
            })?;
            let val = MetadataValue::from_str(v).map_err(|source| {
                ClientConnectError::InvalidMetadataValue {
                    key: k.clone(),
                    source,
                }
            })?;
            metadata.insert(key, val);
        }
        Ok(metadata)
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl TlsConfig {
    fn client_tls_config(&self) -> Result<ClientTlsConfig, ClientConnectError> {
        let mut tls = match &self.ca_certificate {
            Some(path) => {
                let pem =
                    std::fs::read(path).map_err(|source| ClientConnectError::ReadCertificate {
                        path: path.clone(),
                        source,
                    })?;
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
            None => ClientTlsConfig::new().with_webpki_roots(),
        };

        if let Some(domain) = &self.domain_name {
            tls = tls.domain_name(domain.clone());
        }

        Ok(tls)
    }
}
