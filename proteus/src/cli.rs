//! # CLI
//!
//! This module defines the command-line interface of `proteus` using `clap`.
//!
//! Connection settings come from an optional JSON config file (see [`ClientConfig`]) and are
//! overridden by flags.
use anyhow::Context;
use clap::{Parser, Subcommand};
use proteus_core::ClientConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "proteus",
    version,
    about = "Rebuild the Protobuf schema of a gRPC server through reflection"
)]
pub struct Cli {
    /// The server URL to connect to (e.g. http://localhost:50051)
    pub url: String,

    /// JSON file with connection settings, flags take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use TLS (implied by https:// URLs)
    #[arg(long, global = true)]
    pub tls: bool,

    /// PEM encoded CA certificate to trust
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Domain name to verify the server certificate against
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// Deadline for each reflection request, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Deadline for establishing the connection, in seconds
    #[arg(long, global = true)]
    pub connect_timeout: Option<u64>,

    /// Metadata sent with every request (key:value)
    #[arg(short = 'H', long = "header", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Value of the `host` field of reflection requests
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Log every reflection request to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all services available on the server
    List,

    /// Describe a service, message or enum
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// proteus http://localhost:50051 describe my.package.Service
    /// ```
    Describe {
        /// Fully qualified symbol name (e.g. my.package.Service)
        symbol: String,
    },

    /// Resolve a schema and write it as a binary FileDescriptorSet
    Export {
        #[command(subcommand)]
        sub: ExportCommands,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Start from the file declaring a symbol
    Symbol {
        /// Fully qualified symbol name (e.g. my.package.Service)
        symbol: String,
        /// Where to write the descriptor set (.bin)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Start from a file name
    File {
        /// File name as known by the server (e.g. my/package/service.proto)
        filename: String,
        /// Where to write the descriptor set (.bin)
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    /// Builds the client configuration: the config file first, then flags on top.
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                ClientConfig::from_json(&json)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => ClientConfig::default(),
        };

        config.url = self.url.clone();

        if self.tls {
            config.tls.enabled = true;
        }
        if let Some(ca_cert) = &self.ca_cert {
            config.tls.enabled = true;
            config.tls.ca_certificate = Some(ca_cert.clone());
        }
        if let Some(domain) = &self.domain {
            config.tls.domain_name = Some(domain.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        for (k, v) in &self.headers {
            config = config.with_header(k.clone(), v.clone());
        }

        Ok(config)
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}
