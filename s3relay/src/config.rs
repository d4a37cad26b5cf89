//! Configuration management
//!
//! Settings come from an optional `s3relay.toml`, `S3RELAY__*` environment
//! variables, and finally command-line flags (each of which also reads its own
//! environment variable). Later sources win.
//!
//! Nested keys use `__` in environment variables, e.g. `S3RELAY__SERVER__PORT`.
//! `S3RELAY__STORAGE__BUCKETS` takes a comma-separated list.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use s3relay_core::OUTPUT_BUCKET_VAR;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "s3relay")]
#[command(about = "Relay objects into a processed/ prefix of an output bucket", long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "S3RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "S3RELAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "S3RELAY_HOST")]
    pub host: Option<String>,

    /// Bucket processed objects are written to
    #[arg(long, env = "OUTPUT_BUCKET")]
    pub output_bucket: Option<String>,

    /// Storage backend
    #[arg(long, value_enum, env = "S3RELAY_STORAGE")]
    pub storage: Option<StorageKind>,

    /// Endpoint override for S3-compatible stores
    #[arg(long, env = "S3RELAY_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Use path-style S3 addressing
    #[arg(long, env = "S3RELAY_S3_FORCE_PATH_STYLE")]
    pub s3_force_path_style: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "S3RELAY_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    S3,
    Ephemeral,
}

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub output_bucket: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            output_bucket: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    #[serde(rename = "s3")]
    S3 {
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        force_path_style: bool,
    },

    /// In-memory store; `buckets` are created at startup alongside the output bucket
    #[serde(rename = "ephemeral")]
    Ephemeral {
        #[serde(default)]
        buckets: Vec<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::S3 {
            endpoint: None,
            force_path_style: false,
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("S3RELAY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("storage.buckets")
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&PathBuf>, env: config::Environment) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name("s3relay").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize::<Config>()
            .context("invalid configuration")
    }

    /// Load file/environment configuration, then apply command-line overrides
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let mut config = Self::load(args.config.as_ref())?;
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: Args) {
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(host) = args.host {
            self.server.host = host;
        }
        if let Some(bucket) = args.output_bucket {
            self.output_bucket = Some(bucket);
        }
        if let Some(level) = args.log_level {
            self.log_level = level;
        }

        match args.storage {
            Some(StorageKind::Ephemeral) if !matches!(self.storage, StorageConfig::Ephemeral { .. }) => {
                self.storage = StorageConfig::Ephemeral { buckets: Vec::new() };
            }
            Some(StorageKind::S3) if !matches!(self.storage, StorageConfig::S3 { .. }) => {
                self.storage = StorageConfig::default();
            }
            _ => {}
        }

        if let StorageConfig::S3 {
            endpoint,
            force_path_style,
        } = &mut self.storage
        {
            if args.s3_endpoint.is_some() {
                *endpoint = args.s3_endpoint;
            }
            *force_path_style |= args.s3_force_path_style;
        }
    }

    /// The configured output bucket; startup fails without one
    pub fn require_output_bucket(&self) -> anyhow::Result<&str> {
        match self.output_bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => anyhow::bail!(
                "output bucket is not configured; set {OUTPUT_BUCKET_VAR} or pass --output-bucket"
            ),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
