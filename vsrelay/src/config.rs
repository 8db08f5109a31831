//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or the
//! `VSRELAY_CONFIG` environment variable. A missing file is not an error: every field has a
//! default, except the OpenAI API key.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `VSRELAY_` override YAML values
//! 3. **OPENAI_API_KEY** - Special case: overrides `openai.api_key` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `VSRELAY_OPENAI__TIMEOUT=30s` sets the `openai.timeout` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use vsrelay::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! openai:
//!   base_url: https://api.openai.com/v1
//!   timeout: 60s
//!   connect_timeout: 10s
//! limits:
//!   max_upload_size: 536870912
//! enable_otel_export: false
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use url::Url;

use crate::errors::Error;

/// Headroom on top of `max_upload_size` for the multipart envelope and the text fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "VSRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Upstream OpenAI API settings
    pub openai: OpenAiConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Settings for the upstream OpenAI API.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Bearer token sent on every upstream call. Usually provided through `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the API, including the version segment
    pub base_url: Url,
    /// Value sent in the `OpenAI-Beta` header on vector store calls
    pub beta_header: String,
    /// Total time allowed for each upstream call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Time allowed to establish the upstream connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("beta_header", &self.beta_header)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Resource limits for incoming uploads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size in bytes of the uploaded file.
    /// Default: 512MB, the largest file the upstream files API accepts
    pub max_upload_size: u64,
}

impl LimitsConfig {
    /// Body limit for the upload route: the file limit plus room for the rest of the form.
    pub fn request_body_limit(&self) -> usize {
        usize::try_from(self.max_upload_size.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            openai: OpenAiConfig::default(),
            limits: LimitsConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.openai.com/v1").expect("default OpenAI base URL is valid"),
            beta_header: "assistants=v2".to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 512 * 1024 * 1024, // 512MB
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.openai.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return Err(Error::Internal {
                operation: "validate config: OpenAI API key is not configured. \
                 Please set the OPENAI_API_KEY environment variable or add openai.api_key to the config file."
                    .to_string(),
            });
        }

        if !matches!(self.openai.base_url.scheme(), "http" | "https") {
            return Err(Error::Internal {
                operation: format!(
                    "validate config: openai.base_url must be an http(s) URL, got {}",
                    self.openai.base_url
                ),
            });
        }

        if self.openai.timeout.is_zero() || self.openai.connect_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "validate config: openai.timeout and openai.connect_timeout must be greater than zero".to_string(),
            });
        }

        if self.limits.max_upload_size == 0 {
            return Err(Error::Internal {
                operation: "validate config: limits.max_upload_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("VSRELAY_").ignore(&["config"]).split("__"))
            // The conventional variable name used by every OpenAI client
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai.api_key".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
