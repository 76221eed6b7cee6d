use crate::services::file_repository::DEFAULT_ACCESS_TOKEN_TTL_DAYS;
use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use clap::{Parser, ValueEnum};
use std::env;

/// Which object store the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// AWS S3 or an S3-compatible service.
    S3,
    /// Process-local store; contents are lost on exit.
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
    pub access_token_ttl_days: i64,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "File upload/download service backed by an object store")]
pub struct Args {
    /// Host to bind to (overrides FILE_WEB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_WEB_PORT / PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend (overrides FILE_WEB_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Bucket holding the files (overrides FILE_WEB_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides FILE_WEB_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint, e.g. a local MinIO (overrides FILE_WEB_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing (overrides FILE_WEB_FORCE_PATH_STYLE)
    #[arg(long)]
    pub force_path_style: bool,

    /// Days an access token stays valid (overrides FILE_WEB_ACCESS_TOKEN_TTL_DAYS)
    #[arg(long)]
    pub access_token_ttl_days: Option<i64>,

    /// Largest accepted upload body in bytes (overrides FILE_WEB_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge CLI args over values from `lookup` over defaults.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_host = lookup("FILE_WEB_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("FILE_WEB_PORT").or_else(|| lookup("PORT")) {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing port value `{}`", value))?,
            None => 5000,
        };
        let env_backend = match lookup("FILE_WEB_BACKEND") {
            Some(value) => Backend::from_str(&value, true).map_err(|err| {
                anyhow::anyhow!("parsing FILE_WEB_BACKEND value `{}`: {}", value, err)
            })?,
            None => Backend::S3,
        };
        let env_ttl = match lookup("FILE_WEB_ACCESS_TOKEN_TTL_DAYS") {
            Some(value) => value.parse::<i64>().with_context(|| {
                format!("parsing FILE_WEB_ACCESS_TOKEN_TTL_DAYS value `{}`", value)
            })?,
            None => DEFAULT_ACCESS_TOKEN_TTL_DAYS,
        };
        let env_max_upload = match lookup("FILE_WEB_MAX_UPLOAD_BYTES") {
            Some(value) => value.parse::<usize>().with_context(|| {
                format!("parsing FILE_WEB_MAX_UPLOAD_BYTES value `{}`", value)
            })?,
            None => 32 * 1024 * 1024,
        };
        let env_path_style = lookup("FILE_WEB_FORCE_PATH_STYLE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            backend: args.backend.unwrap_or(env_backend),
            bucket: args.bucket.or_else(|| lookup("FILE_WEB_BUCKET")),
            region: args
                .region
                .or_else(|| lookup("FILE_WEB_REGION"))
                .unwrap_or_else(|| "us-east-1".into()),
            endpoint: args.endpoint.or_else(|| lookup("FILE_WEB_ENDPOINT")),
            force_path_style: args.force_path_style || env_path_style,
            access_token_ttl_days: args.access_token_ttl_days.unwrap_or(env_ttl),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        if cfg.backend == Backend::S3 && cfg.bucket.as_deref().is_none_or(str::is_empty) {
            bail!("a bucket is required for the s3 backend (--bucket or FILE_WEB_BUCKET)");
        }
        if cfg.access_token_ttl_days <= 0 {
            bail!("access token TTL must be at least one day");
        }
        if TimeDelta::try_days(cfg.access_token_ttl_days)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_none()
        {
            bail!(
                "access token TTL of {} days is out of range",
                cfg.access_token_ttl_days
            );
        }

        Ok(cfg)
    }

    /// Access token lifetime; `resolve` has already checked it fits.
    pub fn access_token_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_days(self.access_token_ttl_days).with_context(|| {
            format!(
                "access token TTL of {} days is out of range",
                self.access_token_ttl_days
            )
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
