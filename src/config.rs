use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, fmt};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Which `ObjectStore` implementation backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Remote S3-compatible store.
    S3,
    /// In-process store, contents are lost on exit.
    Memory,
}

impl Backend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown backend `{}` (expected `s3` or `memory`)", other),
        }
    }
}

/// Connection parameters for the object store. Fixed for the process lifetime.
#[derive(Clone)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub store: StoreConfig,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP gateway exposing an S3 bucket as a file chain")]
pub struct Args {
    /// Host to bind to (overrides GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend (overrides GATEWAY_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// S3 endpoint URL (overrides GATEWAY_S3_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bucket name (overrides GATEWAY_S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Signing region (overrides GATEWAY_S3_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Maximum accepted request body in bytes (overrides GATEWAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::merge(args, |name| env::var(name))
    }

    /// Merge parsed CLI args over values looked up through `lookup`.
    pub fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };

        // --- Environment fallback ---
        let env_host = optional("GATEWAY_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match optional("GATEWAY_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing GATEWAY_PORT value `{}`", value))?,
            None => 8000,
        };
        let env_backend = match optional("GATEWAY_BACKEND")? {
            Some(value) => Backend::parse(&value).context("parsing GATEWAY_BACKEND")?,
            None => Backend::S3,
        };
        let env_max_upload = match optional("GATEWAY_MAX_UPLOAD_BYTES")? {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing GATEWAY_MAX_UPLOAD_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let env_region = optional("GATEWAY_S3_REGION")?.unwrap_or_else(|| "us-east-1".into());

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            backend: args.backend.unwrap_or(env_backend),
            store: StoreConfig {
                endpoint: args
                    .endpoint
                    .or(optional("GATEWAY_S3_ENDPOINT")?)
                    .map(|e| e.trim_end_matches('/').to_string()),
                bucket: args.bucket.or(optional("GATEWAY_S3_BUCKET")?),
                region: args.region.unwrap_or(env_region),
                access_key: optional("GATEWAY_S3_ACCESS_KEY")?,
                secret_key: optional("GATEWAY_S3_SECRET_KEY")?,
            },
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.backend == Backend::S3 {
            if self.store.endpoint.is_none() {
                bail!("GATEWAY_S3_ENDPOINT (or --endpoint) is required for the s3 backend");
            }
            if self.store.bucket.is_none() {
                bail!("GATEWAY_S3_BUCKET (or --bucket) is required for the s3 backend");
            }
        }
        if self.store.access_key.is_some() != self.store.secret_key.is_some() {
            bail!("GATEWAY_S3_ACCESS_KEY and GATEWAY_S3_SECRET_KEY must be set together");
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_for_memory_backend() {
        let cfg = AppConfig::merge(Args::default(), lookup(&[("GATEWAY_BACKEND", "memory")]))
            .unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.backend, Backend::Memory);
        assert_eq!(cfg.store.region, "us-east-1");
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn s3_backend_requires_endpoint_and_bucket() {
        let err = AppConfig::merge(Args::default(), lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("GATEWAY_S3_ENDPOINT"));

        let err = AppConfig::merge(
            Args::default(),
            lookup(&[("GATEWAY_S3_ENDPOINT", "https://s3.example.com")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GATEWAY_S3_BUCKET"));
    }

    #[test]
    fn cli_overrides_environment() {
        let args = Args {
            port: Some(9100),
            bucket: Some("cli-bucket".into()),
            ..Args::default()
        };
        let cfg = AppConfig::merge(
            args,
            lookup(&[
                ("GATEWAY_PORT", "8100"),
                ("GATEWAY_S3_ENDPOINT", "https://s3.example.com/"),
                ("GATEWAY_S3_BUCKET", "env-bucket"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.store.bucket.as_deref(), Some("cli-bucket"));
        assert_eq!(cfg.store.endpoint.as_deref(), Some("https://s3.example.com"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::merge(
            Args::default(),
            lookup(&[("GATEWAY_BACKEND", "memory"), ("GATEWAY_PORT", "eighty")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GATEWAY_PORT"));
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        let err = AppConfig::merge(
            Args::default(),
            lookup(&[("GATEWAY_BACKEND", "memory"), ("GATEWAY_S3_ACCESS_KEY", "AKIA")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = AppConfig::merge(
            Args::default(),
            lookup(&[
                ("GATEWAY_BACKEND", "memory"),
                ("GATEWAY_S3_ACCESS_KEY", "AKIA"),
                ("GATEWAY_S3_SECRET_KEY", "super-secret"),
            ]),
        )
        .unwrap();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
