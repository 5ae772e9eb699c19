use anyhow::{Context, Result};
use clap::Parser;
use std::env;

use crate::services::object_service::{DEFAULT_OBJECT_PREFIX, ObjectServiceConfig};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub object_root: String,
    pub object_prefix: String,
    pub database_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Content-addressed object gateway")]
pub struct Args {
    /// Host to bind to (overrides OBJECT_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides OBJECT_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Root directory for locally stored objects (overrides OBJECT_GATEWAY_OBJECT_ROOT)
    #[arg(long)]
    pub object_root: Option<String>,

    /// Key prefix for objects in external workspace storage (overrides OBJECT_GATEWAY_OBJECT_PREFIX)
    #[arg(long)]
    pub object_prefix: Option<String>,

    /// Database URL (overrides OBJECT_GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// CLI values win over environment variables, which win over defaults.
    pub fn merge(args: Args) -> Result<Self> {
        let env_host = env::var("OBJECT_GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("OBJECT_GATEWAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing OBJECT_GATEWAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading OBJECT_GATEWAY_PORT"),
        };
        let env_root =
            env::var("OBJECT_GATEWAY_OBJECT_ROOT").unwrap_or_else(|_| "./data/objects".into());
        let env_prefix = env::var("OBJECT_GATEWAY_OBJECT_PREFIX")
            .unwrap_or_else(|_| DEFAULT_OBJECT_PREFIX.into());
        let env_db = env::var("OBJECT_GATEWAY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/object_gateway.db".into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            object_root: args.object_root.unwrap_or(env_root),
            object_prefix: args.object_prefix.unwrap_or(env_prefix),
            database_url: args.database_url.unwrap_or(env_db),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn object_service(&self) -> ObjectServiceConfig {
        ObjectServiceConfig {
            object_root: self.object_root.clone().into(),
            object_prefix: self.object_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_override_everything() {
        let args = Args {
            host: Some("127.0.0.1".into()),
            port: Some(8081),
            object_root: Some("/tmp/objects".into()),
            object_prefix: Some("blobs".into()),
            database_url: Some("sqlite::memory:".into()),
            migrate: false,
        };
        let cfg = AppConfig::merge(args).unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:8081");
        let service = cfg.object_service();
        assert_eq!(service.object_root, std::path::PathBuf::from("/tmp/objects"));
        assert_eq!(service.object_prefix, "blobs");
    }
}
