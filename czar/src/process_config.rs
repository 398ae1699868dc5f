//! The `--config <path>` file `run czar` and `show config` both read: the
//! bootstrap parameters needed before the typed [`czar_config::ConfigService`]
//! can even be loaded (where to find the metastore, where to listen).
//! Everything else — workers, families, databases, tunable parameters —
//! lives in the metastore itself and is reached only after this file has
//! been parsed.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not read config file {path}: {source}"))]
    Read { path: String, source: std::io::Error },

    #[snafu(display("could not parse config file {path}: {source}"))]
    Parse { path: String, source: toml::de::Error },

    #[snafu(display("bind_addr {value:?} is not a valid socket address"))]
    InvalidBindAddr { value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    /// Address the HTTP control surface (C10) listens on.
    pub bind_addr: String,
    pub metastore_host: String,
    #[serde(default = "default_pg_port")]
    pub metastore_port: u16,
    pub metastore_user: String,
    #[serde(default)]
    pub metastore_password: String,
    pub metastore_database: String,
    /// `None` disables bearer-token auth on `Required` routes — local/dev
    /// use only.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// How long a worker may go unreachable before [`replica_control::
    /// HealthMonitor`] reports it for eviction.
    #[serde(default = "default_evict_timeout_secs")]
    pub evict_timeout_secs: u64,
}

fn default_pg_port() -> u16 {
    5432
}

fn default_evict_timeout_secs() -> u64 {
    60
}

impl ProcessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context(ReadSnafu {
            path: path.display().to_string(),
        })?;
        toml::from_str(&text).context(ParseSnafu {
            path: path.display().to_string(),
        })
    }

    pub fn bind_socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|_| Error::InvalidBindAddr {
            value: self.bind_addr.clone(),
        })
    }

    pub fn pg_connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.metastore_host)
            .port(self.metastore_port)
            .username(&self.metastore_user)
            .password(&self.metastore_password)
            .database(&self.metastore_database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let toml = r#"
            bind_addr = "127.0.0.1:8080"
            metastore_host = "localhost"
            metastore_user = "czar"
            metastore_database = "czar_meta"
        "#;
        let cfg: ProcessConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.metastore_port, 5432);
        assert_eq!(cfg.evict_timeout_secs, 60);
        assert!(cfg.auth_token.is_none());
        assert!(cfg.bind_socket_addr().is_ok());
    }

    #[test]
    fn rejects_an_unparseable_bind_addr() {
        let toml = r#"
            bind_addr = "not-an-address"
            metastore_host = "localhost"
            metastore_user = "czar"
            metastore_database = "czar_meta"
        "#;
        let cfg: ProcessConfig = toml::from_str(toml).unwrap();
        assert!(cfg.bind_socket_addr().is_err());
    }
}
