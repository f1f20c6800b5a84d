mod secret;

pub use secret::SecretResolver;

use serde::Deserialize;

use crate::error::Error;

const DEFAULT_LISTEN: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Process configuration, read from environment variables.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,
    /// Legacy name: selects the parameter store for secrets, has nothing to do with TLS.
    #[serde(default)]
    pub use_ssl: Option<String>,
    #[serde(default)]
    pub allowed_origin: Option<String>,
    #[serde(default)]
    pub signing_secret_insert: Option<String>,
    #[serde(default)]
    pub signing_secret_update: Option<String>,
    #[serde(default)]
    pub signing_secret_delete: Option<String>,
    #[serde(default)]
    pub listen: String,
    #[serde(default)]
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        config::Config::builder()
            .set_default("listen", DEFAULT_LISTEN)?
            .set_default("port", DEFAULT_PORT as i64)?
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
            .map_err(|e| e.into())
    }

    /// `USE_SSL=true` exactly. Anything else means environment variables.
    pub fn use_parameter_store(&self) -> bool {
        self.use_ssl.as_deref() == Some("true")
    }

    /// `ALLOWED_ORIGIN`, ignoring an empty value.
    pub fn allowed_origin(&self) -> Option<&str> {
        self.allowed_origin.as_deref().filter(|o| !o.is_empty())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_parameter_store() {
        let mut config = Config::default();
        assert!(!config.use_parameter_store());
        config.use_ssl = Some("TRUE".into());
        assert!(!config.use_parameter_store());
        config.use_ssl = Some("true".into());
        assert!(config.use_parameter_store());
    }

    #[test]
    fn test_allowed_origin_ignores_empty() {
        let mut config = Config::default();
        config.allowed_origin = Some("".into());
        assert_eq!(None, config.allowed_origin());
        config.allowed_origin = Some("http://localhost:5173".into());
        assert_eq!(Some("http://localhost:5173"), config.allowed_origin());
    }

    #[test]
    fn test_listen_address() {
        let config = Config {
            listen: "0.0.0.0".into(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!("0.0.0.0:8080", config.listen_address());
    }
}
