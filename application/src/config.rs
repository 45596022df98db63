//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::{de, Deserialize, Deserializer};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Lifetime of an issued user session.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            session_ttl,
        } = value;
        Self::new(jwt_secret.as_bytes(), session_ttl)
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Log {
    /// Maximum level of the written log records, case-insensitive.
    #[default(tracing::Level::INFO)]
    #[serde(deserialize_with = "level")]
    pub level: tracing::Level,
}

/// Deserializes a [`tracing::Level`] from its name.
fn level<'de, D: Deserializer<'de>>(d: D) -> Result<tracing::Level, D::Error> {
    String::deserialize(d)?.parse().map_err(de::Error::custom)
}

#[cfg(test)]
mod spec {
    use std::time;

    use super::{Config, Log};

    #[test]
    fn falls_back_to_defaults() {
        let conf = Config::new("non-existent.toml").unwrap();

        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.server.cors.origins, ["*"]);
        assert_eq!(
            conf.service.session_ttl,
            time::Duration::from_secs(60 * 60 * 24),
        );
        assert_eq!(conf.postgres.dbname, "postgres");
        assert_eq!(conf.log.level, tracing::Level::INFO);
    }

    #[test]
    fn parses_human_readable_session_ttl() {
        let conf: super::Service =
            serde_json::from_str(r#"{"session_ttl": "2h 30m"}"#).unwrap();

        assert_eq!(conf.session_ttl, time::Duration::from_secs(9000));
        assert_eq!(conf.jwt_secret, "secret");
    }

    #[test]
    fn parses_log_level_name() {
        let conf: Log = serde_json::from_str(r#"{"level": "warn"}"#).unwrap();
        assert_eq!(conf.level, tracing::Level::WARN);

        assert!(serde_json::from_str::<Log>(r#"{"level": "loud"}"#).is_err());
    }
}
