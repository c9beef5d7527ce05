use serde::Deserialize;
use std::fmt;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Parameters for the HTTP listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// The TCP port the API server binds on.
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Parameters for the pooled database connection.
///
/// `Debug` is implemented by hand so the password can never reach a log
/// line; operator diagnostics print every other field.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub database: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// The pool capacity: the hard ceiling on simultaneously open connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long an acquire may wait on a saturated pool before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// When set, idle connections are health-checked before being handed out.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
}

fn default_server_port() -> u16 {
    3000
}
fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_db_name() -> String {
    "clinic_management".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_secs() -> u64 {
    5
}
fn default_keep_alive() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            user: default_db_user(),
            password: String::new(),
            database: default_db_name(),
            port: default_db_port(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            keep_alive: default_keep_alive(),
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_pool_shape() {
        let settings = DatabaseSettings::default();
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.acquire_timeout_secs, 5);
        assert_eq!(settings.port, 5432);
        assert_eq!(settings.database, "clinic_management");
        assert!(settings.keep_alive);
    }

    #[test]
    fn debug_output_never_contains_the_password() {
        let settings = DatabaseSettings {
            password: "hunter2".to_string(),
            ..DatabaseSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn empty_toml_deserializes_with_defaults() {
        let config: Config = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.host, "localhost");
    }
}
