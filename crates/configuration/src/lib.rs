use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, DatabaseSettings, ServerSettings};

/// Loads the application configuration.
///
/// Reads `config.toml` when present, then applies `CLINIC_*` environment
/// overrides (e.g. `CLINIC_DATABASE__HOST`, `CLINIC_DATABASE__PASSWORD`).
/// Every field has a default, so a bare environment works out of the box.
/// Settings are read once at process start; there is no hot-reload.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("CLINIC").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}
