use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Config, DataConfig, LogFormat, LoggingConfig, ReportConfig};

/// Prefix of the environment variables that override the file,
/// e.g. `PRICELENS__DATA__LOOKBACK_DAYS=730`.
pub const ENV_PREFIX: &str = "PRICELENS";

/// Loads the application configuration.
///
/// The file at `path` is optional; every section falls back to its defaults.
/// Environment variables prefixed with `PRICELENS__` are layered on top, then the
/// result is validated.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Configuration file not found, using defaults.");
    }

    load_layered(config::File::from(path).required(false), environment())
}

/// The `PRICELENS__SECTION__KEY` environment source.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn load_layered<S>(file: S, environment: config::Environment) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;

    finish(builder)
}

/// Parses configuration from TOML text, without consulting the environment.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
