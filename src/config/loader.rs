use ::config::{Config, Environment, File, FileFormat};
use std::path::Path;

use super::{AppConfig, ConfigError};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "RELAY";

/// Environment key for `backend.url`
pub const ENV_BACKEND_URL: &str = "RELAY_BACKEND__URL";

/// `RELAY_<SECTION>__<FIELD>` overrides, e.g. `RELAY_GENERATION__TOP_P`
///
/// Blank values are ignored so an exported-but-empty variable does not clear
/// a value from the file.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .ignore_empty(true)
}

/// Layer an optional YAML file under an environment source
pub fn load_config<P: AsRef<Path>>(path: P, env: Environment) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(false))
        .add_source(env)
        .build()?;

    Ok(settings.try_deserialize()?)
}
