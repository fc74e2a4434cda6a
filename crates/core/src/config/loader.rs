use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment prefix for overrides, e.g. `SHELVER_PATTERN="%A - %S"`.
pub const ENV_PREFIX: &str = "SHELVER_";

/// Load configuration from defaults, an optional TOML file and environment overrides.
///
/// Environment keys map onto the `[organizer]` table: `SHELVER_DEST_ROOT`
/// sets `organizer.dest_root`. `SHELVER_CONFIG` names the file itself and
/// is not treated as a setting.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config"])
                .map(|key| format!("organizer.{key}").into()),
        )
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
