use super::{types::OrganizerConfig, ConfigError};
use crate::pattern::{sanitize, Pattern};

/// Validate organizer configuration
/// Currently validates:
/// - Pattern has at least one path component
/// - Duplicate token is non-empty, stays inside one path component and is
///   already a safe file name fragment
/// - Fingerprint concurrency and buffer size are not 0
pub fn validate_config(config: &OrganizerConfig) -> Result<(), ConfigError> {
    if config.pattern.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "pattern cannot be empty".to_string(),
        ));
    }

    if Pattern::parse(&config.pattern).components().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "pattern {:?} has no path components",
            config.pattern
        )));
    }

    if config.duplicate_token.is_empty() {
        return Err(ConfigError::ValidationError(
            "duplicate_token cannot be empty".to_string(),
        ));
    }

    if config.duplicate_token.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(
            "duplicate_token cannot contain path separators".to_string(),
        ));
    }

    if sanitize(&config.duplicate_token) != config.duplicate_token {
        return Err(ConfigError::ValidationError(format!(
            "duplicate_token {:?} contains characters not allowed in file names",
            config.duplicate_token
        )));
    }

    if config.fingerprint_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "fingerprint_concurrency cannot be 0".to_string(),
        ));
    }

    if config.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "buffer_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
