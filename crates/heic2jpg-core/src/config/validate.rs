//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Largest accepted `conversion.sniff_bytes`.
pub const MAX_SNIFF_BYTES: usize = 64 * 1024;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.workers == 0 {
            return Err(ConfigError::ValidationError(
                "batch.workers must be > 0".into(),
            ));
        }
        if self.conversion.sniff_bytes == 0 || self.conversion.sniff_bytes > MAX_SNIFF_BYTES {
            return Err(ConfigError::ValidationError(format!(
                "conversion.sniff_bytes must be between 1 and {MAX_SNIFF_BYTES}, got {}",
                self.conversion.sniff_bytes
            )));
        }
        check_extension("conversion.source_extension", &self.conversion.source_extension)?;
        check_extension("conversion.target_extension", &self.conversion.target_extension)?;
        Ok(())
    }
}

fn check_extension(field: &str, ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not be empty"
        )));
    }
    if ext.contains(&['.', '/', '\\'][..]) {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be a bare extension without '.' or path separators"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.batch.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_validate_rejects_zero_sniff_bytes() {
        let mut config = Config::default();
        config.conversion.sniff_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sniff_bytes"));
    }

    #[test]
    fn test_validate_caps_sniff_bytes() {
        let mut config = Config::default();
        config.conversion.sniff_bytes = MAX_SNIFF_BYTES;
        assert!(config.validate().is_ok());

        config.conversion.sniff_bytes = MAX_SNIFF_BYTES + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sniff_bytes"));
    }

    #[test]
    fn test_validate_rejects_empty_extension() {
        let mut config = Config::default();
        config.conversion.target_extension = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_extension"));
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let mut config = Config::default();
        config.conversion.source_extension = ".heic".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source_extension"));

        config.conversion.source_extension = "a/b".into();
        assert!(config.validate().is_err());
    }
}
