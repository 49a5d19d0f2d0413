use super::*;
use crate::reasoning_parser::markers::THINK_CLOSE;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &SegmenterConfig) -> ConfigResult<()> {
        Self::validate_buffer(config)?;
        Ok(())
    }

    fn validate_buffer(config: &SegmenterConfig) -> ConfigResult<()> {
        if config.max_buffer_size < THINK_CLOSE.len() {
            return Err(ConfigError::InvalidValue {
                field: "max_buffer_size".to_string(),
                value: config.max_buffer_size.to_string(),
                reason: format!(
                    "Must be at least {} bytes to hold a closing marker",
                    THINK_CLOSE.len()
                ),
            });
        }

        Ok(())
    }
}
