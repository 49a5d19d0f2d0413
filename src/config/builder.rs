use super::{ConfigResult, SegmenterConfig};

/// Builder for SegmenterConfig that wraps the config itself
#[derive(Debug, Clone, Default)]
pub struct SegmenterConfigBuilder {
    config: SegmenterConfig,
}

impl SegmenterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from an existing configuration
    pub fn from_config(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Set the maximum number of buffered bytes
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.config.max_buffer_size = size;
        self
    }

    /// Enable or disable the Thinking history
    pub fn keep_thinking_history(mut self, enable: bool) -> Self {
        self.config.keep_thinking_history = enable;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> ConfigResult<SegmenterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without validation
    pub fn build_unchecked(self) -> SegmenterConfig {
        self.config
    }
}
