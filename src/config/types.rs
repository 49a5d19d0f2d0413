use serde::{Deserialize, Serialize};

/// Default cap on buffered bytes (4 MiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Segmenter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Maximum bytes held for classification (reasoning block or pending
    /// marker) plus the incoming fragment
    pub max_buffer_size: usize,
    /// Keep every completed Thinking segment for later retrieval
    pub keep_thinking_history: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            keep_thinking_history: true,
        }
    }
}

impl SegmenterConfig {
    /// Create a builder starting from default values
    pub fn builder() -> super::SegmenterConfigBuilder {
        super::SegmenterConfigBuilder::new()
    }

    /// Validate this configuration
    pub fn validate(&self) -> super::ConfigResult<()> {
        super::ConfigValidator::validate(self)
    }
}
