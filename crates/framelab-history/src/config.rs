//! History configuration, loadable from JSON.

use std::path::Path;

use framelab_core::{FrameLabError, Result};
use serde::{Deserialize, Serialize};

use crate::codec::CodecConfig;

/// Number of snapshots kept by default.
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries; the oldest is evicted beyond this.
    pub capacity: usize,
    pub codec: CodecConfig,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            codec: CodecConfig::default(),
        }
    }
}

impl HistoryConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FrameLabError::InvalidArgument(
                "history capacity must be at least 1".into(),
            ));
        }
        self.codec.validate()
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| FrameLabError::Serialization(format!("Invalid history config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| FrameLabError::Serialization(format!("Failed to serialize config: {e}")))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}
