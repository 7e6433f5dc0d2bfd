use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest silence appended per endpoint; the padding is one buffer allocated per turn
pub const MAX_TAIL_PADDING_SECONDS: f32 = 60.0;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    // Recognition
    pub sample_rate: u32,
    pub chunk_seconds: f32,
    pub tail_padding_seconds: f32,
    pub encoder_model_path: String,
    pub model_path: String,

    // Downstream services
    /// Language-model endpoint. `tcp://` and `unix://` peers must speak the
    /// newline-delimited JSON socket protocol in `channel::messages`; a
    /// ZeroMQ REQ/REP socket on the same port will not answer.
    pub llm_address: String,
    /// Speech-output endpoint, same protocol rules as `llm_address`.
    pub block_address: String,
    pub block_message: String,
    pub request_timeout_ms: u64,

    // Meta
    pub transcript_path: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_seconds: 0.1,
            tail_padding_seconds: 1.0,
            encoder_model_path: String::new(),
            model_path: dirs::data_dir()
                .unwrap_or_default()
                .join("turnflow/models/vosk-model-small-en-us")
                .to_string_lossy()
                .to_string(),
            llm_address: "tcp://localhost:5555".to_string(),
            block_address: "tcp://localhost:6677".to_string(),
            block_message: "block".to_string(),
            request_timeout_ms: 10_000,
            transcript_path: String::new(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Decoders with a separate encoder model hold back their last tokens
    /// until they see trailing audio.
    pub fn tail_sensitive(&self) -> bool {
        !self.encoder_model_path.is_empty()
    }

    /// Samples per capture chunk at the given device rate.
    pub fn chunk_samples(&self, actual_rate: u32) -> usize {
        (self.chunk_seconds * actual_rate as f32) as usize
    }

    /// Zero samples appended on endpoint for tail-sensitive decoders.
    pub fn tail_padding_samples(&self) -> usize {
        (self.tail_padding_seconds * self.sample_rate as f32) as usize
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject values the capture loop cannot work with.
    pub fn validate(&self) -> crate::error::FlowResult<()> {
        use crate::error::FlowError;

        if self.sample_rate == 0 {
            return Err(FlowError::Config("sample_rate must be positive".into()));
        }
        if !(self.chunk_seconds.is_finite() && self.chunk_seconds > 0.0) {
            return Err(FlowError::Config("chunk_seconds must be positive".into()));
        }
        if self.chunk_samples(self.sample_rate) == 0 {
            return Err(FlowError::Config(format!(
                "chunk_seconds {} is shorter than one sample at {} Hz",
                self.chunk_seconds, self.sample_rate
            )));
        }
        if !(self.tail_padding_seconds.is_finite() && self.tail_padding_seconds >= 0.0) {
            return Err(FlowError::Config(
                "tail_padding_seconds must not be negative".into(),
            ));
        }
        if self.tail_padding_seconds > MAX_TAIL_PADDING_SECONDS {
            return Err(FlowError::Config(format!(
                "tail_padding_seconds must be at most {}",
                MAX_TAIL_PADDING_SECONDS
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(FlowError::Config(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("turnflow")
        .join("config.json")
}
