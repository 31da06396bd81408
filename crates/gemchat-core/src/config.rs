//! Application configuration model (`config.toml`).
//!
//! Every section and field has a default, so a missing file or a partial file
//! both produce a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default snapshot slot name.
pub const DEFAULT_STORAGE_KEY: &str = "gemini-storage";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub countries: CountriesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Key of the snapshot slot in the key-value store.
    pub key: String,
    /// Overrides the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            state_dir: None,
        }
    }
}

/// Timing and shape of simulated replies.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReplyConfig {
    /// Pause before a reply is queued, shown as "typing". The web client
    /// waited 1500 ms here; the shell replies without it unless configured.
    pub typing_delay_ms: u64,
    /// Minimum spacing between two reply completions.
    pub min_gap_ms: u64,
    /// Fixed "thinking" latency added to every reply.
    pub thinking_ms: u64,
    /// Number of prompt characters echoed back.
    pub preview_chars: usize,
    pub prefix: String,
    pub suffix: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: 0,
            min_gap_ms: 1500,
            thinking_ms: 900,
            preview_chars: 120,
            prefix: "Gemini: ".to_string(),
            suffix: " (simulated reply)".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OtpConfig {
    /// Validity window of an issued code.
    pub ttl_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CountriesConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://restcountries.com/v3.1/all?fields=name,idd,cca2".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"gemchat_core=debug"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
