//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoint settings.
    pub backend: BackendCfg,
    /// Record list defaults.
    pub list: ListCfg,
    /// Upload constraints enforced client-side.
    pub upload: UploadCfg,
    /// Upload history retention.
    pub history: HistoryCfg,
}

/// Where and how to reach the HOT22 ingestion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCfg {
    /// Base URL of the backend API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Defaults for the record list screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCfg {
    /// Records per page.
    pub page_size: usize,
    /// Page numbers shown in the footer window.
    pub page_window: usize,
    /// Pages kept in the response cache.
    pub cache_pages: usize,
}

/// Client-side upload validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCfg {
    /// Maximum accepted file size in megabytes.
    pub max_size_mb: u64,
}

impl UploadCfg {
    /// Size cap in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }
}

/// Retention of the upload history panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryCfg {
    /// Entries kept, most recent first.
    pub max_entries: usize,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendCfg {
                base_url: "http://localhost:3001".into(),
                timeout_secs: 30,
            },
            list: ListCfg {
                page_size: 20,
                page_window: 5,
                cache_pages: 32,
            },
            upload: UploadCfg { max_size_mb: 100 },
            history: HistoryCfg { max_entries: 10 },
        }
    }
}
