//! Configuration management for pc-sentinel.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scan-related settings
    pub scan: ScanConfig,
    /// Reputation lookup settings
    pub reputation: ReputationConfig,
    /// Chunked delivery settings
    pub delivery: DeliveryConfig,
    /// Report output settings
    pub reports: ReportConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| Error::ConfigSave(format!("Failed to write config file: {}", e)))
    }

    /// Load configuration from the default location, or fall back to defaults.
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("Failed to load config, using defaults: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Get the application data directory.
    pub fn data_dir() -> PathBuf {
        #[cfg(windows)]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData"))
                .join("PC-Sentinel")
        }

        #[cfg(not(windows))]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("pc-sentinel")
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.scan.max_scan_batches == 0 {
            return Err(Error::ConfigInvalid {
                field: "scan.max_scan_batches".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.scan.metadata_batch_size == 0 {
            return Err(Error::ConfigInvalid {
                field: "scan.metadata_batch_size".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.delivery.payload_ceiling_bytes < 1024 {
            return Err(Error::ConfigInvalid {
                field: "delivery.payload_ceiling_bytes".to_string(),
                message: "Must be at least 1024".to_string(),
            });
        }

        if self.reputation.timeout_secs == 0 {
            return Err(Error::ConfigInvalid {
                field: "reputation.timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Classifier strictness profile.
///
/// Two rule-constant sets exist by design: the full-drive scan path
/// uses the stricter variant, the simplified scanner the looser one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Random-name length >= 20, core keyword set
    #[default]
    Strict,
    /// Random-name length >= 10, extended keyword set
    Loose,
}

/// Scan-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Classifier strictness profile
    pub profile: Profile,
    /// Maximum concurrent directory-scan batches
    pub max_scan_batches: usize,
    /// Files per metadata verification batch
    pub metadata_batch_size: usize,
    /// Restrict the scan to these volume roots (empty = all drives)
    pub volumes: Vec<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Strict,
            max_scan_batches: 4,
            metadata_batch_size: 10,
            volumes: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Effective batch count: bounded by available parallelism and the cap.
    pub fn effective_batches(&self) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        cpus.min(self.max_scan_batches).max(1)
    }
}

/// Reputation lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Base URL of the reputation service
    pub endpoint: String,
    /// API key passed on every lookup
    pub api_key: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.steampowered.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Chunked delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Reporting endpoint base URL
    pub endpoint: String,
    /// Bearer token for the reporting endpoint
    pub api_token: String,
    /// Hard ceiling on a single delivered payload, in bytes
    pub payload_ceiling_bytes: usize,
    /// Skip delivery entirely (reports are still written)
    pub disabled: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_token: String::new(),
            // Conservative: well under the transport's real limit so an
            // envelope never tips a chunk over.
            payload_ceiling_bytes: 50 * 1024,
            disabled: false,
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the plain-text reports are written into
    pub output_dir: PathBuf,
    /// Suspicious-files report name
    pub suspicious_report: String,
    /// Recycle-bin report name
    pub recycle_report: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            suspicious_report: "Suspicious-files.txt".to_string(),
            recycle_report: "Recycle-files.txt".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn suspicious_report_path(&self) -> PathBuf {
        self.output_dir.join(&self.suspicious_report)
    }

    pub fn recycle_report_path(&self) -> PathBuf {
        self.output_dir.join(&self.recycle_report)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable verbose console output
    pub verbose_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            verbose_console: false,
        }
    }
}
