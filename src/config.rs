use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ReelpressError};

/// Environment variable holding the flash-cookie signing secret.
pub const SECRET_ENV: &str = "REELPRESS_SECRET";
/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";
/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "reelpress.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Key used to sign flash messages
    pub secret: String,
    /// Largest accepted request body for uploads, in megabytes
    pub max_upload_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for raw uploads (`<id>_<filename>`)
    pub upload_dir: PathBuf,
    /// Directory for produced outputs (`<base>_processed.<ext>`)
    pub output_dir: PathBuf,
    /// Files older than this are removed by the janitor. 0 keeps files forever.
    pub retention_hours: u64,
    /// How often the janitor runs
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Upper bound on each external tool run. 0 waits indefinitely.
    pub timeout_secs: u64,
    /// Caption burned into the portrait overlay
    pub overlay_text: String,
    /// Font file used by drawtext
    pub overlay_font: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            secret: "change-me".to_string(),
            max_upload_mb: 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            retention_hours: 0,
            sweep_interval_secs: 3600,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: 0,
            overlay_text: "@TowsifAktar".to_string(),
            overlay_font: "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string(),
        }
    }
}

impl MediaConfig {
    /// Bounded wait for external tools, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl StorageConfig {
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_hours > 0)
            .then(|| Duration::from_secs(self.retention_hours.saturating_mul(3600)))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReelpressError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ReelpressError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReelpressError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ReelpressError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from an explicit path, else `reelpress.toml` in the working
    /// directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply `PORT` and `REELPRESS_SECRET` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(PORT_ENV).ok().as_deref(),
            std::env::var(SECRET_ENV).ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, port: Option<&str>, secret: Option<&str>) -> Result<()> {
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.server.port = port.trim().parse().map_err(|_| {
                ReelpressError::Config(format!("Invalid {} value '{}'", PORT_ENV, port))
            })?;
        }
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.server.secret = secret.to_string();
        }
        Ok(())
    }
}
