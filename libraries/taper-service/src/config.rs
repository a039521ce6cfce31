/// Service configuration
use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use taper_playback::PlaybackConfig;

/// Default configuration file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "taper.toml";

/// Environment prefix; nested keys use `__`, e.g. `TAPER_ARCHIVE__BASE_URL`
pub const ENV_PREFIX: &str = "TAPER";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_archive")]
    pub archive: ArchiveSettings,

    #[serde(default = "default_cache")]
    pub cache: CacheSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_service")]
    pub service: ServiceSettings,

    #[serde(default = "default_logging")]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchiveSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Recordings kept in memory
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_gapless")]
    pub gapless: bool,

    #[serde(default = "default_normal_volume")]
    pub normal_volume: f32,

    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceSettings {
    /// Seconds without playback before the service shuts itself down
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl ServiceConfig {
    /// Load configuration from `taper.toml` and `TAPER_*` environment variables
    pub fn load() -> Result<Self> {
        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        let file = path.exists().then_some(path.as_path());
        Self::load_from(file, ENV_PREFIX)
    }

    /// Load configuration from an optional file, then environment overrides
    pub fn load_from(file: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = file {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base_url = &self.archive.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ServiceError::Config(format!(
                "Archive URL must start with http:// or https:// (got {:?})",
                base_url
            )));
        }

        if self.archive.timeout_secs == 0 {
            return Err(ServiceError::Config(
                "Archive timeout must be at least one second".to_string(),
            ));
        }

        if self.cache.capacity == 0 {
            return Err(ServiceError::Config(
                "Cache capacity must be at least 1".to_string(),
            ));
        }

        let volumes = [self.playback.normal_volume, self.playback.duck_volume];
        if volumes.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(ServiceError::Config(
                "Volumes must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.playback.duck_volume > self.playback.normal_volume {
            return Err(ServiceError::Config(
                "Duck volume cannot exceed normal volume".to_string(),
            ));
        }

        if self.service.idle_timeout_secs == 0 {
            return Err(ServiceError::Config(
                "Idle timeout must be at least one second".to_string(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ServiceError::Config("Logging filter is empty".to_string()));
        }

        Ok(())
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            gapless: self.playback.gapless,
            normal_volume: self.playback.normal_volume,
            duck_volume: self.playback.duck_volume,
        }
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive.timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.service.idle_timeout_secs)
    }
}

// Default values
fn default_archive() -> ArchiveSettings {
    ArchiveSettings {
        base_url: default_base_url(),
        timeout_secs: default_timeout_secs(),
    }
}

fn default_base_url() -> String {
    taper_library::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache() -> CacheSettings {
    CacheSettings {
        capacity: default_cache_capacity(),
    }
}

fn default_cache_capacity() -> usize {
    64
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        gapless: default_gapless(),
        normal_volume: default_normal_volume(),
        duck_volume: default_duck_volume(),
    }
}

fn default_gapless() -> bool {
    true
}

fn default_normal_volume() -> f32 {
    taper_playback::types::VOLUME_NORMAL
}

fn default_duck_volume() -> f32 {
    taper_playback::types::VOLUME_DUCK
}

fn default_service() -> ServiceSettings {
    ServiceSettings {
        idle_timeout_secs: default_idle_timeout_secs(),
    }
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_logging() -> LoggingSettings {
    LoggingSettings {
        filter: default_filter(),
    }
}

fn default_filter() -> String {
    "taper=info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            archive: default_archive(),
            cache: default_cache(),
            playback: default_playback(),
            service: default_service(),
            logging: default_logging(),
        }
    }
}
