use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for Songcut
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Render target settings
    pub render: RenderConfig,

    /// Export pipeline settings
    pub export: ExportConfig,

    /// External media library settings
    pub library: LibraryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            export: ExportConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

/// Render target parameters handed to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Output frame rate
    pub fps: f64,

    /// Video codec to use for output
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30.0,
            codec: "libx264".to_string(),
            quality: 85,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.resolution".to_string(),
                value: format!("{}x{}", self.width, self.height),
            }
            .into());
        }

        if self.fps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "render.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "render.quality".to_string(),
                value: self.quality.to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Map the 0-100 quality knob onto ffmpeg's CRF scale
    pub fn crf(&self) -> u8 {
        (51.0 - (self.quality as f32 / 100.0) * 51.0).clamp(0.0, 51.0) as u8
    }
}

/// Export pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Progress sampling interval in milliseconds
    pub progress_interval_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 100,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if self.progress_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "export.progress_interval_ms".to_string(),
                value: self.progress_interval_ms.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// External media library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory exported videos are copied into on save
    pub dir: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("library"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original = Config::default();

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original.render.width, loaded.render.width);
        assert_eq!(original.render.fps, loaded.render.fps);
        assert_eq!(
            original.export.progress_interval_ms,
            loaded.export.progress_interval_ms
        );
    }

    #[test]
    fn test_invalid_resolution() {
        let mut config = Config::default();
        config.render.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.render.fps = -30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quality_to_crf_range() {
        let mut config = RenderConfig::default();
        config.quality = 0;
        assert_eq!(config.crf(), 51);
        config.quality = 100;
        assert_eq!(config.crf(), 0);
    }
}
