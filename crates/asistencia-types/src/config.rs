use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{AsistenciaError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub device_index: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub ffmpeg_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// When set, frames that contained a code are persisted here as PNG.
    pub capture_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub endpoint_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsistenciaConfig {
    pub camera: CameraConfig,
    pub vision: VisionConfig,
    pub reporter: ReporterConfig,
    pub scanner: ScannerConfig,
    pub ops: OpsConfig,
}

impl ReporterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScannerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl AsistenciaConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            AsistenciaError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            AsistenciaError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            return Err(AsistenciaError::Configuration(
                "camera.frame_width and camera.frame_height must be greater than zero".into(),
            ));
        }
        if self.reporter.endpoint_url.is_empty() {
            return Err(AsistenciaError::Configuration(
                "reporter.endpoint_url must not be empty".into(),
            ));
        }
        if !self.reporter.endpoint_url.starts_with("http://")
            && !self.reporter.endpoint_url.starts_with("https://")
        {
            return Err(AsistenciaError::Configuration(
                "reporter.endpoint_url must be an http(s) URL".into(),
            ));
        }
        if self.reporter.timeout_secs == 0 {
            return Err(AsistenciaError::Configuration(
                "reporter.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AsistenciaConfig {
        AsistenciaConfig {
            camera: CameraConfig {
                device_index: 0,
                frame_width: 640,
                frame_height: 480,
                ffmpeg_path: None,
            },
            vision: VisionConfig {
                capture_dir: Some("capturas".into()),
            },
            reporter: ReporterConfig {
                endpoint_url: "http://localhost:5000/api/asistencia".into(),
                timeout_secs: 5,
            },
            scanner: ScannerConfig { cooldown_secs: 3 },
            ops: OpsConfig {
                log_level: "debug".into(),
            },
        }
    }

    #[test]
    fn load_config_from_file() {
        let temp_path = std::env::temp_dir().join("asistencia-config-test.toml");
        let config = sample_config();

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = AsistenciaConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.camera.frame_width, config.camera.frame_width);
        assert_eq!(loaded.reporter.endpoint_url, config.reporter.endpoint_url);
        assert_eq!(loaded.scanner.cooldown_secs, config.scanner.cooldown_secs);
        assert_eq!(loaded.vision.capture_dir, config.vision.capture_dir);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.camera.frame_width = 0;
        assert!(config.validate().is_err());
        config.camera.frame_width = 640;
        config.reporter.endpoint_url = String::new();
        assert!(config.validate().is_err());
        config.reporter.endpoint_url = "ftp://backend".into();
        assert!(config.validate().is_err());
        config.reporter.endpoint_url = "http://localhost:5000/api/asistencia".into();
        config.reporter.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.reporter.timeout_secs = 5;
        assert!(config.validate().is_ok());
    }
}
