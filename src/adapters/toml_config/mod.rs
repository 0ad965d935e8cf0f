// TOML config adapter - Loads clipper options from a TOML file

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::ClipperOptions;
use crate::utils::path::home_dir;

const APP_DIR: &str = "mpv-clipper";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "mpv-clipper.toml";

/// TOML configuration adapter
///
/// An explicitly given file must exist. Otherwise the first existing file
/// among [`default_locations`](Self::default_locations) is used, and plain
/// defaults apply when there is none.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigAdapter {
    explicit: Option<PathBuf>,
}

impl TomlConfigAdapter {
    /// Adapter searching the default locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter reading exactly `path`
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
        }
    }

    /// Candidate config files in lookup order
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            locations.push(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
        }
        if let Some(home) = home_dir() {
            let path = home.join(".config").join(APP_DIR).join(CONFIG_FILE);
            if !locations.contains(&path) {
                locations.push(path);
            }
        }
        locations.push(PathBuf::from(LOCAL_CONFIG_FILE));
        locations
    }

    /// Config file that `load` would read
    pub fn locate(&self) -> Result<Option<PathBuf>, ClipError> {
        if let Some(path) = &self.explicit {
            if !path.is_file() {
                return Err(ClipError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }
        Ok(Self::default_locations().into_iter().find(|p| p.is_file()))
    }

    /// Load and validate options
    pub fn load(&self) -> Result<ClipperOptions, ClipError> {
        let options = match self.locate()? {
            Some(path) => {
                let options = Self::read_file(&path)?;
                info!(path = %path.display(), "loaded configuration");
                options
            }
            None => {
                debug!("no configuration file found, using defaults");
                ClipperOptions::default()
            }
        };
        options.validate()?;
        Ok(options)
    }

    fn read_file(path: &Path) -> Result<ClipperOptions, ClipError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClipError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| match e {
            ClipError::Config(msg) => ClipError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse options from TOML text; missing keys take their defaults
    pub fn parse(content: &str) -> Result<ClipperOptions, ClipError> {
        toml::from_str(content)
            .map_err(|e| ClipError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Render options as TOML, used by `probe` to show the effective config
    pub fn render(options: &ClipperOptions) -> Result<String, ClipError> {
        toml::to_string_pretty(options)
            .map_err(|e| ClipError::Config(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UploadHost;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let options = TomlConfigAdapter::parse(
            r#"
            output_dir = "/clips"
            video_bitrate = "5M"
            upload_host = "permanent"
            "#,
        )
        .unwrap();
        assert_eq!(options.output_dir, "/clips");
        assert_eq!(options.video_bitrate, "5M");
        assert_eq!(options.upload_host, UploadHost::Permanent);
        assert_eq!(options.audio_codec, ClipperOptions::default().audio_codec);
        assert_eq!(options.cache_margin, 5.0);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfigAdapter::parse("output_dir = [").unwrap_err();
        assert!(matches!(err, ClipError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let adapter = TomlConfigAdapter::with_file("/no/such/config.toml");
        assert!(matches!(adapter.load(), Err(ClipError::Config(_))));
    }

    #[test]
    fn test_explicit_file_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "litterbox_retention = \"5d\"").unwrap();
        let adapter = TomlConfigAdapter::with_file(file.path());
        let err = adapter.load().unwrap_err().to_string();
        assert!(err.contains("litterbox_retention"), "unexpected error: {err}");
    }

    #[test]
    fn test_render_round_trips() {
        let options = ClipperOptions {
            height: Some(720),
            ..ClipperOptions::default()
        };
        let text = TomlConfigAdapter::render(&options).unwrap();
        assert_eq!(TomlConfigAdapter::parse(&text).unwrap(), options);
    }
}
