use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ViewerError;
use crate::session::clamp_zoom;

pub const DEFAULT_ZOOM_STEP: u32 = 10;

/// User settings read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub default_zoom: u32,
    pub zoom_step: u32,
    pub log_filter: String,
    pub pdfium_library: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_zoom: 100,
            zoom_step: DEFAULT_ZOOM_STEP,
            log_filter: "info".to_string(),
            pdfium_library: None,
        }
    }
}

impl ViewerConfig {
    /// Loads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ViewerError::Config {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        };
        Self::parse(&raw).map_err(|err| ViewerError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        let config: Self = toml::from_str(raw)?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.default_zoom = clamp_zoom(i64::from(self.default_zoom));
        if self.zoom_step == 0 {
            self.zoom_step = DEFAULT_ZOOM_STEP;
        }
        self
    }
}
