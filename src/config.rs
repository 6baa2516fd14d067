use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::metadata::Result;

/// How file-backed records are read and persisted.
///
/// ```rust,no_run
/// use photo_fields::config::StoreConfig;
///
/// let mut config = StoreConfig::load("fields.json".as_ref()).unwrap();
/// config.embed_exif = false;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Appended to the image file name to form the sidecar path.
    pub sidecar_suffix: String,
    /// Also write catalog Exif tags into the image on save, for formats that
    /// can carry embedded Exif.
    pub embed_exif: bool,
    /// Also write XMP properties into the image's own packet on save.
    pub embed_xmp: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sidecar_suffix: String::from(".fields.json"),
            embed_exif: true,
            embed_xmp: true,
        }
    }
}

impl StoreConfig {
    /// Missing files yield the defaults; malformed ones are an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
