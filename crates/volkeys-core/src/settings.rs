// Volkeys Settings Module
// User-configurable defaults loaded from a TOML file

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Application settings, loaded from `<config>/volkeys/settings.toml`:
///
/// ```toml
/// [store]
/// dir = "/somewhere/else"
///
/// [defaults]
/// volume_up = "Ctrl+Shift+ScrollUp"
/// volume_down = "Ctrl+Shift+ScrollDown"
/// ```
///
/// `[defaults]` maps group names to chord strings used when no stored
/// bindings exist for that name. Entry order is registration order, which
/// is dispatch precedence.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    store_dir: Option<PathBuf>,
    defaults: IndexMap<String, String>,
    source_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    store: Option<StoreToml>,

    #[serde(default)]
    defaults: Option<IndexMap<String, String>>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct StoreToml {
    #[serde(default)]
    dir: Option<PathBuf>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();
        if let Some(store) = parsed.store {
            settings.store_dir = store.dir;
        }
        if let Some(defaults) = parsed.defaults {
            settings.defaults = defaults;
        }
        Ok(settings)
    }

    /// The default settings path, `<config>/volkeys/settings.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("volkeys").join("settings.toml"))
    }

    /// Load from the default path; a missing file yields empty settings.
    pub fn load_default() -> Result<Self, SettingsError> {
        let Some(path) = Self::default_path() else {
            return Ok(Self::new());
        };
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::from_file(path)
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults
            .iter()
            .map(|(name, chord)| (name.as_str(), chord.as_str()))
    }

    pub fn default_chord(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}
