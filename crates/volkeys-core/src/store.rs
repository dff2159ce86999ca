// Volkeys Binding Store
// One resource file per binding group, with quarantine on corruption

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::codec::{self, CorruptError};
use crate::group::BindingGroup;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no config directory available on this system")]
    NoConfigDir,

    #[error("resource '{name}' is corrupt and was quarantined to {path}: {source}", path = .quarantine.display())]
    Corrupt {
        name: String,
        quarantine: PathBuf,
        source: CorruptError,
    },
}

/// Keyed storage for binding groups: `<dir>/<name>.kbd` in the canonical
/// codec text form.
///
/// A missing resource is not an error; the caller falls back to its
/// default group. A corrupt resource is renamed to `<name>.kbd.invalid`
/// rather than deleted, keeping the evidence around for inspection.
#[derive(Debug, Clone)]
pub struct BindingStore {
    dir: PathBuf,
}

impl BindingStore {
    /// Store under the user config directory, `<config>/volkeys/`.
    pub fn open_default() -> Result<Self, StoreError> {
        let base = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self {
            dir: base.join("volkeys"),
        })
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.kbd"))
    }

    /// Persist a group, creating the store directory on first use. Called
    /// after every group mutation.
    pub fn save(&self, group: &BindingGroup) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(group.name());
        fs::write(&path, codec::encode_group(group))?;
        log::debug!("saved binding group '{}' to {}", group.name(), path.display());
        Ok(())
    }

    /// Load a group. `Ok(None)` when the resource does not exist; a
    /// corrupt resource is quarantined and reported.
    pub fn load(&self, name: &str) -> Result<Option<BindingGroup>, StoreError> {
        let path = self.path_for(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match codec::decode_group(name, &text) {
            Ok(decoded) => {
                for rejection in &decoded.rejected {
                    log::warn!("binding in '{name}' skipped: {rejection}");
                }
                Ok(Some(decoded.group))
            }
            Err(source) => {
                let quarantine = quarantine_path(&path);
                fs::rename(&path, &quarantine)?;
                log::warn!(
                    "quarantined corrupt binding resource '{}' to {}",
                    name,
                    quarantine.display()
                );
                Err(StoreError::Corrupt {
                    name: name.to_string(),
                    quarantine,
                    source,
                })
            }
        }
    }

    /// Load with fallback: missing or unusable resources degrade to the
    /// supplied default group.
    pub fn load_or(&self, name: &str, default: BindingGroup) -> BindingGroup {
        match self.load(name) {
            Ok(Some(group)) => group,
            Ok(None) => {
                log::info!("no stored bindings for '{name}', using defaults");
                default
            }
            Err(err) => {
                log::warn!("falling back to default bindings for '{name}': {err}");
                default
            }
        }
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".invalid");
    PathBuf::from(os)
}
