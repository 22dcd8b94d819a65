//! Connection profile persistence.
//!
//! The profile is written only after the server confirms it by authorizing
//! the connection, so the stored file always describes a setup that worked
//! at least once. A missing file is not an error: first launch loads the
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use parlor_core::types::ConnectionProfile;

/// Profile store failures.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile parse error: {0}")]
    Parse(String),
    #[error("no configuration directory available")]
    NoConfigDir,
}

/// Load and save the connection profile.
///
/// Implementations must be cheap to call from the session reactor; saves
/// happen at most once per successful authorization.
pub trait ProfileStore: Send {
    fn load(&self) -> Result<ConnectionProfile, ProfileError>;
    fn save(&self, profile: &ConnectionProfile) -> Result<(), ProfileError>;
}

impl<S: ProfileStore + Sync> ProfileStore for std::sync::Arc<S> {
    fn load(&self) -> Result<ConnectionProfile, ProfileError> {
        (**self).load()
    }

    fn save(&self, profile: &ConnectionProfile) -> Result<(), ProfileError> {
        (**self).save(profile)
    }
}

// ----------------------------------------------------------------------------
// TOML file store
// ----------------------------------------------------------------------------

/// Profile store backed by a TOML file in the platform config directory.
pub struct TomlProfileStore {
    path: PathBuf,
}

impl TomlProfileStore {
    /// Store at the platform default location
    /// (`<config dir>/parlor/settings.toml`).
    pub fn new() -> Result<Self, ProfileError> {
        let path = dirs::config_dir()
            .ok_or(ProfileError::NoConfigDir)?
            .join("parlor")
            .join("settings.toml");
        Ok(Self { path })
    }

    /// Store at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for TomlProfileStore {
    fn load(&self) -> Result<ConnectionProfile, ProfileError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no stored profile, using defaults");
            return Ok(ConnectionProfile::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        toml::from_str(&raw).map_err(|e| ProfileError::Parse(e.to_string()))
    }

    fn save(&self, profile: &ConnectionProfile) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(profile).map_err(|e| ProfileError::Parse(e.to_string()))?;
        fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// In-memory store
// ----------------------------------------------------------------------------

/// In-memory profile store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryProfileStore {
    profile: Mutex<Option<ConnectionProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved profile, if any.
    pub fn saved(&self) -> Option<ConnectionProfile> {
        self.profile.lock().ok().and_then(|p| p.clone())
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<ConnectionProfile, ProfileError> {
        Ok(self
            .profile
            .lock()
            .ok()
            .and_then(|p| p.clone())
            .unwrap_or_default())
    }

    fn save(&self, profile: &ConnectionProfile) -> Result<(), ProfileError> {
        if let Ok(mut slot) = self.profile.lock() {
            *slot = Some(profile.clone());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::types::Gender;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("parlor-test-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = TomlProfileStore::at_path(scratch_path("missing").join("settings.toml"));
        let profile = store.load().expect("defaults");
        assert_eq!(profile, ConnectionProfile::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = scratch_path("roundtrip");
        let store = TomlProfileStore::at_path(dir.join("settings.toml"));

        let profile = ConnectionProfile {
            server: "chat.example.org".to_string(),
            port: 27801,
            user_name: "Ann".to_string(),
            gender: Gender::Female,
            user_color: "#16a085".to_string(),
        };
        store.save(&profile).expect("save");
        assert_eq!(store.load().expect("load"), profile);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let dir = scratch_path("garbage");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, "not = [valid").unwrap();

        let store = TomlProfileStore::at_path(&path);
        assert!(matches!(store.load(), Err(ProfileError::Parse(_))));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn memory_store_records_last_save() {
        let store = MemoryProfileStore::new();
        assert_eq!(store.saved(), None);
        assert_eq!(store.load().unwrap(), ConnectionProfile::default());

        let profile = ConnectionProfile {
            user_name: "Bob".to_string(),
            ..ConnectionProfile::default()
        };
        store.save(&profile).unwrap();
        assert_eq!(store.saved(), Some(profile.clone()));
        assert_eq!(store.load().unwrap(), profile);
    }
}
