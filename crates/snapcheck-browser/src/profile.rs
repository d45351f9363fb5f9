use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A throwaway user-data directory, one per verification run.
///
/// Each run gets a fresh browsing context: no cookies, cache, or local
/// storage survive between invocations. The directory is removed on drop.
pub struct EphemeralProfile {
    path: PathBuf,
}

impl EphemeralProfile {
    /// Create a fresh profile directory under the system temp dir
    pub fn create() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("snapcheck-profile-")
            .tempdir()
            .map_err(Error::Io)?;

        // Ownership of cleanup moves to this struct's Drop impl so the
        // directory outlives the TempDir handle.
        let path = temp_dir.keep();

        Ok(Self { path })
    }

    /// Get the profile directory path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_creates_and_cleans_up() {
        let profile = EphemeralProfile::create().unwrap();
        let path = profile.path().to_path_buf();

        assert!(path.exists());
        assert!(path.is_dir());

        drop(profile);

        assert!(!path.exists());
    }

    #[test]
    fn test_two_profiles_do_not_collide() {
        let a = EphemeralProfile::create().unwrap();
        let b = EphemeralProfile::create().unwrap();

        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_cleanup_survives_browser_droppings() {
        // Chrome writes into the profile; removal must handle a non-empty tree.
        let profile = EphemeralProfile::create().unwrap();
        let path = profile.path().to_path_buf();
        std::fs::create_dir_all(path.join("Default/Cache")).unwrap();
        std::fs::write(path.join("Default/Cache/data_0"), b"cache").unwrap();

        drop(profile);

        assert!(!path.exists());
    }
}
