//! Signed-in user persistence.
//!
//! The current user is kept in `session.json` in the data directory. Commands
//! that work on tasks call [`Session::require`] to find out whose tasks to
//! load.

use crate::auth::UserProfile;
use crate::error::{Error, Result};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct Session {
    storage: Storage,
}

impl Session {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Remember `profile` as the signed-in user.
    pub fn sign_in(&self, profile: &UserProfile) -> Result<()> {
        self.storage.ensure_dir()?;
        self.storage.write_json(&self.storage.session_file(), profile)
    }

    /// Forget the signed-in user. Returns whether anyone was signed in.
    pub fn sign_out(&self) -> Result<bool> {
        let path = self.storage.session_file();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    pub fn current(&self) -> Result<Option<UserProfile>> {
        let profile: Option<UserProfile> =
            self.storage.read_json_opt(&self.storage.session_file())?;
        Ok(profile.filter(|profile| !profile.id.trim().is_empty()))
    }

    pub fn require(&self) -> Result<UserProfile> {
        self.current()?.ok_or(Error::NotSignedIn)
    }
}
