//! User registration and sign-in.
//!
//! Users live in `users.json`. Passwords are stored as PBKDF2-HMAC-SHA256
//! keys; the iteration count is kept per user so a config change does not
//! lock existing accounts out.

use chrono::{DateTime, Utc};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::lock;
use crate::storage::Storage;

/// Public identity handed to the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub hash_rounds: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    fn password_matches(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password, self.hash_rounds);
        candidate
            .as_bytes()
            .ct_eq(self.password_hash.as_bytes())
            .into()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRegistry {
    pub users: Vec<User>,
}

impl UserRegistry {
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users.iter().find(|user| user.email == email)
    }
}

#[derive(Debug, Clone)]
pub struct UserStore {
    storage: Storage,
    config: AuthConfig,
}

impl UserStore {
    pub fn new(storage: Storage, config: AuthConfig) -> Self {
        Self { storage, config }
    }

    /// Register a new user.
    pub fn signup(&self, name: &str, email: &str, password: &str) -> Result<UserProfile> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::Validation("All fields are required".to_string()));
        }
        if !email.contains('@') {
            return Err(Error::Validation(format!("Invalid email address: {email}")));
        }
        if password.chars().count() < self.config.min_password_len {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_len
            )));
        }

        self.storage.ensure_dir()?;
        let path = self.storage.users_file();
        lock::with_lock(&path, || {
            let mut registry = self.read_registry()?;
            if registry.find_by_email(&email).is_some() {
                return Err(Error::EmailTaken(email.clone()));
            }

            let salt = Uuid::new_v4().simple().to_string();
            let user = User {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.clone(),
                password_hash: hash_password(&salt, password, self.config.hash_rounds),
                salt,
                hash_rounds: self.config.hash_rounds,
                created_at: Utc::now(),
            };
            let profile = user.profile();
            registry.users.push(user);
            self.storage.write_json(&path, &registry)?;
            tracing::info!(user_id = %profile.id, "registered user");
            Ok(profile)
        })
    }

    /// Check credentials. Unknown email and wrong password fail the same way.
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation("All fields are required".to_string()));
        }

        let registry = self.read_registry()?;
        match registry.find_by_email(&email) {
            Some(user) if user.password_matches(password) => {
                tracing::info!(user_id = %user.id, "signed in");
                Ok(user.profile())
            }
            _ => {
                tracing::debug!("rejected credentials");
                Err(Error::InvalidCredentials)
            }
        }
    }

    fn read_registry(&self) -> Result<UserRegistry> {
        Ok(self
            .storage
            .read_json_opt(&self.storage.users_file())?
            .unwrap_or_default())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str, rounds: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds.max(1), &mut key);
    key.iter().map(|byte| format!("{byte:02x}")).collect()
}
