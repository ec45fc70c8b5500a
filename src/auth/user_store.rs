//! User Storage
//! Mission: Hold registered users in memory for the process lifetime

use crate::auth::models::User;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::info;

/// Registration failure modes.
#[derive(Debug)]
pub enum RegisterError {
    /// Username is the primary key; duplicates are rejected.
    DuplicateUser,
    /// Password hashing failed.
    Hash(bcrypt::BcryptError),
}

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterError::DuplicateUser => write!(f, "username already exists"),
            RegisterError::Hash(e) => write!(f, "failed to hash password: {}", e),
        }
    }
}

impl std::error::Error for RegisterError {}

/// In-memory credential store keyed by username. No persistence beyond
/// the process lifetime. Only the raw password hash is stored, never the
/// password itself.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user. Insert-if-absent under the write lock: under
    /// concurrent registration of the same username, exactly one caller
    /// wins and the rest get `DuplicateUser`.
    pub fn register(&self, username: &str, password: &str, role: &str) -> Result<User, RegisterError> {
        // Hash outside the lock; bcrypt is deliberately slow.
        let password_hash = hash(password, DEFAULT_COST).map_err(RegisterError::Hash)?;

        let user = User {
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
        };

        let mut users = self.users.write();
        match users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(RegisterError::DuplicateUser),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                info!(username, role, "Registered user");
                Ok(user)
            }
        }
    }

    /// Get a user by username.
    pub fn lookup(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }

    /// Verify username and password. Unknown users report `false`, same
    /// as a wrong password; callers must not distinguish the two.
    pub fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        match self.lookup(username) {
            Some(user) => {
                verify(password, &user.password_hash).context("Failed to verify password")
            }
            None => Ok(false),
        }
    }
}
