//! User profile lookup used during rotation
//!
//! Refresh tokens carry only the user identifier. Rotation needs the current
//! email and role, so the lifecycle manager asks a [`ProfileStore`] for them.
//! Durable storage lives outside this crate; [`InMemoryProfiles`] backs the
//! bundled server and the tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::claims::Identity;
use super::trust::TrustLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl<T: TrustLevel> From<&Identity<T>> for Profile {
    fn from(identity: &Identity<T>) -> Self {
        Self {
            id: identity.subject().to_string(),
            email: identity.email().to_string(),
            role: identity.role().to_string(),
            metadata: identity.user_metadata().clone(),
        }
    }
}

/// Profile lookup capability injected into token rotation.
pub trait ProfileStore: Send + Sync {
    fn get(&self, user_id: &str) -> Option<Profile>;

    /// Insert or replace the profile keyed by `profile.id`.
    fn upsert(&self, profile: Profile);
}

#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl ProfileStore for InMemoryProfiles {
    fn get(&self, user_id: &str) -> Option<Profile> {
        self.profiles.read().get(user_id).cloned()
    }

    fn upsert(&self, profile: Profile) {
        self.profiles.write().insert(profile.id.clone(), profile);
    }
}
