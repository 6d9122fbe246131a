//! In-memory handle store for testing and ephemeral servers

use async_trait::async_trait;
use devstats_domain::{HandleStore, Platform, PlatformIdentity, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory handle store implementation
pub struct InMemoryHandleStore {
    users: RwLock<HashMap<String, BTreeMap<Platform, String>>>,
}

impl InMemoryHandleStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryHandleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HandleStore for InMemoryHandleStore {
    async fn get_handles(&self, user_id: &str) -> Result<Vec<PlatformIdentity>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(users
            .get(user_id)
            .map(|handles| {
                handles
                    .iter()
                    .map(|(platform, handle)| PlatformIdentity::new(*platform, handle.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_handle(
        &self,
        user_id: &str,
        identity: &PlatformIdentity,
    ) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        users
            .entry(user_id.to_string())
            .or_default()
            .insert(identity.platform, identity.handle.clone());
        Ok(())
    }

    async fn remove_handle(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(users
            .get_mut(user_id)
            .and_then(|handles| handles.remove(&platform))
            .is_some())
    }
}
