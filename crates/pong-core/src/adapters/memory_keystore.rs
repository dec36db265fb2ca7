//! In-memory private key store.

use crate::domain::{IdentityKey, KeyStoreError, SessionKey};
use crate::ports::outbound::PrivateKeyStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Keys {
    identity: HashMap<String, IdentityKey>,
    current_identity: Option<String>,
    sessions: HashMap<String, SessionKey>,
}

/// Key store held in process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<Keys>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity key. The first one added becomes the current key.
    pub async fn add_identity_key(&self, key: IdentityKey) {
        let mut keys = self.keys.write().await;
        if keys.current_identity.is_none() {
            keys.current_identity = Some(key.private_address.clone());
        }
        keys.identity.insert(key.private_address.clone(), key);
    }

    /// Number of session keys held.
    pub async fn session_key_count(&self) -> usize {
        self.keys.read().await.sessions.len()
    }
}

#[async_trait]
impl PrivateKeyStore for MemoryKeyStore {
    async fn fetch_identity_key(
        &self,
        private_address: &str,
    ) -> Result<IdentityKey, KeyStoreError> {
        self.keys
            .read()
            .await
            .identity
            .get(private_address)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound(private_address.to_string()))
    }

    async fn current_identity_key(&self) -> Result<IdentityKey, KeyStoreError> {
        let keys = self.keys.read().await;
        keys.current_identity
            .as_ref()
            .and_then(|address| keys.identity.get(address))
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound("current identity key".to_string()))
    }

    async fn fetch_session_key(
        &self,
        key_id: &[u8],
        peer_private_address: &str,
    ) -> Result<SessionKey, KeyStoreError> {
        let key_id_hex = hex::encode(key_id);
        let keys = self.keys.read().await;
        let key = keys
            .sessions
            .get(&key_id_hex)
            .ok_or_else(|| KeyStoreError::NotFound(key_id_hex.clone()))?;

        match &key.peer_private_address {
            Some(peer) if peer != peer_private_address => Err(KeyStoreError::NotFound(format!(
                "{key_id_hex} is bound to another peer"
            ))),
            _ => Ok(key.clone()),
        }
    }

    async fn save_session_key(&self, key: SessionKey) -> Result<(), KeyStoreError> {
        self.keys
            .write()
            .await
            .sessions
            .insert(key.key_id_hex(), key);
        Ok(())
    }
}
