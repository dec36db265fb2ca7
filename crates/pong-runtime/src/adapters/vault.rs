//! # Vault Key Store
//!
//! Private keys in a HashiCorp Vault KV v2 secrets engine.
//!
//! ## Layout
//!
//! | Secret | Contents |
//! |--------|----------|
//! | `identity-keys/{private address}` | [`IdentityKey`] |
//! | `identity-keys/current` | `{"private_address": ...}` |
//! | `session-keys/{hex key id}` | [`SessionKey`] |

use async_trait::async_trait;
use pong_core::{IdentityKey, KeyStoreError, PrivateKeyStore, SessionKey};
use pong_gateway::VaultConfig;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const TOKEN_HEADER: &str = "X-Vault-Token";
const CURRENT_IDENTITY: &str = "identity-keys/current";

#[derive(Deserialize)]
struct ReadResponse<T> {
    data: SecretData<T>,
}

#[derive(Deserialize)]
struct SecretData<T> {
    data: T,
}

#[derive(Serialize, Deserialize)]
struct CurrentIdentity {
    private_address: String,
}

/// Key store backed by Vault KV v2.
pub struct VaultKeyStore {
    client: Client,
    base_url: String,
    token: String,
    kv_prefix: String,
}

impl VaultKeyStore {
    /// Create a store whose requests give up after `timeout`.
    pub fn new(config: &VaultConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            kv_prefix: config.kv_prefix.trim_matches('/').to_string(),
        })
    }

    fn secret_url(&self, name: &str) -> String {
        format!("{}/v1/{}/data/{}", self.base_url, self.kv_prefix, name)
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, KeyStoreError> {
        let response = self
            .client
            .get(self.secret_url(name))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(KeyStoreError::NotFound(name.to_string())),
            status => {
                return Err(KeyStoreError::Unavailable(format!(
                    "Vault answered {status} reading {name}"
                )))
            }
        }

        let body: ReadResponse<T> = response
            .json()
            .await
            .map_err(|e| KeyStoreError::Corrupt(format!("{name}: {e}")))?;
        Ok(body.data.data)
    }

    async fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), KeyStoreError> {
        let response = self
            .client
            .post(self.secret_url(name))
            .header(TOKEN_HEADER, &self.token)
            .json(&json!({ "data": value }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyStoreError::Unavailable(format!(
                "Vault answered {status} writing {name}"
            )));
        }
        debug!(secret = name, "Stored secret");
        Ok(())
    }

    /// Store an identity key, making it the current one if `make_current`.
    pub async fn save_identity_key(
        &self,
        key: &IdentityKey,
        make_current: bool,
    ) -> Result<(), KeyStoreError> {
        self.write(&identity_secret(&key.private_address), key)
            .await?;
        if make_current {
            self.write(
                CURRENT_IDENTITY,
                &CurrentIdentity {
                    private_address: key.private_address.clone(),
                },
            )
            .await?;
        }
        Ok(())
    }
}

fn identity_secret(private_address: &str) -> String {
    format!("identity-keys/{private_address}")
}

fn session_secret(key_id_hex: &str) -> String {
    format!("session-keys/{key_id_hex}")
}

fn request_error(error: reqwest::Error) -> KeyStoreError {
    if error.is_timeout() {
        KeyStoreError::Timeout
    } else {
        KeyStoreError::Unavailable(error.to_string())
    }
}

#[async_trait]
impl PrivateKeyStore for VaultKeyStore {
    async fn fetch_identity_key(
        &self,
        private_address: &str,
    ) -> Result<IdentityKey, KeyStoreError> {
        self.read(&identity_secret(private_address)).await
    }

    async fn current_identity_key(&self) -> Result<IdentityKey, KeyStoreError> {
        let current: CurrentIdentity = self.read(CURRENT_IDENTITY).await?;
        self.fetch_identity_key(&current.private_address).await
    }

    async fn fetch_session_key(
        &self,
        key_id: &[u8],
        peer_private_address: &str,
    ) -> Result<SessionKey, KeyStoreError> {
        let key_id_hex = hex::encode(key_id);
        let key: SessionKey = self.read(&session_secret(&key_id_hex)).await?;

        match &key.peer_private_address {
            Some(peer) if peer != peer_private_address => Err(KeyStoreError::NotFound(format!(
                "{key_id_hex} is bound to another peer"
            ))),
            _ => Ok(key),
        }
    }

    async fn save_session_key(&self, key: SessionKey) -> Result<(), KeyStoreError> {
        self.write(&session_secret(&key.key_id_hex()), &key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_server;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Secrets = Arc<Mutex<HashMap<String, Value>>>;

    const TOKEN: &str = "s.root";

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) == Some(TOKEN)
    }

    async fn read_secret(
        State(secrets): State<Secrets>,
        Path(name): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        if !authorized(&headers) {
            return AxumStatus::FORBIDDEN.into_response();
        }
        match secrets.lock().unwrap().get(&name) {
            Some(value) => Json(json!({"data": {"data": value}})).into_response(),
            None => AxumStatus::NOT_FOUND.into_response(),
        }
    }

    async fn write_secret(
        State(secrets): State<Secrets>,
        Path(name): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        if !authorized(&headers) {
            return AxumStatus::FORBIDDEN.into_response();
        }
        secrets.lock().unwrap().insert(name, body["data"].clone());
        Json(json!({"data": {"version": 1}})).into_response()
    }

    /// Minimal KV v2 engine mounted at `pong-keys`.
    async fn vault() -> VaultConfig {
        let secrets: Secrets = Arc::default();
        let router = Router::new()
            .route(
                "/v1/pong-keys/data/*name",
                get(read_secret).post(write_secret),
            )
            .with_state(secrets);
        let addr = mock_server::spawn(router).await;
        VaultConfig {
            url: format!("http://{addr}/"),
            token: TOKEN.to_string(),
            kv_prefix: "pong-keys".to_string(),
        }
    }

    fn identity(address: &str) -> IdentityKey {
        IdentityKey {
            private_address: address.to_string(),
            key_der: vec![1, 2, 3],
            certificate_der: vec![4, 5, 6],
        }
    }

    fn session(peer: Option<&str>) -> SessionKey {
        SessionKey {
            key_id: vec![0xab, 0xcd],
            key_der: vec![7],
            owner_private_address: "0us".to_string(),
            peer_private_address: peer.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_identity_key_round_trip() {
        let store = VaultKeyStore::new(&vault().await, Duration::from_secs(5)).unwrap();
        store.save_identity_key(&identity("0us"), true).await.unwrap();

        assert_eq!(store.fetch_identity_key("0us").await.unwrap(), identity("0us"));
        assert_eq!(store.current_identity_key().await.unwrap(), identity("0us"));
    }

    #[tokio::test]
    async fn test_missing_identity_key() {
        let store = VaultKeyStore::new(&vault().await, Duration::from_secs(5)).unwrap();

        assert!(matches!(
            store.fetch_identity_key("0stranger").await,
            Err(KeyStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.current_identity_key().await,
            Err(KeyStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_session_key_bound_to_peer() {
        let store = VaultKeyStore::new(&vault().await, Duration::from_secs(5)).unwrap();
        store.save_session_key(session(Some("0peer"))).await.unwrap();

        assert_eq!(
            store.fetch_session_key(&[0xab, 0xcd], "0peer").await.unwrap(),
            session(Some("0peer"))
        );
        assert!(matches!(
            store.fetch_session_key(&[0xab, 0xcd], "0other").await,
            Err(KeyStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_token_is_infrastructure_failure() {
        let mut config = vault().await;
        config.token = "s.wrong".to_string();
        let store = VaultKeyStore::new(&config, Duration::from_secs(5)).unwrap();

        let error = store.fetch_identity_key("0us").await.unwrap_err();
        assert!(error.is_infrastructure());
    }

    #[tokio::test]
    async fn test_unreachable_vault() {
        let config = VaultConfig {
            url: "http://127.0.0.1:1".to_string(),
            token: TOKEN.to_string(),
            kv_prefix: "pong-keys".to_string(),
        };
        let store = VaultKeyStore::new(&config, Duration::from_secs(5)).unwrap();

        assert!(matches!(
            store.fetch_identity_key("0us").await,
            Err(KeyStoreError::Unavailable(_))
        ));
    }
}
