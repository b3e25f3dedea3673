use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ApiError;

const ENCRYPTION_VERSION: u8 = 1;
const STORE_FILE: &str = "credentials.enc";

/// Entry name of the market-data provider key
pub const MARKET_DATA_API_KEY: &str = "market-data-api-key";

#[derive(Serialize, Deserialize, Clone)]
struct EncryptedCredential {
    nonce: String,      // Base64 encoded nonce
    ciphertext: String, // Base64 encoded encrypted data
}

#[derive(Serialize, Deserialize)]
struct CredentialStore {
    version: u8,
    salt: String, // Base64 encoded salt for key derivation
    credentials: HashMap<String, EncryptedCredential>,
}

/// Encrypted key/value file for API keys, bound to this machine and user.
pub struct SecureStorage {
    store_path: PathBuf,
    master_key: Vec<u8>,
}

impl SecureStorage {
    pub fn new(data_dir: &Path) -> Result<Self, ApiError> {
        let store_path = data_dir.join(STORE_FILE);

        // The salt must survive restarts or old entries become unreadable.
        let store = Self::load_or_create_store(&store_path)?;
        if !store_path.exists() {
            Self::write_store(&store_path, &store)?;
        }

        let master_key = Self::derive_key(&Self::machine_id(), &store.salt)?;

        Ok(Self {
            store_path,
            master_key,
        })
    }

    fn load_or_create_store(store_path: &Path) -> Result<CredentialStore, ApiError> {
        if store_path.exists() {
            let data = fs::read(store_path)
                .map_err(|e| ApiError::EncryptionError(format!("Failed to read store: {}", e)))?;

            serde_json::from_slice(&data)
                .map_err(|e| ApiError::EncryptionError(format!("Failed to parse store: {}", e)))
        } else {
            let mut salt_bytes = [0u8; 16];
            OsRng.fill_bytes(&mut salt_bytes);

            Ok(CredentialStore {
                version: ENCRYPTION_VERSION,
                salt: BASE64.encode(salt_bytes),
                credentials: HashMap::new(),
            })
        }
    }

    fn machine_id() -> String {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());

        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown-user".to_string());

        format!("trades-tracker-{}-{}", hostname, username)
    }

    fn derive_key(machine_id: &str, salt_b64: &str) -> Result<Vec<u8>, ApiError> {
        use argon2::{Algorithm, Params, Version};

        let salt_bytes = BASE64
            .decode(salt_b64)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid salt: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());

        let mut output_key = [0u8; 32]; // AES-256
        argon2
            .hash_password_into(machine_id.as_bytes(), &salt_bytes, &mut output_key)
            .map_err(|e| ApiError::EncryptionError(format!("Key derivation failed: {}", e)))?;

        Ok(output_key.to_vec())
    }

    fn write_store(store_path: &Path, store: &CredentialStore) -> Result<(), ApiError> {
        let data = serde_json::to_vec_pretty(store)
            .map_err(|e| ApiError::EncryptionError(format!("Failed to serialize store: {}", e)))?;

        if let Some(parent) = store_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::EncryptionError(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(store_path, data)
            .map_err(|e| ApiError::EncryptionError(format!("Failed to write store: {}", e)))
    }

    fn cipher(&self) -> Result<Aes256Gcm, ApiError> {
        Aes256Gcm::new_from_slice(&self.master_key)
            .map_err(|e| ApiError::EncryptionError(format!("Failed to create cipher: {}", e)))
    }

    pub fn store(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self.cipher()?.encrypt(nonce, value.as_bytes())?;

        let mut store = Self::load_or_create_store(&self.store_path)?;
        store.credentials.insert(
            key.to_string(),
            EncryptedCredential {
                nonce: BASE64.encode(nonce_bytes),
                ciphertext: BASE64.encode(&ciphertext),
            },
        );

        Self::write_store(&self.store_path, &store)?;
        log::info!("Credential '{}' stored", key);
        Ok(())
    }

    /// `Ok(None)` when nothing is stored under `key`.
    pub fn retrieve(&self, key: &str) -> Result<Option<String>, ApiError> {
        let store = Self::load_or_create_store(&self.store_path)?;

        let Some(encrypted) = store.credentials.get(key) else {
            return Ok(None);
        };

        let nonce_bytes = BASE64
            .decode(&encrypted.nonce)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid nonce: {}", e)))?;
        if nonce_bytes.len() != 12 {
            return Err(ApiError::EncryptionError("Invalid nonce length".to_string()));
        }
        let ciphertext = BASE64
            .decode(&encrypted.ciphertext)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid ciphertext: {}", e)))?;

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| ApiError::EncryptionError(format!("Invalid UTF-8: {}", e)))
    }

    pub fn delete(&self, key: &str) -> Result<(), ApiError> {
        let mut store = Self::load_or_create_store(&self.store_path)?;
        store.credentials.remove(key);
        Self::write_store(&self.store_path, &store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SecureStorage::new(dir.path()).unwrap();

        storage.store(MARKET_DATA_API_KEY, "my-secret-value-123").unwrap();
        assert_eq!(
            storage.retrieve(MARKET_DATA_API_KEY).unwrap().as_deref(),
            Some("my-secret-value-123")
        );

        let raw = fs::read_to_string(dir.path().join(STORE_FILE)).unwrap();
        assert!(!raw.contains("my-secret-value-123"));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        SecureStorage::new(dir.path()).unwrap().store("k", "v").unwrap();

        let reopened = SecureStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.retrieve("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SecureStorage::new(dir.path()).unwrap();
        assert_eq!(storage.retrieve("nonexistent-key").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SecureStorage::new(dir.path()).unwrap();

        storage.store("k", "value").unwrap();
        storage.delete("k").unwrap();
        assert_eq!(storage.retrieve("k").unwrap(), None);
    }
}
