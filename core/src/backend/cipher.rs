//! Sealed container framing for the local store formats
//!
//! Both local drivers persist their YAML documents inside the same sealed
//! container: an Argon2id-derived AES-256-GCM seal with a small header of
//! magic, format byte, salt and nonce. The container framing lives here so
//! the drivers only ever exchange plaintext documents.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::RngCore;

use super::{BackendError, BackendResult};

/// Container magic bytes
pub const MAGIC: &[u8; 4] = b"KTRE";

/// Container format revision
pub const CONTAINER_VERSION: u8 = 1;

pub const KEY_SIZE: usize = 32;
pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;

const HEADER_SIZE: usize = MAGIC.len() + 1 + SALT_SIZE + NONCE_SIZE;

fn derive_key(key: &str, salt: &[u8]) -> BackendResult<[u8; KEY_SIZE]> {
    let mut derived = [0u8; KEY_SIZE];
    Argon2::default()
        .hash_password_into(key.as_bytes(), salt, &mut derived)
        .map_err(|e| BackendError::Crypto {
            message: format!("key derivation failed: {e}"),
        })?;
    Ok(derived)
}

/// Seal a plaintext document into a container
pub fn seal(key: &str, plaintext: &[u8]) -> BackendResult<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce);

    let derived = derive_key(key, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&derived).map_err(|e| BackendError::Crypto {
        message: format!("cipher init failed: {e}"),
    })?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| BackendError::Crypto {
            message: "container encryption failed".to_string(),
        })?;

    let mut container = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    container.extend_from_slice(MAGIC);
    container.push(CONTAINER_VERSION);
    container.extend_from_slice(&salt);
    container.extend_from_slice(&nonce);
    container.extend_from_slice(&ciphertext);
    Ok(container)
}

/// Open a sealed container, returning the plaintext document
pub fn open(key: &str, container: &[u8]) -> BackendResult<Vec<u8>> {
    if container.len() < HEADER_SIZE {
        return Err(BackendError::BadContainer {
            message: "container truncated".to_string(),
        });
    }
    if &container[..MAGIC.len()] != MAGIC {
        return Err(BackendError::BadContainer {
            message: "not a keytree container".to_string(),
        });
    }
    let version = container[MAGIC.len()];
    if version != CONTAINER_VERSION {
        return Err(BackendError::BadContainer {
            message: format!("unsupported container revision {version}"),
        });
    }

    let salt_start = MAGIC.len() + 1;
    let nonce_start = salt_start + SALT_SIZE;
    let body_start = nonce_start + NONCE_SIZE;

    let derived = derive_key(key, &container[salt_start..nonce_start])?;
    let cipher = Aes256Gcm::new_from_slice(&derived).map_err(|e| BackendError::Crypto {
        message: format!("cipher init failed: {e}"),
    })?;

    cipher
        .decrypt(
            Nonce::from_slice(&container[nonce_start..body_start]),
            &container[body_start..],
        )
        .map_err(|_| BackendError::BadContainer {
            message: "decryption failed (wrong key or corrupted container)".to_string(),
        })
}
