//! Argon2id encrypted keystore for mnemonic seed phrases.
//!
//! The mnemonic (and optional BIP39 passphrase) is encrypted rather than the
//! seed, so the original words can be revealed again later:
//! 1. Argon2id derives a 32-byte encryption key from the password + random salt
//! 2. AES-256-GCM encrypts the JSON payload with a random nonce
//! 3. The result is stored as a versioned JSON document with every parameter
//!    needed to decrypt it, the GCM tag kept separate from the ciphertext

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tessera_types::Timestamp;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::WalletError;

pub const KEYSTORE_VERSION: u32 = 1;
const CIPHER: &str = "aes-256-gcm";
const KDF: &str = "argon2id";

/// Salt length in bytes.
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 iterations, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Smallest cost Argon2 accepts. Only for tests.
    pub fn light() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// The keystore document, serializable to/from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub id: String,
    pub created_at: Timestamp,
    pub crypto: KeystoreCrypto,
}

/// Everything needed to decrypt, hex-encoded where binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Decrypted keystore contents. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeystoreSecret {
    pub mnemonic: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl fmt::Debug for KeystoreSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeystoreSecret(<redacted>)")
    }
}

pub fn encrypt_keystore(
    secret: &KeystoreSecret,
    password: &str,
    params: &KdfParams,
    created_at: Timestamp,
) -> Result<KeystoreFile, WalletError> {
    let mut rng = rand::rngs::OsRng;

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(derived_key.as_ref())
        .map_err(|e| WalletError::Encryption(format!("AES key init failed: {e}")))?;

    let plaintext = Zeroizing::new(
        serde_json::to_vec(secret)
            .map_err(|e| WalletError::Encryption(format!("payload serialization failed: {e}")))?,
    );
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|e| WalletError::Encryption(format!("encryption failed: {e}")))?;
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        id: uuid::Uuid::new_v4().to_string(),
        created_at,
        crypto: KeystoreCrypto {
            cipher: CIPHER.to_string(),
            kdf: KDF.to_string(),
            kdf_params: params.clone(),
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(&sealed),
            tag: hex::encode(tag),
        },
    })
}

/// Decrypt with `password`.
///
/// A wrong password and a tampered ciphertext are indistinguishable and both
/// yield [`WalletError::Authentication`]. Structural problems with the
/// document yield [`WalletError::Encryption`].
pub fn decrypt_keystore(keystore: &KeystoreFile, password: &str) -> Result<KeystoreSecret, WalletError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(WalletError::Encryption(format!(
            "unsupported keystore version: {}",
            keystore.version
        )));
    }
    let crypto = &keystore.crypto;
    if crypto.cipher != CIPHER || crypto.kdf != KDF {
        return Err(WalletError::Encryption(format!(
            "unsupported scheme {}/{}",
            crypto.kdf, crypto.cipher
        )));
    }

    let decode = |field: &str, value: &str| {
        hex::decode(value).map_err(|e| WalletError::Encryption(format!("invalid {field} hex: {e}")))
    };
    let salt = decode("salt", &crypto.salt)?;
    let nonce_bytes = decode("nonce", &crypto.nonce)?;
    let mut sealed = decode("ciphertext", &crypto.ciphertext)?;
    let tag = decode("tag", &crypto.tag)?;

    if nonce_bytes.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(WalletError::Encryption("invalid nonce or tag length".to_string()));
    }
    sealed.extend_from_slice(&tag);

    let derived_key = derive_key(password, &salt, &crypto.kdf_params)?;
    let cipher = Aes256Gcm::new_from_slice(derived_key.as_ref())
        .map_err(|e| WalletError::Encryption(format!("AES key init failed: {e}")))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_ref())
            .map_err(|_| WalletError::Authentication)?,
    );

    serde_json::from_slice(&plaintext)
        .map_err(|_| WalletError::Encryption("corrupt keystore payload".to_string()))
}

/// Write `keystore` as pretty JSON, replacing any previous file atomically.
pub fn save_keystore(keystore: &KeystoreFile, path: &Path) -> Result<(), WalletError> {
    let json = serde_json::to_string_pretty(keystore)
        .map_err(|e| WalletError::Storage(format!("JSON serialization failed: {e}")))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| WalletError::Storage(format!("failed to create {}: {e}", dir.display())))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| WalletError::Storage(format!("failed to write keystore file: {e}")))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| WalletError::Storage(format!("failed to replace keystore file: {e}")))?;
    Ok(())
}

pub fn load_keystore(path: &Path) -> Result<KeystoreFile, WalletError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| WalletError::Storage(format!("failed to read keystore file: {e}")))?;
    serde_json::from_str(&json).map_err(|e| WalletError::Encryption(format!("invalid keystore JSON: {e}")))
}

/// Where the keystore persists between sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeystoreStorage {
    /// Nothing is persisted; the keystore lives as long as the process.
    Memory,
    File(PathBuf),
}

impl KeystoreStorage {
    pub fn load(&self) -> Result<Option<KeystoreFile>, WalletError> {
        match self {
            Self::Memory => Ok(None),
            Self::File(path) if !path.exists() => Ok(None),
            Self::File(path) => load_keystore(path).map(Some),
        }
    }

    pub fn save(&self, keystore: &KeystoreFile) -> Result<(), WalletError> {
        match self {
            Self::Memory => Ok(()),
            Self::File(path) => {
                save_keystore(keystore, path)?;
                debug!(path = %path.display(), id = %keystore.id, "keystore written");
                Ok(())
            }
        }
    }

    pub fn remove(&self) -> Result<(), WalletError> {
        match self {
            Self::File(path) if path.exists() => std::fs::remove_file(path)
                .map_err(|e| WalletError::Storage(format!("failed to remove keystore file: {e}"))),
            _ => Ok(()),
        }
    }
}

fn derive_key(password: &str, salt: &[u8], params: &KdfParams) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, Some(32))
        .map_err(|e| WalletError::Encryption(format!("Argon2 params error: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, output.as_mut())
        .map_err(|e| WalletError::Encryption(format!("Argon2 hashing failed: {e}")))?;
    Ok(output)
}
