// src/crypto/unwrap.rs
//! RSA unwrapping of symmetric key files
//!
//! Each cipher slot has two files, `<name>.key` and `<name>.iv`. Each one
//! holds the RSA PKCS#1 v1.5 encryption of the raw bytes and nothing else.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::aliases::{RsaPrivateKeyPem, SymmetricIv, SymmetricKey};
use crate::enums::CipherAlgorithm;
use crate::error::{CoreError, Result};

/// Parse a PEM private key, PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`)
pub fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| CoreError::KeyUnwrap(format!("invalid RSA private key: {e}")))
}

/// Holds the key-encrypting-key; only used at load time
pub struct KeyUnwrapper {
    private_key: RsaPrivateKey,
}

impl KeyUnwrapper {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    pub fn from_pem(pem: &RsaPrivateKeyPem) -> Result<Self> {
        parse_private_key_pem(pem.expose_secret()).map(Self::new)
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// RSA-decrypt both blobs independently and check their lengths against `algorithm`
    pub fn unwrap(
        &self,
        algorithm: CipherAlgorithm,
        encrypted_key: &[u8],
        encrypted_iv: &[u8],
    ) -> Result<(SymmetricKey, SymmetricIv)> {
        let key = self.decrypt_exact(encrypted_key, algorithm.key_len(), "key")?;
        let iv = self.decrypt_exact(encrypted_iv, algorithm.iv_len(), "iv")?;
        Ok((SymmetricKey::new(key), SymmetricIv::new(iv)))
    }

    /// Read and unwrap a `<name>.key` / `<name>.iv` pair
    pub fn unwrap_files(
        &self,
        algorithm: CipherAlgorithm,
        key_path: &Path,
        iv_path: &Path,
    ) -> Result<(SymmetricKey, SymmetricIv)> {
        let encrypted_key = read_key_file(key_path)?;
        let encrypted_iv = read_key_file(iv_path)?;
        self.unwrap(algorithm, &encrypted_key, &encrypted_iv)
    }

    /// Unwrap material embedded in config as base64 of the RSA ciphertext
    pub fn unwrap_base64(
        &self,
        algorithm: CipherAlgorithm,
        encrypted_key_b64: &str,
        encrypted_iv_b64: &str,
    ) -> Result<(SymmetricKey, SymmetricIv)> {
        let decode = |text: &str, what: &str| {
            STANDARD
                .decode(text.trim())
                .map_err(|e| CoreError::KeyUnwrap(format!("encrypted {what} is not base64: {e}")))
        };
        self.unwrap(
            algorithm,
            &decode(encrypted_key_b64, "key")?,
            &decode(encrypted_iv_b64, "iv")?,
        )
    }

    fn decrypt_exact(&self, blob: &[u8], expected: usize, what: &str) -> Result<Vec<u8>> {
        let plain = self
            .private_key
            .decrypt(Pkcs1v15Encrypt, blob)
            .map_err(|e| CoreError::KeyUnwrap(format!("RSA decryption of {what} failed: {e}")))?;
        if plain.len() != expected {
            return Err(CoreError::KeyUnwrap(format!(
                "unwrapped {what} is {} bytes, expected {expected}",
                plain.len()
            )));
        }
        Ok(plain)
    }
}

impl fmt::Debug for KeyUnwrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyUnwrapper").finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CoreError::KeyUnwrap(format!("cannot read {}: {e}", path.display())))
}
