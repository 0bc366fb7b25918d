// src/crypto/cipher_spec.rs
//! One fully specified symmetric configuration: algorithm, key, iv, encoding
//!
//! Encryption is deterministic. The iv is fixed per spec and never mixed
//! with per-message randomness, so identical plaintext yields identical
//! ciphertext. Existing ciphertext depends on that, so it stays.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::aliases::{SymmetricIv, SymmetricKey};
use crate::consts::{BASE64_LINE_WIDTH, MAX_CIPHER_NAME_LEN};
use crate::crypto::block::{CbcDecryptor, CbcEncryptor};
use crate::enums::{CipherAlgorithm, Encoding};
use crate::error::{CoreError, Result};

/// Immutable cipher configuration, identified by `name`
#[derive(Clone)]
pub struct CipherSpec {
    name: String,
    algorithm: CipherAlgorithm,
    key: SymmetricKey,
    iv: SymmetricIv,
    encoding: Encoding,
}

impl CipherSpec {
    /// Build a spec from raw key material.
    ///
    /// Fails with [`CoreError::Config`] when the name is empty or too long
    /// for a stream header, or when key/iv lengths do not match `algorithm`.
    pub fn new(
        name: impl Into<String>,
        algorithm: CipherAlgorithm,
        key: SymmetricKey,
        iv: SymmetricIv,
        encoding: Encoding,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_CIPHER_NAME_LEN {
            return Err(CoreError::Config(format!(
                "cipher name must be 1..={MAX_CIPHER_NAME_LEN} bytes, got {}",
                name.len()
            )));
        }
        let key_len = key.expose_secret().len();
        if key_len != algorithm.key_len() {
            return Err(CoreError::Config(format!(
                "cipher {name:?}: {algorithm} needs a {}-byte key, got {key_len}",
                algorithm.key_len()
            )));
        }
        let iv_len = iv.expose_secret().len();
        if iv_len != algorithm.iv_len() {
            return Err(CoreError::Config(format!(
                "cipher {name:?}: {algorithm} needs a {}-byte iv, got {iv_len}",
                algorithm.iv_len()
            )));
        }
        Ok(Self {
            name,
            algorithm,
            key,
            iv,
            encoding,
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        algorithm: CipherAlgorithm,
        key: &[u8],
        iv: &[u8],
        encoding: Encoding,
    ) -> Result<Self> {
        Self::new(
            name,
            algorithm,
            SymmetricKey::new(key.to_vec()),
            SymmetricIv::new(iv.to_vec()),
            encoding,
        )
    }

    /// Build a spec from config text, where key and iv are hex or raw.
    ///
    /// Hex wins when it decodes to exactly the required length; otherwise the
    /// text bytes are used as-is if their length fits.
    pub fn from_text(
        name: impl Into<String>,
        algorithm: CipherAlgorithm,
        key: &str,
        iv: &str,
        encoding: Encoding,
    ) -> Result<Self> {
        let key = material_from_text(key, algorithm.key_len(), "key")?;
        let iv = material_from_text(iv, algorithm.iv_len(), "iv")?;
        Self::new(
            name,
            algorithm,
            SymmetricKey::new(key),
            SymmetricIv::new(iv),
            encoding,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    pub fn iv(&self) -> &SymmetricIv {
        &self.iv
    }

    /// Same key material with a different output encoding
    pub fn with_encoding(&self, encoding: Encoding) -> Self {
        Self {
            encoding,
            ..self.clone()
        }
    }

    pub(crate) fn encryptor(&self) -> Result<CbcEncryptor> {
        CbcEncryptor::new(
            self.algorithm,
            &self.key.expose_secret()[..],
            &self.iv.expose_secret()[..],
        )
    }

    pub(crate) fn decryptor(&self) -> Result<CbcDecryptor> {
        CbcDecryptor::new(
            self.algorithm,
            &self.key.expose_secret()[..],
            &self.iv.expose_secret()[..],
        )
    }

    /// Pad, encrypt and encode `plaintext` per this spec's encoding
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = self.encryptor()?.finish(plaintext);
        Ok(self.encode(ciphertext))
    }

    /// Decode, decrypt and unpad. Empty input is a decryption failure.
    pub fn decrypt(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        if encoded.is_empty() {
            return Err(CoreError::Decryption("empty ciphertext".into()));
        }
        let ciphertext = self.decode(encoded)?;
        self.decryptor()?.finish(&ciphertext)
    }

    /// Text-mode encrypt; raw encoding has no text form and is refused
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String> {
        if !self.encoding.is_text() {
            return Err(CoreError::Config(format!(
                "cipher {:?} uses raw encoding and cannot produce text",
                self.name
            )));
        }
        let encoded = self.encrypt(plaintext.as_bytes())?;
        String::from_utf8(encoded)
            .map_err(|_| CoreError::Config("encoded ciphertext is not valid UTF-8".into()))
    }

    /// Text-mode decrypt; the plaintext must be valid UTF-8
    pub fn decrypt_str(&self, ciphertext: &str) -> Result<String> {
        let plaintext = self.decrypt(ciphertext.as_bytes())?;
        String::from_utf8(plaintext)
            .map_err(|_| CoreError::Decryption("plaintext is not valid UTF-8".into()))
    }

    pub fn encode(&self, ciphertext: Vec<u8>) -> Vec<u8> {
        match self.encoding {
            Encoding::Raw => ciphertext,
            Encoding::Base64Strict => STANDARD.encode(ciphertext).into_bytes(),
            Encoding::Base64 => {
                let flat = STANDARD.encode(ciphertext).into_bytes();
                let mut out = Vec::with_capacity(flat.len() + flat.len() / BASE64_LINE_WIDTH + 1);
                for line in flat.chunks(BASE64_LINE_WIDTH) {
                    out.extend_from_slice(line);
                    out.push(b'\n');
                }
                out
            }
        }
    }

    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let decoded = match self.encoding {
            Encoding::Raw => return Ok(encoded.to_vec()),
            Encoding::Base64Strict => STANDARD.decode(encoded),
            Encoding::Base64 => {
                let compact: Vec<u8> = encoded
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                STANDARD.decode(compact)
            }
        };
        decoded.map_err(|e| CoreError::Decryption(format!("invalid {}: {e}", self.encoding)))
    }
}

impl PartialEq for CipherSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CipherSpec {}

impl fmt::Debug for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherSpec")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

fn material_from_text(text: &str, expected: usize, what: &str) -> Result<Vec<u8>> {
    if let Ok(bytes) = hex::decode(text) {
        if bytes.len() == expected {
            return Ok(bytes);
        }
    }
    if text.len() == expected {
        return Ok(text.as_bytes().to_vec());
    }
    Err(CoreError::Config(format!(
        "{what} must be {expected} bytes, as hex or raw text"
    )))
}
