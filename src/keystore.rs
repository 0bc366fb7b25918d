// src/keystore.rs
//! Ordered set of cipher specs: current first, oldest last
//!
//! A `KeyStore` is never mutated after construction. Reloading builds a new
//! one and swaps it into the registry, so anyone still holding the old
//! `Arc<KeyStore>` keeps a consistent snapshot.
//!
//! Fallback decryption walks the list in order. How long that takes depends
//! on which key matches, which is observable timing. That is an accepted
//! limitation of multi-key rotation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::crypto::CipherSpec;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone)]
pub struct KeyStore {
    ciphers: Vec<Arc<CipherSpec>>,
    default_index: usize,
}

impl KeyStore {
    /// Build from `ciphers` ordered current → oldest; the first one is the default
    pub fn new(ciphers: Vec<CipherSpec>) -> Result<Self> {
        if ciphers.is_empty() {
            return Err(CoreError::Config("a key store needs at least one cipher".into()));
        }
        let mut seen = HashSet::new();
        for cipher in &ciphers {
            if !seen.insert(cipher.name().to_owned()) {
                return Err(CoreError::Config(format!(
                    "duplicate cipher name {:?}",
                    cipher.name()
                )));
            }
        }
        debug!(ciphers = ciphers.len(), default = ciphers[0].name(), "built key store");
        Ok(Self {
            ciphers: ciphers.into_iter().map(Arc::new).collect(),
            default_index: 0,
        })
    }

    /// Same ciphers, different default for new encryptions
    pub fn with_default(mut self, name: &str) -> Result<Self> {
        self.default_index = self.position(name)?;
        Ok(self)
    }

    pub fn ciphers(&self) -> impl Iterator<Item = &Arc<CipherSpec>> {
        self.ciphers.iter()
    }

    pub fn len(&self) -> usize {
        self.ciphers.len()
    }

    /// Always false; construction rejects an empty list
    pub fn is_empty(&self) -> bool {
        self.ciphers.is_empty()
    }

    pub fn default_cipher(&self) -> &Arc<CipherSpec> {
        &self.ciphers[self.default_index]
    }

    /// Named cipher, or the default when `name` is `None`
    pub fn select(&self, name: Option<&str>) -> Result<&Arc<CipherSpec>> {
        match name {
            None => Ok(self.default_cipher()),
            Some(name) => self.position(name).map(|i| &self.ciphers[i]),
        }
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.ciphers
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| CoreError::UnknownCipher(name.to_owned()))
    }

    /// Encrypt with the default cipher
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.default_cipher().encrypt(plaintext)
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String> {
        self.default_cipher().encrypt_str(plaintext)
    }

    /// Try the preferred (or default) cipher, then every other one in stored order.
    ///
    /// Fails with [`CoreError::UnknownCipher`] if `preferred` names nothing,
    /// and with [`CoreError::Decryption`] once every cipher has been tried.
    pub fn decrypt_with_fallback(
        &self,
        ciphertext: &[u8],
        preferred: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.first_match(preferred, |cipher| cipher.decrypt(ciphertext))
    }

    /// Text variant: a cipher only matches if the plaintext is also valid UTF-8
    pub fn decrypt_str_with_fallback(
        &self,
        ciphertext: &str,
        preferred: Option<&str>,
    ) -> Result<String> {
        self.first_match(preferred, |cipher| cipher.decrypt_str(ciphertext))
    }

    /// Best effort: `None` when no cipher can decrypt the value
    pub fn try_decrypt(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        self.decrypt_with_fallback(ciphertext, None).ok()
    }

    pub fn try_decrypt_str(&self, ciphertext: &str) -> Option<String> {
        self.decrypt_str_with_fallback(ciphertext, None).ok()
    }

    fn first_match<T>(
        &self,
        preferred: Option<&str>,
        mut attempt: impl FnMut(&CipherSpec) -> Result<T>,
    ) -> Result<T> {
        let first = match preferred {
            Some(name) => self.position(name)?,
            None => self.default_index,
        };
        let order = std::iter::once(first).chain((0..self.ciphers.len()).filter(|&i| i != first));

        let mut last_reason = None;
        for index in order {
            match attempt(&self.ciphers[index]) {
                Ok(value) => return Ok(value),
                Err(CoreError::Decryption(reason)) => last_reason = Some(reason),
                Err(other) => return Err(other),
            }
        }
        Err(CoreError::Decryption(format!(
            "none of {} configured ciphers matched (last failure: {})",
            self.ciphers.len(),
            last_reason.unwrap_or_default()
        )))
    }
}
