// src/registry.rs
//! Holder of the active key store
//!
//! Applications create one `ProcessRegistry` (or use [`ProcessRegistry::global`])
//! and pass it to whatever needs `encrypt`/`decrypt`. Installing a new key
//! store is one pointer swap under a write lock. Readers clone the `Arc` and
//! then work lock-free on that snapshot, so a reload is never half-visible.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::config::{self, Config};
use crate::crypto::CipherSpec;
use crate::error::{CoreError, Result};
use crate::keystore::KeyStore;
use crate::stream::{StreamOptions, StreamReader, StreamWriter};

static GLOBAL: ProcessRegistry = ProcessRegistry::new();

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    current: RwLock<Option<Arc<KeyStore>>>,
}

impl ProcessRegistry {
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Process-wide default instance, for callers that cannot be handed one
    pub fn global() -> &'static ProcessRegistry {
        &GLOBAL
    }

    /// Atomically replace the active key store
    pub fn install(&self, keystore: KeyStore) -> Arc<KeyStore> {
        let keystore = Arc::new(keystore);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&keystore));
        info!(
            ciphers = keystore.len(),
            default = keystore.default_cipher().name(),
            reload = previous.is_some(),
            "installed key store"
        );
        keystore
    }

    /// Build the key store for `environment` from `config` and install it
    pub fn load(&self, config: &Config, environment: &str) -> Result<Arc<KeyStore>> {
        let keystore = config.build_keystore(environment)?;
        info!(environment, "loaded symmetric keys");
        Ok(self.install(keystore))
    }

    pub fn load_path(&self, path: impl AsRef<Path>, environment: &str) -> Result<Arc<KeyStore>> {
        let config = config::load_path(path)?;
        self.load(&config, environment)
    }

    /// Load from `$SYMMETRIC_VAULT_CONFIG` and `$SYMMETRIC_VAULT_ENV`, with defaults
    pub fn load_default(&self) -> Result<Arc<KeyStore>> {
        self.load_path(config::default_config_path(), &config::default_environment())
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    fn snapshot(&self) -> Option<Arc<KeyStore>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active key store, as a snapshot unaffected by later reloads
    pub fn keystore(&self) -> Result<Arc<KeyStore>> {
        self.snapshot().ok_or(CoreError::NotLoaded)
    }

    pub fn current_cipher(&self) -> Result<Arc<CipherSpec>> {
        Ok(Arc::clone(self.keystore()?.default_cipher()))
    }

    pub fn cipher(&self, name: &str) -> Result<Arc<CipherSpec>> {
        Ok(Arc::clone(self.keystore()?.select(Some(name))?))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.keystore()?.encrypt(plaintext)
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String> {
        self.keystore()?.encrypt_str(plaintext)
    }

    /// Decrypt with fallback across every configured cipher
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.keystore()?.decrypt_with_fallback(ciphertext, None)
    }

    pub fn decrypt_str(&self, ciphertext: &str) -> Result<String> {
        self.keystore()?.decrypt_str_with_fallback(ciphertext, None)
    }

    /// `Ok(None)` when no cipher matches; still fails loudly if nothing is loaded
    pub fn try_decrypt(&self, ciphertext: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.keystore()?.try_decrypt(ciphertext))
    }

    pub fn try_decrypt_str(&self, ciphertext: &str) -> Result<Option<String>> {
        Ok(self.keystore()?.try_decrypt_str(ciphertext))
    }

    pub fn writer<W: Write>(&self, sink: W, options: &StreamOptions) -> Result<StreamWriter<W>> {
        StreamWriter::open(sink, &*self.keystore()?, options)
    }

    pub fn reader<'r, R: Read + 'r>(
        &self,
        source: R,
        options: &StreamOptions,
    ) -> Result<StreamReader<'r>> {
        StreamReader::open(source, &*self.keystore()?, options)
    }
}
