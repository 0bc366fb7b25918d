// src/key_ops.rs
//! Key generation and key-file provisioning
//!
//! Generates fresh symmetric material, wraps it with the RSA public key, and
//! writes the `<name>.key` / `<name>.iv` files. Overwriting a key file
//! orphans every value encrypted under it, so existing files block the whole
//! run unless `force` is set.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use tracing::{info, warn};

use crate::aliases::{RsaPrivateKeyPem, SymmetricIv, SymmetricKey};
use crate::config::{Config, SlotSource};
use crate::enums::CipherAlgorithm;
use crate::error::{CoreError, Result};

/// `len` bytes from the OS CSPRNG
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Fresh random key and iv sized for `algorithm`
pub fn generate_key(algorithm: CipherAlgorithm) -> (SymmetricKey, SymmetricIv) {
    (
        SymmetricKey::new(random_bytes(algorithm.key_len())),
        SymmetricIv::new(random_bytes(algorithm.iv_len())),
    )
}

/// Text representations of a key/iv pair, for pasting into inline config
#[derive(Clone)]
pub struct KeyRepr {
    pub key_hex: String,
    pub iv_hex: String,
    pub key_base64: String,
    pub iv_base64: String,
}

pub fn key_representations(key: &SymmetricKey, iv: &SymmetricIv) -> KeyRepr {
    let key = &key.expose_secret()[..];
    let iv = &iv.expose_secret()[..];
    KeyRepr {
        key_hex: hex::encode(key),
        iv_hex: hex::encode(iv),
        key_base64: STANDARD.encode(key),
        iv_base64: STANDARD.encode(iv),
    }
}

/// Random inline key for a dev/test environment
pub fn generate_inline_key(algorithm: CipherAlgorithm) -> KeyRepr {
    let (key, iv) = generate_key(algorithm);
    key_representations(&key, &iv)
}

/// New RSA key-encrypting-key as PKCS#1 PEM
pub fn generate_rsa_private_key(bits: usize) -> Result<RsaPrivateKeyPem> {
    let key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CoreError::Config(format!("RSA key generation failed: {e}")))?;
    let pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CoreError::Config(format!("RSA key encoding failed: {e}")))?;
    Ok(RsaPrivateKeyPem::new(pem.as_str().to_owned()))
}

/// RSA PKCS#1 v1.5 encrypt raw key material for storage
pub fn wrap_key_material(public_key: &RsaPublicKey, material: &[u8]) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, material)
        .map_err(|e| CoreError::KeyUnwrap(format!("RSA encryption failed: {e}")))
}

/// One slot written by [`generate_symmetric_key_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSlot {
    pub name: String,
    pub algorithm: CipherAlgorithm,
    pub key_path: PathBuf,
    pub iv_path: PathBuf,
}

/// Write fresh RSA-wrapped key/iv files for every file-backed slot of `environment`.
///
/// All target paths are checked before anything is written. Without `force`,
/// a single existing file fails the run with [`CoreError::KeyFileExists`].
pub fn generate_symmetric_key_files(
    config: &Config,
    environment: &str,
    force: bool,
) -> Result<Vec<GeneratedSlot>> {
    let env = config.environment(environment)?;
    let base_dir = config.base_dir.as_deref();

    let mut slots = Vec::new();
    for (index, slot) in env.ciphers.iter().enumerate() {
        if let SlotSource::Files { .. } = slot.source()? {
            if let Some((key_path, iv_path)) = slot.key_paths(base_dir) {
                slots.push(GeneratedSlot {
                    name: slot.resolved_name(index),
                    algorithm: slot.cipher,
                    key_path,
                    iv_path,
                });
            }
        }
    }
    if slots.is_empty() {
        return Err(CoreError::Config(format!(
            "environment {environment:?} has no file-backed ciphers to generate"
        )));
    }

    for path in slots.iter().flat_map(|s| [&s.key_path, &s.iv_path]) {
        if path.exists() {
            if !force {
                return Err(CoreError::KeyFileExists(path.display().to_string()));
            }
            warn!(
                path = %path.display(),
                "overwriting existing key file; data encrypted with it becomes unreadable"
            );
        }
    }

    let public_key = env
        .unwrapper()?
        .ok_or_else(|| {
            CoreError::Config("private_rsa_key is required to generate key files".into())
        })?
        .public_key();

    for slot in &slots {
        let (key, iv) = generate_key(slot.algorithm);
        let wrapped_key = wrap_key_material(&public_key, &key.expose_secret()[..])?;
        let wrapped_iv = wrap_key_material(&public_key, &iv.expose_secret()[..])?;
        write_wrapped(&slot.key_path, &wrapped_key)?;
        write_wrapped(&slot.iv_path, &wrapped_iv)?;
        info!(cipher = %slot.name, algorithm = %slot.algorithm, "generated symmetric key files");
    }
    Ok(slots)
}

fn write_wrapped(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
