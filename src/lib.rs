// src/lib.rs
//! symmetric-vault: transparent symmetric encryption of data at rest
//!
//! Features:
//! - AES-CBC cipher specs with raw / base64 / strict-base64 output
//! - Symmetric keys stored RSA-wrapped on disk, unwrapped once at load time
//! - Ordered key stores for rotation, with fallback decryption across old keys
//! - Streaming encrypt/decrypt with a self-describing header and optional zlib
//! - Atomically reloadable process registry
//!
//! Encryption is deterministic and unauthenticated (no MAC). Both are kept
//! so existing ciphertext stays readable; neither is a recommendation.

pub mod aliases;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod enums;
pub mod error;
pub mod file_ops;
pub mod key_ops;
pub mod keystore;
pub mod registry;
pub mod stream;

// Re-export everything users need at the crate root
pub use aliases::{RsaPrivateKeyPem, SymmetricIv, SymmetricKey};
pub use config::{load_path as load_config, Config};
pub use crypto::{CipherSpec, KeyUnwrapper};
pub use enums::{CipherAlgorithm, Encoding};
pub use error::{CoreError, Result as CoreResult};
pub use key_ops::generate_symmetric_key_files;
pub use keystore::KeyStore;
pub use registry::ProcessRegistry;
pub use stream::{StreamHeader, StreamOptions, StreamReader, StreamWriter};
