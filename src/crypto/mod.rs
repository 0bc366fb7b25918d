// src/crypto/mod.rs
//! Pure cryptographic operations
//!
//! Block engine, cipher specs and RSA key unwrapping. Nothing here knows
//! about configuration, key stores or the process registry.
pub(crate) mod block;
mod cipher_spec;
mod unwrap;

pub use block::BLOCK_SIZE;
pub use cipher_spec::CipherSpec;
pub use unwrap::{parse_private_key_pem, KeyUnwrapper};
