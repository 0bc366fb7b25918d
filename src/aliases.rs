// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical wrappers for symmetric key material throughout
//! symmetric-vault. Lengths vary by algorithm, so everything is dynamic.

pub use secure_gate::dynamic_alias;

// Raw symmetric material, already unwrapped
dynamic_alias!(SymmetricKey, Vec<u8>);
dynamic_alias!(SymmetricIv, Vec<u8>);

// Key-encrypting-key in PEM form
dynamic_alias!(RsaPrivateKeyPem, String);
