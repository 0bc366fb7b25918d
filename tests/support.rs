// tests/support.rs
//! Fixture ciphers, key stores and key files shared by the integration tests
//!
//! Everything under `tests/data` was produced with `openssl`, so the known
//! answers here are independent of this crate.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use symmetric_vault::key_ops::generate_key;
use symmetric_vault::{CipherAlgorithm, CipherSpec, Encoding, KeyStore};

/// AES-128 key as hex; the iv is the 16 ASCII bytes of `HELLO_IV`
pub const HELLO_KEY: &str = "1234567890ABCDEF1234567890ABCDEF";
pub const HELLO_IV: &str = "1234567890ABCDEF";
pub const HELLO_PLAINTEXT: &str = "Hello World\n";
pub const HELLO_CIPHERTEXT: &str = "r0hqefyZkCKnP6Ewgf2AFA==";
pub const EMPTY_CIPHERTEXT: &str = "NRElte6NiKmpbPJjQY2hSw==";

/// Raw material RSA-wrapped into `fixture.key` / `fixture.iv`
pub const FIXTURE_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
pub const FIXTURE_IV: &[u8] = b"fedcba9876543210";
/// `HELLO_PLAINTEXT` under the fixture material, aes-256-cbc
pub const FIXTURE_HELLO_CIPHERTEXT: &str = "esWn/L3F8mj8DO87F4Epjw==";

/// Rotation pair, aes-256-cbc, hex
pub const V1_KEY: &str = "1111111111111111111111111111111111111111111111111111111111111111";
pub const V1_IV: &str = "22222222222222222222222222222222";
pub const V2_KEY: &str = "3333333333333333333333333333333333333333333333333333333333333333";
pub const V2_IV: &str = "44444444444444444444444444444444";
/// "rotated payload" under v1; v2 rejects it on padding
pub const V1_ROTATED_PAYLOAD: &str = "97NbDnymJweN//rEJfCsPA==";
/// "written before rotation" under v1
pub const V1_BEFORE_ROTATION: &str = "v7etpqcHvkqMXD2fGP+Fe3GFvgjuVsDgmZuEQiKQzso=";

pub fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

pub fn test_rsa_pem() -> String {
    fs::read_to_string(data_dir().join("test_rsa_key.pem")).expect("read test RSA key")
}

pub fn other_rsa_pem() -> String {
    fs::read_to_string(data_dir().join("other_rsa_key.pem")).expect("read second RSA key")
}

pub fn hello_cipher(encoding: Encoding) -> CipherSpec {
    CipherSpec::from_text("current", CipherAlgorithm::Aes128Cbc, HELLO_KEY, HELLO_IV, encoding)
        .expect("hello cipher")
}

pub fn v1_cipher() -> CipherSpec {
    CipherSpec::from_text("v1", CipherAlgorithm::Aes256Cbc, V1_KEY, V1_IV, Encoding::Base64Strict)
        .expect("v1 cipher")
}

pub fn v2_cipher() -> CipherSpec {
    CipherSpec::from_text("v2", CipherAlgorithm::Aes256Cbc, V2_KEY, V2_IV, Encoding::Base64Strict)
        .expect("v2 cipher")
}

/// v2 current, v1 retired
pub fn rotated_keystore() -> KeyStore {
    KeyStore::new(vec![v2_cipher(), v1_cipher()]).expect("rotated key store")
}

pub fn random_cipher(name: &str, algorithm: CipherAlgorithm, encoding: Encoding) -> CipherSpec {
    let (key, iv) = generate_key(algorithm);
    CipherSpec::new(name, algorithm, key, iv, encoding).expect("random cipher")
}

/// Copy the wrapped fixture files into `dir` as `<name>.key` / `<name>.iv`
pub fn install_fixture_files(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let key = dir.join(format!("{name}.key"));
    let iv = dir.join(format!("{name}.iv"));
    fs::copy(data_dir().join("fixture.key"), &key).expect("copy fixture.key");
    fs::copy(data_dir().join("fixture.iv"), &iv).expect("copy fixture.iv");
    (key, iv)
}

/// TOML literal for a multi-line PEM
pub fn toml_pem(pem: &str) -> String {
    format!("'''\n{}'''", pem)
}

/// Multi-line text whose lines straddle cipher blocks and stream chunks
pub fn sample_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("line {i}: {}\n", "x".repeat(i % 37)))
        .collect()
}
