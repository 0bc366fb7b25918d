// src/consts.rs
//! Shared constants: stream format markers and defaults

/// Header magic for self-describing encrypted streams
pub const HEADER_MAGIC: &[u8; 4] = b"@EnC";

/// Flags byte bit: payload was zlib-compressed before encryption
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Every flag bit this version understands
pub const KNOWN_FLAGS: u8 = FLAG_COMPRESSED;

/// Largest cipher name a header can carry (u16 length prefix)
pub const MAX_CIPHER_NAME_LEN: usize = u16::MAX as usize;

/// Read size used when pulling ciphertext from a source
pub const STREAM_CHUNK_SIZE: usize = 4096;

/// Line width used by the non-strict base64 encoding
pub const BASE64_LINE_WIDTH: usize = 60;

/// Name given to the single inline cipher of a dev/test environment
pub const DEFAULT_CIPHER_NAME: &str = "current";

/// Extensions of the two RSA-wrapped files per cipher slot
pub const KEY_FILE_EXTENSION: &str = "key";
pub const IV_FILE_EXTENSION: &str = "iv";

/// RSA modulus size used when generating a fresh key-encrypting-key
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Environment variable naming the config file used by `registry::load_default`
pub const CONFIG_PATH_ENV: &str = "SYMMETRIC_VAULT_CONFIG";

/// Environment variable naming the environment used by `registry::load_default`
pub const ENVIRONMENT_ENV: &str = "SYMMETRIC_VAULT_ENV";

pub const DEFAULT_CONFIG_PATH: &str = "config/symmetric-vault.toml";
pub const DEFAULT_ENVIRONMENT: &str = "development";
