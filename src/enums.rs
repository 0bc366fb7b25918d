// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the user-visible choices that arrive as strings in
//! configuration: the symmetric algorithm and the text encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Supported symmetric algorithms
///
/// The name table is the single source of key, iv and block sizes. Unknown
/// names are rejected when configuration is parsed, not on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[non_exhaustive]
pub enum CipherAlgorithm {
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    #[serde(rename = "aes-192-cbc")]
    Aes192Cbc,
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
}

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 3] = [
        CipherAlgorithm::Aes128Cbc,
        CipherAlgorithm::Aes192Cbc,
        CipherAlgorithm::Aes256Cbc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CipherAlgorithm::Aes128Cbc => "aes-128-cbc",
            CipherAlgorithm::Aes192Cbc => "aes-192-cbc",
            CipherAlgorithm::Aes256Cbc => "aes-256-cbc",
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes192Cbc => 24,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }

    /// CBC iv is one block wide
    pub fn iv_len(&self) -> usize {
        self.block_size()
    }

    pub fn block_size(&self) -> usize {
        16
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algo| algo.name() == wanted)
            .ok_or_else(|| CoreError::Config(format!("unsupported cipher algorithm {s:?}")))
    }
}

/// Output encoding for string-mode encrypt/decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[non_exhaustive]
pub enum Encoding {
    /// Raw ciphertext bytes, no text form
    #[serde(rename = "raw")]
    Raw,
    /// Standard base64 wrapped into newline-terminated lines
    #[serde(rename = "base64")]
    Base64,
    #[default]
    #[serde(rename = "base64strict", alias = "base64_strict")]
    Base64Strict,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Raw => "raw",
            Encoding::Base64 => "base64",
            Encoding::Base64Strict => "base64strict",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, Encoding::Raw)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "none" => Ok(Encoding::Raw),
            "base64" => Ok(Encoding::Base64),
            "base64strict" | "base64_strict" => Ok(Encoding::Base64Strict),
            _ => Err(CoreError::Config(format!("unsupported encoding {s:?}"))),
        }
    }
}
