// src/crypto/block.rs
//! Stateful CBC engine over the supported AES widths
//!
//! Both directions keep their chaining state between calls, so the same
//! value serves one-shot string encryption and block-at-a-time streaming.
//! Padding is PKCS#7 and is only ever applied by `finish`.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::enums::CipherAlgorithm;
use crate::error::{CoreError, Result};

/// AES block width in bytes
pub const BLOCK_SIZE: usize = 16;

fn invalid_length(algorithm: CipherAlgorithm) -> CoreError {
    CoreError::Config(format!(
        "{algorithm} requires a {}-byte key and a {}-byte iv",
        algorithm.key_len(),
        algorithm.iv_len()
    ))
}

pub(crate) enum CbcEncryptor {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
}

impl CbcEncryptor {
    pub fn new(algorithm: CipherAlgorithm, key: &[u8], iv: &[u8]) -> Result<Self> {
        let engine = match algorithm {
            CipherAlgorithm::Aes128Cbc => {
                cbc::Encryptor::new_from_slices(key, iv).map(CbcEncryptor::Aes128)
            }
            CipherAlgorithm::Aes192Cbc => {
                cbc::Encryptor::new_from_slices(key, iv).map(CbcEncryptor::Aes192)
            }
            CipherAlgorithm::Aes256Cbc => {
                cbc::Encryptor::new_from_slices(key, iv).map(CbcEncryptor::Aes256)
            }
        };
        engine.map_err(|_| invalid_length(algorithm))
    }

    /// Encrypt whole blocks in place; `buf.len()` must be a multiple of the block size
    pub fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                CbcEncryptor::Aes128(c) => c.encrypt_block_mut(block),
                CbcEncryptor::Aes192(c) => c.encrypt_block_mut(block),
                CbcEncryptor::Aes256(c) => c.encrypt_block_mut(block),
            }
        }
    }

    /// Pad and encrypt the trailing bytes, consuming the chaining state
    pub fn finish(self, tail: &[u8]) -> Vec<u8> {
        match self {
            CbcEncryptor::Aes128(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
            CbcEncryptor::Aes192(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
            CbcEncryptor::Aes256(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
        }
    }
}

pub(crate) enum CbcDecryptor {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
}

impl CbcDecryptor {
    pub fn new(algorithm: CipherAlgorithm, key: &[u8], iv: &[u8]) -> Result<Self> {
        let engine = match algorithm {
            CipherAlgorithm::Aes128Cbc => {
                cbc::Decryptor::new_from_slices(key, iv).map(CbcDecryptor::Aes128)
            }
            CipherAlgorithm::Aes192Cbc => {
                cbc::Decryptor::new_from_slices(key, iv).map(CbcDecryptor::Aes192)
            }
            CipherAlgorithm::Aes256Cbc => {
                cbc::Decryptor::new_from_slices(key, iv).map(CbcDecryptor::Aes256)
            }
        };
        engine.map_err(|_| invalid_length(algorithm))
    }

    /// Decrypt whole blocks in place without touching padding
    pub fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                CbcDecryptor::Aes128(c) => c.decrypt_block_mut(block),
                CbcDecryptor::Aes192(c) => c.decrypt_block_mut(block),
                CbcDecryptor::Aes256(c) => c.decrypt_block_mut(block),
            }
        }
    }

    /// Decrypt the final block(s) and strip padding
    pub fn finish(self, last: &[u8]) -> Result<Vec<u8>> {
        if last.is_empty() || last.len() % BLOCK_SIZE != 0 {
            return Err(CoreError::Decryption(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
                last.len()
            )));
        }
        let plain = match self {
            CbcDecryptor::Aes128(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
            CbcDecryptor::Aes192(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
            CbcDecryptor::Aes256(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
        };
        plain.map_err(|_| CoreError::Decryption("invalid padding".into()))
    }
}
