// src/file_ops.rs
//! File-level encryption/decryption operations
//!
//! Path-to-path helpers built on the streaming codec. Nothing is buffered
//! whole in memory, so file size does not matter.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::keystore::KeyStore;
use crate::stream::{self, StreamOptions, StreamWriter};

/// Encrypt `input_path` into `output_path`.
///
/// Returns the plaintext size in bytes.
pub fn encrypt_file<P: AsRef<Path>>(
    input_path: P,
    output_path: P,
    keystore: &KeyStore,
    options: &StreamOptions,
) -> Result<u64> {
    let mut input = BufReader::new(File::open(input_path.as_ref())?);
    let output = BufWriter::new(File::create(output_path.as_ref())?);

    let mut writer = StreamWriter::open(output, keystore, options)?;
    let copied = io::copy(&mut input, &mut writer).map_err(CoreError::from_io)?;
    writer.close()?;
    Ok(copied)
}

/// Decrypt `input_path` into `output_path`.
///
/// Returns the plaintext size in bytes.
pub fn decrypt_file<P: AsRef<Path>>(
    input_path: P,
    output_path: P,
    keystore: &KeyStore,
    options: &StreamOptions,
) -> Result<u64> {
    let mut reader = stream::open_path(input_path, keystore, options)?;
    let mut output = BufWriter::new(File::create(output_path.as_ref())?);
    let copied = io::copy(&mut reader, &mut output).map_err(CoreError::from_io)?;
    io::Write::flush(&mut output)?;
    Ok(copied)
}
