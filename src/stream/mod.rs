// src/stream/mod.rs
//! Streaming encrypt/decrypt over arbitrary byte sinks and sources
//!
//! Streams are chained `io::Read`/`io::Write` stages composed at open time:
//! optional zlib, then CBC, then the caller's I/O. A stream may start with
//! a [`StreamHeader`] that names the cipher and the compression, so readers
//! need no out-of-band hints.
//!
//! Instances are single-owner. Nothing here is shared across threads.

mod header;
mod reader;
mod writer;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::warn;

pub use header::{is_headered, StreamHeader};
pub use reader::{EachLine, StreamReader};
pub use writer::StreamWriter;

use crate::error::Result;
use crate::keystore::KeyStore;

/// Options for opening a stream in either direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// Write a header / detect one when reading
    pub header: bool,
    /// Compress when writing; for readers, only used when no header is found
    pub compress: bool,
    /// Cipher to use instead of the key store's default
    pub cipher_name: Option<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            header: true,
            compress: false,
            cipher_name: None,
        }
    }
}

impl StreamOptions {
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_cipher(mut self, name: impl Into<String>) -> Self {
        self.cipher_name = Some(name.into());
        self
    }
}

/// Run `body` against a fresh writer and always close it, error or not.
///
/// Returns the body's value together with the sink.
pub fn with_writer<W, T, F>(
    sink: W,
    keystore: &KeyStore,
    options: &StreamOptions,
    body: F,
) -> Result<(T, W)>
where
    W: Write,
    F: FnOnce(&mut StreamWriter<W>) -> Result<T>,
{
    let mut writer = StreamWriter::open(sink, keystore, options)?;
    match body(&mut writer) {
        Ok(value) => {
            let sink = writer.close()?;
            Ok((value, sink))
        }
        Err(err) => {
            if let Err(close_err) = writer.close() {
                warn!(error = %close_err, "closing encrypting stream after failure also failed");
            }
            Err(err)
        }
    }
}

/// Run `body` against a reader opened over `source`
pub fn with_reader<'r, R, T, F>(
    source: R,
    keystore: &KeyStore,
    options: &StreamOptions,
    body: F,
) -> Result<T>
where
    R: Read + 'r,
    F: FnOnce(&mut StreamReader<'r>) -> Result<T>,
{
    let mut reader = StreamReader::open(source, keystore, options)?;
    body(&mut reader)
}

/// Create (or truncate) `path` and open an encrypting stream over it
pub fn create_path(
    path: impl AsRef<Path>,
    keystore: &KeyStore,
    options: &StreamOptions,
) -> Result<StreamWriter<BufWriter<File>>> {
    let file = File::create(path.as_ref())?;
    StreamWriter::open(BufWriter::new(file), keystore, options)
}

/// Open `path` for decrypted reading
pub fn open_path(
    path: impl AsRef<Path>,
    keystore: &KeyStore,
    options: &StreamOptions,
) -> Result<StreamReader<'static>> {
    let file = File::open(path.as_ref())?;
    StreamReader::open(BufReader::new(file), keystore, options)
}
