// src/stream/header.rs
//! Self-describing prefix of an encrypted stream
//!
//! Wire layout:
//!
//! ```text
//! [b"@EnC"][flags: u8][name_len: u16 LE][name: name_len bytes UTF-8][ciphertext...]
//! ```
//!
//! Flag bit 0 marks a zlib-compressed payload. Any other bit set means the
//! header came from a newer writer and is rejected. A zero-length name means
//! the writer recorded no cipher, so the reader's choice applies.

use std::io::{self, Read, Write};

use crate::consts::{FLAG_COMPRESSED, HEADER_MAGIC, KNOWN_FLAGS, MAX_CIPHER_NAME_LEN};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHeader {
    pub compressed: bool,
    pub cipher_name: Option<String>,
}

/// Whether `data` starts with the stream header magic
pub fn is_headered(data: &[u8]) -> bool {
    data.starts_with(HEADER_MAGIC)
}

impl StreamHeader {
    pub fn new(compressed: bool, cipher_name: Option<String>) -> Self {
        Self {
            compressed,
            cipher_name,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let name = self.cipher_name.as_deref().unwrap_or_default().as_bytes();
        if name.len() > MAX_CIPHER_NAME_LEN {
            return Err(CoreError::Config(format!(
                "cipher name of {} bytes does not fit a stream header",
                name.len()
            )));
        }
        let flags = if self.compressed { FLAG_COMPRESSED } else { 0 };

        let mut out = Vec::with_capacity(HEADER_MAGIC.len() + 3 + name.len());
        out.extend_from_slice(HEADER_MAGIC);
        out.push(flags);
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name);
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.encode()?)?;
        Ok(())
    }

    /// Parse a header from the front of `data`; returns it with the bytes consumed
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if !is_headered(data) {
            return Err(malformed("missing magic"));
        }
        let mut rest = &data[HEADER_MAGIC.len()..];
        let before = rest.len();
        let header = Self::read_after_magic(&mut rest)?;
        Ok((header, HEADER_MAGIC.len() + before - rest.len()))
    }

    /// Parse the remainder of a header whose magic was already consumed
    pub(crate) fn read_after_magic<R: Read>(source: &mut R) -> Result<Self> {
        let mut flags = [0u8; 1];
        read_header_bytes(source, &mut flags)?;
        let flags = flags[0];
        if flags & !KNOWN_FLAGS != 0 {
            return Err(malformed(&format!("unknown flag bits {flags:#010b}")));
        }

        let mut len = [0u8; 2];
        read_header_bytes(source, &mut len)?;
        let len = u16::from_le_bytes(len) as usize;

        let cipher_name = if len == 0 {
            None
        } else {
            let mut name = vec![0u8; len];
            read_header_bytes(source, &mut name)?;
            Some(String::from_utf8(name).map_err(|_| malformed("cipher name is not UTF-8"))?)
        };

        Ok(Self {
            compressed: flags & FLAG_COMPRESSED != 0,
            cipher_name,
        })
    }
}

fn read_header_bytes<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => malformed("truncated"),
        _ => CoreError::Io(e),
    })
}

fn malformed(reason: &str) -> CoreError {
    CoreError::Decryption(format!("malformed stream header: {reason}"))
}
