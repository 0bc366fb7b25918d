// src/stream/reader.rs
//! Read path: source → [header] → CBC → [zlib] → caller
//!
//! The decrypting stage always holds back the last full ciphertext block.
//! Padding can only be stripped once end-of-stream proves that block is final.

use std::io::{self, BufRead, BufReader, Cursor, Read};

use flate2::read::ZlibDecoder;
use tracing::debug;

use crate::consts::{HEADER_MAGIC, STREAM_CHUNK_SIZE};
use crate::crypto::block::{CbcDecryptor, BLOCK_SIZE};
use crate::crypto::CipherSpec;
use crate::error::{CoreError, Result};
use crate::keystore::KeyStore;
use crate::stream::header::StreamHeader;
use crate::stream::StreamOptions;

/// CBC stage over a ciphertext source
pub(crate) struct DecryptingReader<R: Read> {
    source: R,
    engine: Option<CbcDecryptor>,
    ciphertext: Vec<u8>,
    plaintext: Vec<u8>,
    consumed: usize,
    saw_ciphertext: bool,
    /// Set when the final block fails; returned again by every later read
    failure: Option<String>,
}

impl<R: Read> DecryptingReader<R> {
    pub fn new(source: R, engine: CbcDecryptor) -> Self {
        Self {
            source,
            engine: Some(engine),
            ciphertext: Vec::with_capacity(STREAM_CHUNK_SIZE + BLOCK_SIZE),
            plaintext: Vec::new(),
            consumed: 0,
            saw_ciphertext: false,
            failure: None,
        }
    }

    /// Refill `plaintext` from the source; leaves it empty only at end of stream
    fn fill(&mut self) -> io::Result<()> {
        self.plaintext.clear();
        self.consumed = 0;
        if let Some(reason) = &self.failure {
            return Err(CoreError::Decryption(reason.clone()).into_io());
        }

        let mut chunk = [0u8; STREAM_CHUNK_SIZE];
        while self.plaintext.is_empty() {
            let Some(engine) = self.engine.as_mut() else {
                return Ok(());
            };
            let n = match self.source.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if n == 0 {
                let Some(engine) = self.engine.take() else {
                    return Ok(());
                };
                // A source with no ciphertext at all decodes to nothing
                if !self.saw_ciphertext {
                    return Ok(());
                }
                let last = std::mem::take(&mut self.ciphertext);
                match engine.finish(&last) {
                    Ok(plaintext) => self.plaintext = plaintext,
                    Err(CoreError::Decryption(reason)) => {
                        self.failure = Some(reason.clone());
                        return Err(CoreError::Decryption(reason).into_io());
                    }
                    Err(err) => return Err(err.into_io()),
                }
                return Ok(());
            }

            self.saw_ciphertext = true;
            self.ciphertext.extend_from_slice(&chunk[..n]);
            let whole = self.ciphertext.len() - self.ciphertext.len() % BLOCK_SIZE;
            let ready = whole.saturating_sub(BLOCK_SIZE);
            if ready > 0 {
                engine.decrypt_blocks(&mut self.ciphertext[..ready]);
                self.plaintext.extend(self.ciphertext.drain(..ready));
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.consumed == self.plaintext.len() {
            self.fill()?;
        }
        let available = &self.plaintext[self.consumed..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consumed += n;
        Ok(n)
    }
}

/// Decrypting stream over any `io::Read` source.
///
/// Implements `Read` and `BufRead`, so `BufRead::lines` and friends work on
/// decrypted text. A reader is single-pass: once exhausted it stays so.
pub struct StreamReader<'r> {
    inner: Box<dyn BufRead + 'r>,
    header: Option<StreamHeader>,
    cipher_name: String,
    compressed: bool,
}

impl<'r> StreamReader<'r> {
    /// Open over `source`, detecting the header when `options.header` is set.
    ///
    /// A detected header decides compression and cipher. Without one,
    /// `options.compress` and `options.cipher_name` (or the default cipher)
    /// apply.
    pub fn open<R: Read + 'r>(
        mut source: R,
        keystore: &KeyStore,
        options: &StreamOptions,
    ) -> Result<Self> {
        let (header, prefix) = if options.header {
            detect_header(&mut source)?
        } else {
            (None, Vec::new())
        };

        let cipher_name = header
            .as_ref()
            .and_then(|h| h.cipher_name.as_deref())
            .or(options.cipher_name.as_deref());
        let cipher = keystore.select(cipher_name)?;
        let compressed = header.as_ref().map_or(options.compress, |h| h.compressed);

        Self::build(Cursor::new(prefix).chain(source), cipher, header, compressed)
    }

    /// Open a header-less stream with an explicit cipher
    pub fn with_cipher<R: Read + 'r>(
        source: R,
        cipher: &CipherSpec,
        compressed: bool,
    ) -> Result<Self> {
        Self::build(source, cipher, None, compressed)
    }

    fn build<R: Read + 'r>(
        source: R,
        cipher: &CipherSpec,
        header: Option<StreamHeader>,
        compressed: bool,
    ) -> Result<Self> {
        let decrypting = DecryptingReader::new(source, cipher.decryptor()?);
        let inner: Box<dyn BufRead + 'r> = if compressed {
            Box::new(BufReader::new(ZlibDecoder::new(decrypting)))
        } else {
            Box::new(BufReader::new(decrypting))
        };
        debug!(
            cipher = cipher.name(),
            headered = header.is_some(),
            compressed,
            "opened decrypting stream"
        );
        Ok(Self {
            inner,
            header,
            cipher_name: cipher.name().to_owned(),
            compressed,
        })
    }

    pub fn header(&self) -> Option<&StreamHeader> {
        self.header.as_ref()
    }

    pub fn cipher_name(&self) -> &str {
        &self.cipher_name
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Up to `n` decrypted bytes; shorter only at end of stream, empty once exhausted
    pub fn read_chunk(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(STREAM_CHUNK_SIZE));
        (&mut self.inner)
            .take(n as u64)
            .read_to_end(&mut out)
            .map_err(CoreError::from_io)?;
        Ok(out)
    }

    /// Everything that is left
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.inner.read_to_end(&mut out).map_err(CoreError::from_io)?;
        Ok(out)
    }

    /// Lazy line iterator that keeps each line's `\n` terminator
    pub fn each_line(&mut self) -> EachLine<'_, 'r> {
        EachLine { reader: self }
    }
}

impl Read for StreamReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for StreamReader<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Lines of decrypted text, partial lines carried across block boundaries
pub struct EachLine<'a, 'r> {
    reader: &'a mut StreamReader<'r>,
}

impl Iterator for EachLine<'_, '_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.inner.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(CoreError::from_io(e))),
        }
    }
}

/// Read up to the magic length; returns the parsed header, or the bytes to replay
fn detect_header<R: Read>(source: &mut R) -> Result<(Option<StreamHeader>, Vec<u8>)> {
    let mut prefix = Vec::with_capacity(HEADER_MAGIC.len());
    source
        .by_ref()
        .take(HEADER_MAGIC.len() as u64)
        .read_to_end(&mut prefix)?;
    if prefix.as_slice() == HEADER_MAGIC.as_slice() {
        let header = StreamHeader::read_after_magic(source)?;
        Ok((Some(header), Vec::new()))
    } else {
        Ok((None, prefix))
    }
}
