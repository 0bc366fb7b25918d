// src/stream/writer.rs
//! Write path: [zlib] → CBC → sink
//!
//! Each stage is a plain `io::Write`. The compressor wraps the encrypting
//! writer, which wraps the caller's sink. Full blocks are encrypted as soon
//! as they are buffered. Only `close` pads the final partial block.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::crypto::block::{CbcEncryptor, BLOCK_SIZE};
use crate::crypto::CipherSpec;
use crate::error::{CoreError, Result};
use crate::keystore::KeyStore;
use crate::stream::header::StreamHeader;
use crate::stream::StreamOptions;

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "encrypting stream already closed")
}

fn poisoned() -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        "encrypting stream failed earlier; output is incomplete",
    )
}

/// CBC stage: buffers up to one partial block, forwards whole encrypted blocks.
///
/// A sink error leaves the chaining state ahead of what the sink received,
/// so the stage refuses all further output after one.
pub(crate) struct EncryptingWriter<W: Write> {
    sink: W,
    engine: CbcEncryptor,
    pending: Vec<u8>,
    failed: bool,
}

impl<W: Write> EncryptingWriter<W> {
    pub fn new(sink: W, engine: CbcEncryptor) -> Self {
        Self {
            sink,
            engine,
            pending: Vec::with_capacity(BLOCK_SIZE * 2),
            failed: false,
        }
    }

    /// Refuse all further output
    fn fail(&mut self) {
        self.failed = true;
    }

    /// Pad and emit the final block, flush, and hand back the sink
    pub fn finish(self) -> io::Result<W> {
        if self.failed {
            return Err(poisoned());
        }
        let EncryptingWriter {
            mut sink,
            engine,
            pending,
            ..
        } = self;
        sink.write_all(&engine.finish(&pending))?;
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed {
            return Err(poisoned());
        }
        self.pending.extend_from_slice(buf);
        let ready = self.pending.len() - self.pending.len() % BLOCK_SIZE;
        if ready > 0 {
            self.engine.encrypt_blocks(&mut self.pending[..ready]);
            if let Err(err) = self.sink.write_all(&self.pending[..ready]) {
                self.fail();
                return Err(err);
            }
            self.pending.drain(..ready);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failed {
            return Err(poisoned());
        }
        self.sink.flush()
    }
}

enum WriteStage<W: Write> {
    Plain(EncryptingWriter<W>),
    Compressed(ZlibEncoder<EncryptingWriter<W>>),
}

/// Encrypting stream over any `io::Write` sink.
///
/// Always end it with [`StreamWriter::close`], or use
/// [`with_writer`](crate::stream::with_writer). Dropping an open writer
/// still finishes the stream, but any error at that point is only logged.
///
/// The first failed `write` or `flush` poisons the writer: every later call,
/// `close` included, fails and nothing more reaches the sink.
pub struct StreamWriter<W: Write> {
    stage: Option<WriteStage<W>>,
    cipher_name: String,
    bytes_written: u64,
    poisoned: bool,
}

impl<W: Write> StreamWriter<W> {
    /// Open over `sink` with the cipher `options` selects from `keystore`
    pub fn open(sink: W, keystore: &KeyStore, options: &StreamOptions) -> Result<Self> {
        let cipher = keystore.select(options.cipher_name.as_deref())?;
        Self::with_cipher(sink, cipher, options)
    }

    /// Open over `sink` with an explicit cipher; `options.cipher_name` is ignored
    pub fn with_cipher(
        mut sink: W,
        cipher: &CipherSpec,
        options: &StreamOptions,
    ) -> Result<Self> {
        if options.header {
            StreamHeader::new(options.compress, Some(cipher.name().to_owned()))
                .write_to(&mut sink)?;
        }
        let encrypting = EncryptingWriter::new(sink, cipher.encryptor()?);
        let stage = if options.compress {
            WriteStage::Compressed(ZlibEncoder::new(encrypting, Compression::default()))
        } else {
            WriteStage::Plain(encrypting)
        };
        debug!(
            cipher = cipher.name(),
            header = options.header,
            compress = options.compress,
            "opened encrypting stream"
        );
        Ok(Self {
            stage: Some(stage),
            cipher_name: cipher.name().to_owned(),
            bytes_written: 0,
            poisoned: false,
        })
    }

    pub fn cipher_name(&self) -> &str {
        &self.cipher_name
    }

    /// Logical (pre-compression, pre-encryption) bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush compression, pad the last block, and return the sink
    pub fn close(mut self) -> Result<W> {
        self.finish_stage().map_err(CoreError::from_io)
    }

    fn finish_stage(&mut self) -> io::Result<W> {
        match self.stage.take() {
            None => Err(self.unusable()),
            Some(WriteStage::Plain(writer)) => writer.finish(),
            Some(WriteStage::Compressed(encoder)) => encoder.finish()?.finish(),
        }
    }

    fn unusable(&self) -> io::Error {
        if self.poisoned {
            poisoned()
        } else {
            closed()
        }
    }

    /// Drop the stage without finishing it. The compressor flushes on drop,
    /// so the CBC stage under it is failed first.
    fn poison(&mut self, err: &io::Error) {
        warn!(cipher = %self.cipher_name, error = %err, "encrypting stream failed");
        self.poisoned = true;
        match self.stage.take() {
            Some(WriteStage::Plain(mut writer)) => writer.fail(),
            Some(WriteStage::Compressed(mut encoder)) => encoder.get_mut().fail(),
            None => {}
        }
    }
}

impl<W: Write> Write for StreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match self.stage.as_mut() {
            None => return Err(self.unusable()),
            Some(WriteStage::Plain(writer)) => writer.write(buf),
            Some(WriteStage::Compressed(encoder)) => encoder.write(buf),
        };
        match result {
            Ok(written) => {
                self.bytes_written += written as u64;
                Ok(written)
            }
            Err(err) => {
                self.poison(&err);
                Err(err)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = match self.stage.as_mut() {
            None => return Err(self.unusable()),
            Some(WriteStage::Plain(writer)) => writer.flush(),
            Some(WriteStage::Compressed(encoder)) => encoder.flush(),
        };
        if let Err(err) = &result {
            self.poison(err);
        }
        result
    }
}

impl<W: Write> Drop for StreamWriter<W> {
    fn drop(&mut self) {
        if self.stage.is_some() {
            if let Err(err) = self.finish_stage() {
                warn!(
                    cipher = %self.cipher_name,
                    error = %err,
                    "encrypting stream dropped without close and could not be finished"
                );
            }
        }
    }
}
