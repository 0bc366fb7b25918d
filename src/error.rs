// src/error.rs
//! Public error type for the entire crate

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or missing configuration, unknown environment
    #[error("Configuration error: {0}")]
    Config(String),

    /// RSA unwrap failure or malformed key file
    #[error("Failed to unwrap symmetric key material: {0}")]
    KeyUnwrap(String),

    #[error("Unknown cipher: {0:?}")]
    UnknownCipher(String),

    /// Padding, format or decode failure across every attempted cipher
    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("No key store has been loaded")]
    NotLoaded,

    /// Generation refused to clobber an existing key file
    #[error("Key file already exists: {0}")]
    KeyFileExists(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Recover a typed error that a stream stage smuggled through `io::Error`
    pub fn from_io(err: io::Error) -> Self {
        let is_core = err
            .get_ref()
            .map(|inner| inner.is::<CoreError>())
            .unwrap_or(false);
        if !is_core {
            return CoreError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<CoreError>()) {
            Some(Ok(core)) => *core,
            Some(Err(other)) => CoreError::Io(io::Error::other(other)),
            None => CoreError::Io(io::Error::other("unknown stream failure")),
        }
    }

    /// Wrap into `io::Error` so it can cross a `Read`/`Write` boundary
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            CoreError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }

    pub fn is_decryption(&self) -> bool {
        matches!(self, CoreError::Decryption(_))
    }
}
