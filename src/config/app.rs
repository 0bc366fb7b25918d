// src/config/app.rs
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::aliases::RsaPrivateKeyPem;
use crate::consts::{DEFAULT_CIPHER_NAME, IV_FILE_EXTENSION, KEY_FILE_EXTENSION};
use crate::crypto::{CipherSpec, KeyUnwrapper};
use crate::enums::{CipherAlgorithm, Encoding};
use crate::error::{CoreError, Result};
use crate::keystore::KeyStore;

/// Whole config file: one table per environment
#[derive(Clone, Default, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub environments: BTreeMap<String, EnvironmentConfig>,

    /// Directory relative key file paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| CoreError::Config(format!("unknown environment {name:?}")))
    }

    /// Build the key store for `environment`, unwrapping RSA-protected keys
    pub fn build_keystore(&self, environment: &str) -> Result<KeyStore> {
        self.environment(environment)?
            .build_keystore(self.base_dir.as_deref())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environments", &self.environments)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

/// One environment: either a single inline cipher or a list of slots
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub cipher: CipherAlgorithm,
    #[serde(default)]
    pub encoding: Encoding,
    pub key: Option<String>,
    pub iv: Option<String>,

    /// Current first, oldest last
    #[serde(default)]
    pub ciphers: Vec<CipherSlot>,

    pub private_rsa_key: Option<String>,
}

impl EnvironmentConfig {
    pub fn build_keystore(&self, base_dir: Option<&Path>) -> Result<KeyStore> {
        let inline = match (&self.key, &self.iv) {
            (Some(key), Some(iv)) => Some((key, iv)),
            (None, None) => None,
            _ => return Err(CoreError::Config("inline key and iv must be given together".into())),
        };

        let specs = match inline {
            Some(_) if !self.ciphers.is_empty() => {
                return Err(CoreError::Config(
                    "use either an inline key/iv or a ciphers list, not both".into(),
                ))
            }
            Some((key, iv)) => vec![CipherSpec::from_text(
                DEFAULT_CIPHER_NAME,
                self.cipher,
                key,
                iv,
                self.encoding,
            )?],
            None => {
                let unwrapper = self.unwrapper()?;
                self.ciphers
                    .iter()
                    .enumerate()
                    .map(|(index, slot)| slot.build(index, unwrapper.as_ref(), base_dir))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        if specs.is_empty() {
            return Err(CoreError::Config("environment defines no ciphers".into()));
        }
        debug!(ciphers = specs.len(), "resolved environment ciphers");
        KeyStore::new(specs)
    }

    /// The RSA unwrapper, present only when some slot is RSA-wrapped
    pub fn unwrapper(&self) -> Result<Option<KeyUnwrapper>> {
        if !self.ciphers.iter().any(CipherSlot::is_wrapped) {
            return Ok(None);
        }
        let pem = self.private_rsa_key.as_ref().ok_or_else(|| {
            CoreError::Config("private_rsa_key is required for RSA-wrapped ciphers".into())
        })?;
        KeyUnwrapper::from_pem(&RsaPrivateKeyPem::new(pem.clone())).map(Some)
    }
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("cipher", &self.cipher)
            .field("encoding", &self.encoding)
            .field("inline_key", &self.key.is_some())
            .field("ciphers", &self.ciphers)
            .field("private_rsa_key", &self.private_rsa_key.is_some())
            .finish()
    }
}

/// One entry of an environment's `ciphers` list
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CipherSlot {
    pub name: Option<String>,
    #[serde(default)]
    pub cipher: CipherAlgorithm,
    #[serde(default)]
    pub encoding: Encoding,

    // RSA-wrapped files
    pub key_filename: Option<PathBuf>,
    pub iv_filename: Option<PathBuf>,

    // RSA-wrapped, base64, embedded in config
    pub encrypted_key: Option<String>,
    pub encrypted_iv: Option<String>,

    // Plain hex or raw text (dev/test only)
    pub key: Option<String>,
    pub iv: Option<String>,
}

/// Where a slot's key material comes from
pub enum SlotSource<'a> {
    Files { key: &'a Path, iv: &'a Path },
    Embedded { key: &'a str, iv: &'a str },
    Inline { key: &'a str, iv: &'a str },
}

impl CipherSlot {
    /// Explicit name, else the key file's stem, else positional
    pub fn resolved_name(&self, index: usize) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(stem) = self
            .key_filename
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
        {
            return stem.to_owned();
        }
        if index == 0 {
            DEFAULT_CIPHER_NAME.to_owned()
        } else {
            format!("cipher-{index}")
        }
    }

    pub fn source(&self) -> Result<SlotSource<'_>> {
        let files = (self.key_filename.as_deref(), self.iv_filename.as_deref());
        let embedded = (self.encrypted_key.as_deref(), self.encrypted_iv.as_deref());
        let inline = (self.key.as_deref(), self.iv.as_deref());

        let configured = [
            files.0.is_some() || files.1.is_some(),
            embedded.0.is_some() || embedded.1.is_some(),
            inline.0.is_some() || inline.1.is_some(),
        ];
        if configured.iter().filter(|&&c| c).count() != 1 {
            return Err(CoreError::Config(format!(
                "cipher {:?} needs exactly one of key_filename/iv_filename, encrypted_key/encrypted_iv or key/iv",
                self.name.as_deref().unwrap_or_default()
            )));
        }

        let incomplete = || {
            CoreError::Config(format!(
                "cipher {:?} is missing half of its key/iv pair",
                self.name.as_deref().unwrap_or_default()
            ))
        };
        match (files, embedded, inline) {
            ((Some(key), Some(iv)), _, _) => Ok(SlotSource::Files { key, iv }),
            (_, (Some(key), Some(iv)), _) => Ok(SlotSource::Embedded { key, iv }),
            (_, _, (Some(key), Some(iv))) => Ok(SlotSource::Inline { key, iv }),
            _ => Err(incomplete()),
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(
            self.source(),
            Ok(SlotSource::Files { .. }) | Ok(SlotSource::Embedded { .. })
        )
    }

    /// Key and iv file paths, resolved against `base_dir` when relative
    pub fn key_paths(&self, base_dir: Option<&Path>) -> Option<(PathBuf, PathBuf)> {
        match self.source() {
            Ok(SlotSource::Files { key, iv }) => {
                Some((resolve(base_dir, key), resolve(base_dir, iv)))
            }
            _ => None,
        }
    }

    pub fn build(
        &self,
        index: usize,
        unwrapper: Option<&KeyUnwrapper>,
        base_dir: Option<&Path>,
    ) -> Result<CipherSpec> {
        let name = self.resolved_name(index);
        let require = || {
            unwrapper.ok_or_else(|| {
                CoreError::Config(format!(
                    "cipher {name:?} is RSA-wrapped but no private key is loaded"
                ))
            })
        };
        let (key, iv) = match self.source()? {
            SlotSource::Inline { key, iv } => {
                return CipherSpec::from_text(name, self.cipher, key, iv, self.encoding)
            }
            SlotSource::Files { key, iv } => require()?.unwrap_files(
                self.cipher,
                &resolve(base_dir, key),
                &resolve(base_dir, iv),
            )?,
            SlotSource::Embedded { key, iv } => require()?.unwrap_base64(self.cipher, key, iv)?,
        };
        CipherSpec::new(name, self.cipher, key, iv, self.encoding)
    }
}

impl fmt::Debug for CipherSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherSlot")
            .field("name", &self.name)
            .field("cipher", &self.cipher)
            .field("encoding", &self.encoding)
            .field("key_filename", &self.key_filename)
            .field("iv_filename", &self.iv_filename)
            .finish_non_exhaustive()
    }
}

/// Conventional `<dir>/<name>.key` / `<dir>/<name>.iv` pair for a slot
pub fn key_file_pair(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.{KEY_FILE_EXTENSION}")),
        dir.join(format!("{name}.{IV_FILE_EXTENSION}")),
    )
}

fn resolve(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}
