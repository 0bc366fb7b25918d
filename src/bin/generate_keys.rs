// src/bin/generate_keys.rs
//! Key provisioning CLI
//!
//! generate_keys <config.toml> <environment> [--force]
//!     writes fresh RSA-wrapped key/iv files for every file-backed slot
//! generate_keys --rsa-key [bits]
//!     prints a new PKCS#1 private key for `private_rsa_key`
//! generate_keys --inline-key [algorithm]
//!     prints a random hex key/iv for dev/test config

use anyhow::{bail, Context, Result};
use symmetric_vault::consts::DEFAULT_RSA_BITS;
use symmetric_vault::key_ops::{generate_inline_key, generate_rsa_private_key};
use symmetric_vault::{generate_symmetric_key_files, load_config, CipherAlgorithm};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: generate_keys <config.toml> <environment> [--force]
       generate_keys --rsa-key [bits]
       generate_keys --inline-key [algorithm]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--rsa-key") => {
            let bits = match args.get(1) {
                Some(bits) => bits.parse().context("RSA key size must be a number of bits")?,
                None => DEFAULT_RSA_BITS,
            };
            let pem = generate_rsa_private_key(bits)?;
            print!("{}", pem.expose_secret());
        }
        Some("--inline-key") => {
            let algorithm: CipherAlgorithm = match args.get(1) {
                Some(name) => name.parse()?,
                None => CipherAlgorithm::default(),
            };
            let repr = generate_inline_key(algorithm);
            println!("cipher = \"{algorithm}\"");
            println!("key = \"{}\"", repr.key_hex);
            println!("iv = \"{}\"", repr.iv_hex);
        }
        Some(config_path) if args.len() >= 2 => {
            let environment = &args[1];
            let force = args[2..].iter().any(|a| a == "--force");
            let config = load_config(config_path)
                .with_context(|| format!("failed to load {config_path}"))?;
            let slots = generate_symmetric_key_files(&config, environment, force)
                .with_context(|| format!("key generation for {environment:?} refused"))?;
            for slot in &slots {
                info!(
                    "{} ({}) → {} / {}",
                    slot.name,
                    slot.algorithm,
                    slot.key_path.display(),
                    slot.iv_path.display()
                );
            }
            info!("generated {} cipher slot(s); restart or reload to use them", slots.len());
        }
        _ => bail!(USAGE),
    }
    Ok(())
}
