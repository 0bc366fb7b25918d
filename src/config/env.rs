// src/config/env.rs
//! `${NAME}` placeholder expansion from the process environment
//!
//! Runs on the raw config text before TOML parsing, so secrets such as the
//! RSA private key can live outside the file. A placeholder must close on
//! the line it opens. Whole-line `#` comments are copied through untouched,
//! so a commented-out `# key = "${OLD_KEY}"` never needs `OLD_KEY` set.
//! Placeholders in trailing comments are still expanded.

use std::env;

use crate::error::{CoreError, Result};

pub fn expand(text: &str) -> Result<String> {
    expand_with(text, |name| env::var(name).ok())
}

pub(crate) fn expand_with(text: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            out.push_str(line);
        } else {
            expand_line(line, &lookup, &mut out)?;
        }
    }
    Ok(out)
}

fn expand_line(
    line: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    out: &mut String,
) -> Result<()> {
    let mut rest = line;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| CoreError::Config("unterminated ${ placeholder".into()))?;
        let name = after[..end].trim();
        if name.is_empty() {
            return Err(CoreError::Config("empty ${} placeholder".into()));
        }
        let value = lookup(name).ok_or_else(|| {
            CoreError::Config(format!("environment variable {name} is not set"))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(())
}

