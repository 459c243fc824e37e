//! Step configuration.
//!
//! The configuration is read once from the runner's declared inputs
//! at process start and never mutated afterwards; the pipeline takes
//! it by reference so it can be constructed directly in tests.

use crate::error::{ConfigError, Error, Result};
use crate::runner::Runner;

/// Default store namespace when the `universe` input is absent.
pub const DEFAULT_UNIVERSE: &str = "googleapis.com";

/// Mask lines at least this long unless `min_mask_length` says otherwise.
///
/// Masking single characters makes unrelated log output unreadable, so
/// very short lines are deliberately left unmasked.
pub const DEFAULT_MIN_MASK_LENGTH: usize = 4;

/// Immutable per-run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store namespace the Secret Manager endpoint is scoped to.
    pub universe: String,
    /// Raw multi-line reference list (see [`crate::reference::parse`]).
    pub secrets: String,
    /// Lines shorter than this are not registered for masking.
    pub min_mask_length: usize,
    /// Also export each output as an environment variable.
    pub export_to_environment: bool,
    /// Text encoding of fetched secret payloads.
    pub encoding: Encoding,
}

impl Config {
    /// Read the configuration from the runner's inputs.
    pub fn from_runner(runner: &impl Runner) -> Result<Self> {
        let secrets = runner
            .input("secrets")
            .ok_or_else(|| ConfigError::MissingInput("secrets".to_string()))?;

        let universe = runner
            .input("universe")
            .unwrap_or_else(|| DEFAULT_UNIVERSE.to_string());

        let min_mask_length = match runner.input("min_mask_length") {
            Some(raw) => parse_usize("min_mask_length", &raw)?,
            None => DEFAULT_MIN_MASK_LENGTH,
        };

        let export_to_environment = match runner.input("export_to_environment") {
            Some(raw) => parse_bool("export_to_environment", &raw)?,
            None => false,
        };

        let encoding = match runner.input("encoding") {
            Some(raw) => Encoding::from_name(&raw)?,
            None => Encoding::Utf8,
        };

        Ok(Self {
            universe,
            secrets,
            min_mask_length,
            export_to_environment,
            encoding,
        })
    }
}

/// Permissive boolean parser for boolean-like string inputs.
fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: raw.to_string(),
        }
        .into()),
    }
}

fn parse_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim().parse().map_err(|_| {
        Error::from(ConfigError::InvalidInteger {
            name: name.to_string(),
            value: raw.to_string(),
        })
    })
}

/// Text encodings accepted for secret payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16le" | "utf16le" => Ok(Self::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Self::Utf16Be),
            _ => Err(ConfigError::UnknownEncoding(name.to_string()).into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Decode raw payload bytes to a string, or `None` if the bytes
    /// are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Self::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Self::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        }
    }
}

fn decode_utf16(bytes: &[u8], combine: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| combine([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}
