//! Error types for dredge.
//!
//! Errors are grouped by pipeline stage: configuration, reference
//! parsing, and secret access. Everything funnels into the top-level
//! [`Error`] so `main` reports a single human-readable message and
//! exits non-zero.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("access error: {0}")]
    Access(#[from] AccessError),

    #[error("this pipeline step is not licensed for {repository}: contact support@usemantle.com")]
    EntitlementDenied { repository: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading or interpreting the step's inputs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("missing environment variable: {0}")]
    MissingEnvironment(String),

    #[error("input {name} is not a boolean: {value:?}")]
    InvalidBool { name: String, value: String },

    #[error("input {name} is not a non-negative integer: {value:?}")]
    InvalidInteger { name: String, value: String },

    #[error("unknown encoding: {0:?} (expected utf-8, utf-16le, or utf-16be)")]
    UnknownEncoding(String),
}

/// Errors in the secret reference grammar.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line_no}: empty locator in {line:?}")]
    EmptyLocator { line_no: usize, line: String },

    #[error("line {line_no}: more than one unescaped ':' in {line:?}")]
    ExtraDelimiter { line_no: usize, line: String },

    #[error("line {line_no}: bad escape sequence in {line:?} (only \\: and \\\\ are recognized)")]
    BadEscape { line_no: usize, line: String },

    #[error("line {line_no}: invalid output name {name:?} (must match [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidOutputName { line_no: usize, name: String },

    #[error("line {line_no}: cannot derive an output name from locator {locator:?}")]
    UnderivableName { line_no: usize, locator: String },
}

/// Errors fetching or decoding a secret value.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("no access token: set GOOGLE_OAUTH_ACCESS_TOKEN or authenticate gcloud ({0})")]
    Auth(String),

    #[error("request for {locator} failed: {source}")]
    Transport {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("store rejected {locator} (HTTP {status}): {message}")]
    Store {
        locator: String,
        status: u16,
        message: String,
    },

    #[error("malformed payload for {locator}: {reason}")]
    Payload { locator: String, reason: String },

    #[error("value for {locator} is not valid {encoding}")]
    Decode { locator: String, encoding: String },
}

pub type Result<T> = std::result::Result<T, Error>;
