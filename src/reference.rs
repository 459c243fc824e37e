//! Secret reference parsing.
//!
//! The `secrets` input is a line-oriented list: one reference per
//! line, blank lines ignored. Each line is either a bare store locator
//! or `locator:OUTPUT_NAME`. A literal colon inside a locator is
//! written `\:`. When no output name is given, one is derived from the
//! locator and sanitized into a valid identifier.

use tracing::warn;

use crate::error::{ParseError, Result};

/// One secret to fetch and where to publish it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    /// Store-specific path of the secret, e.g.
    /// `projects/p/secrets/s/versions/latest`.
    pub locator: String,
    /// Name under which the fetched value is published.
    pub output: String,
}

/// Parse the raw multi-line `secrets` input into ordered references.
///
/// The returned order matches input line order; it determines fetch
/// order and, for duplicate output names, overwrite order
/// (last write wins).
pub fn parse(raw: &str) -> Result<Vec<SecretReference>> {
    let mut refs = Vec::new();

    for (idx, line) in split_lines(raw).into_iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        refs.push(parse_line(line, idx + 1)?);
    }

    for (i, r) in refs.iter().enumerate() {
        if refs[..i].iter().any(|earlier| earlier.output == r.output) {
            warn!(
                output = %r.output,
                "duplicate output name: the later reference overwrites the earlier one"
            );
        }
    }

    Ok(refs)
}

/// Parse one non-blank, trimmed line.
fn parse_line(line: &str, line_no: usize) -> Result<SecretReference> {
    let mut locator = String::new();
    let mut explicit: Option<String> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            // Escapes are only meaningful in the locator; past the
            // delimiter the output name must be a plain identifier.
            '\\' if explicit.is_some() => {
                return Err(ParseError::BadEscape {
                    line_no,
                    line: line.to_string(),
                }
                .into())
            }
            '\\' => match chars.next() {
                Some(':') => locator.push(':'),
                Some('\\') => locator.push('\\'),
                _ => {
                    return Err(ParseError::BadEscape {
                        line_no,
                        line: line.to_string(),
                    }
                    .into())
                }
            },
            ':' if explicit.is_some() => {
                return Err(ParseError::ExtraDelimiter {
                    line_no,
                    line: line.to_string(),
                }
                .into())
            }
            ':' => explicit = Some(String::new()),
            _ => match explicit {
                Some(ref mut name) => name.push(ch),
                None => locator.push(ch),
            },
        }
    }

    let locator = locator.trim().to_string();
    if locator.is_empty() {
        return Err(ParseError::EmptyLocator {
            line_no,
            line: line.to_string(),
        }
        .into());
    }

    let output = match explicit {
        Some(name) => {
            let name = name.trim();
            if !is_valid_output_name(name) {
                return Err(ParseError::InvalidOutputName {
                    line_no,
                    name: name.to_string(),
                }
                .into());
            }
            name.to_string()
        }
        None => derive_output_name(&locator).ok_or(ParseError::UnderivableName {
            line_no,
            locator: locator.clone(),
        })?,
    };

    Ok(SecretReference { locator, output })
}

/// Split on `\r\n`, `\r`, or `\n`.
///
/// Shared with the masking policy so the grammar and the mask
/// splitter agree on what a line is.
pub(crate) fn split_lines(value: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = value.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&value[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&value[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }

    lines.push(&value[start..]);
    lines
}

/// Output names must be usable as environment variable names.
fn is_valid_output_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Derive an output name from a locator.
///
/// For Secret Manager paths (`projects/*/secrets/<name>[/versions/*]`)
/// the secret's own name is used; for anything else, the last path
/// segment. The result is sanitized into an identifier: characters
/// outside `[A-Za-z0-9_]` become `_`, and a leading digit gets a `_`
/// prefix. Returns `None` when nothing identifier-like remains.
fn derive_output_name(locator: &str) -> Option<String> {
    let segments: Vec<&str> = locator.split('/').collect();

    let candidate = segments
        .iter()
        .position(|s| *s == "secrets")
        .and_then(|i| segments.get(i + 1).copied())
        .filter(|s| !s.is_empty())
        .or_else(|| segments.iter().rev().find(|s| !s.is_empty()).copied())?;

    let mut name: String = candidate
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.chars().all(|c| c == '_') {
        return None;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    Some(name)
}
