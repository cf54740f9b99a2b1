//! Value formatting strategies for the two supported config dialects.
//!
//! The generic dialect writes `key=value` verbatim. The CLI dialect writes
//! `key = value` and quotes every value that is not a boolean literal, an
//! integer, or already quoted.

use crate::ConfigError;
use std::borrow::Cow;

/// Dialect strategy injected into a [`ConfigStore`](crate::ConfigStore).
///
/// A formatter decides how an entry line is split into key and raw value, how
/// a raw value is presented to callers, and how a new entry line is rendered.
pub trait ValueFormatter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Split an entry line into `(key, raw value)`, or `None` if the line is
    /// not an entry in this dialect.
    fn split_entry<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)>;

    /// Text placed between key and value when rendering a line.
    fn separator(&self) -> &'static str;

    /// Encode a caller-supplied value for writing.
    fn encode<'a>(&self, value: &'a str) -> Cow<'a, str>;

    /// Decode a raw value read from the file.
    fn decode<'a>(&self, raw: &'a str) -> &'a str {
        raw
    }

    fn render(&self, key: &str, value: &str) -> String {
        format!("{key}{}{}", self.separator(), self.encode(value))
    }
}

/// `key=value` with no trimming and no quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl ValueFormatter for PlainFormatter {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn split_entry<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        line.split_once('=').filter(|(key, _)| !key.is_empty())
    }

    fn separator(&self) -> &'static str {
        "="
    }

    fn encode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(value)
    }
}

/// `key = value` / `key = "value"` with quote-if-needed encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliFormatter;

impl ValueFormatter for CliFormatter {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn split_entry<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key, value.trim()))
    }

    fn separator(&self) -> &'static str {
        " = "
    }

    fn encode<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if is_bare_value(value) {
            Cow::Borrowed(value)
        } else {
            Cow::Owned(format!("\"{value}\""))
        }
    }

    fn decode<'a>(&self, raw: &'a str) -> &'a str {
        if is_quoted(raw) {
            &raw[1..raw.len() - 1]
        } else {
            raw
        }
    }
}

/// Values the CLI dialect writes without quotes.
fn is_bare_value(value: &str) -> bool {
    value == "TRUE" || value == "FALSE" || is_integer(value) || is_quoted(value)
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

/// Select a formatter by dialect name (`plain` or `cli`).
pub fn select_formatter(name: &str) -> Result<Box<dyn ValueFormatter>, ConfigError> {
    match name {
        "plain" => Ok(Box::new(PlainFormatter)),
        "cli" => Ok(Box::new(CliFormatter)),
        other => Err(ConfigError::UnknownFormatter(other.to_owned())),
    }
}
