use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const VERSION_SEPARATOR: char = '.';
const PATH_SEPARATOR: char = '/';

/// Persistent identifier of the form `prefix/suffix` or `prefix/suffix.N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Wrap a raw identifier string without validation.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Build `prefix/suffix`.
    pub fn from_parts(prefix: &str, suffix: impl fmt::Display) -> Self {
        Self(format!("{prefix}{PATH_SEPARATOR}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decompose into canonical form and optional version number.
    pub fn parse(&self) -> ParsedHandle {
        match split_version(&self.0) {
            Some((canonical, number)) => ParsedHandle {
                canonical: Handle(canonical.to_string()),
                version: Some(number),
            },
            None => ParsedHandle {
                canonical: self.clone(),
                version: None,
            },
        }
    }

    /// The handle with any version suffix stripped.
    pub fn canonical(&self) -> Handle {
        self.parse().canonical
    }

    /// Version number carried by the suffix, if any.
    pub fn version(&self) -> Option<u32> {
        split_version(&self.0).map(|(_, number)| number)
    }

    pub fn is_versioned(&self) -> bool {
        self.version().is_some()
    }

    /// Append `.N` to this handle.
    ///
    /// Callers pass the canonical form; appending to an already versioned
    /// handle produces a multi-dot identifier whose canonical part is the
    /// receiver.
    pub fn with_version(&self, number: u32) -> Handle {
        Handle(format!("{}{VERSION_SEPARATOR}{number}", self.0))
    }

    /// Naming-authority prefix (everything before the first `/`).
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once(PATH_SEPARATOR).map(|(prefix, _)| prefix)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = HandleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(HandleParseError::Empty);
        }
        match trimmed.split_once(PATH_SEPARATOR) {
            Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => {
                Ok(Handle(trimmed.to_string()))
            }
            _ => Err(HandleParseError::MissingSeparator(trimmed.to_string())),
        }
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Structured view of a handle: `{canonical, version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedHandle {
    pub canonical: Handle,
    pub version: Option<u32>,
}

impl ParsedHandle {
    /// Recompose the original identifier.
    pub fn compose(&self) -> Handle {
        match self.version {
            Some(number) => self.canonical.with_version(number),
            None => self.canonical.clone(),
        }
    }
}

/// Errors raised when accepting a handle from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleParseError {
    #[error("handle must not be empty")]
    Empty,
    #[error("handle must have the form prefix/suffix, got {0}")]
    MissingSeparator(String),
}

/// Identifier families a provider may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierScheme {
    Handle,
    Doi,
}

/// Split `prefix/stem.N` into (`prefix/stem`, N).
///
/// Requires a `/`, a non-empty stem after the last `/`, and a final `.`
/// followed only by digits forming a positive `u32`.
fn split_version(raw: &str) -> Option<(&str, u32)> {
    let slash = raw.rfind(PATH_SEPARATOR)?;
    let dot = raw.rfind(VERSION_SEPARATOR)?;
    if dot < slash {
        return None;
    }

    let stem = &raw[slash + 1..dot];
    let digits = &raw[dot + 1..];
    if stem.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match digits.parse::<u32>() {
        Ok(number) if number > 0 => Some((&raw[..dot], number)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versioned_handle() {
        let parsed = Handle::new("123456789/42.3").parse();
        assert_eq!(parsed.canonical, Handle::new("123456789/42"));
        assert_eq!(parsed.version, Some(3));
    }

    #[test]
    fn plain_handle_has_no_version() {
        let handle = Handle::new("123456789/42");
        assert_eq!(handle.version(), None);
        assert_eq!(handle.canonical(), handle);
    }

    #[test]
    fn dotted_prefix_is_not_a_version() {
        let handle = Handle::new("10.5072/abc");
        assert_eq!(handle.version(), None);
        assert_eq!(handle.prefix(), Some("10.5072"));

        let versioned = Handle::new("10.5072/abc.7");
        assert_eq!(versioned.canonical(), handle);
        assert_eq!(versioned.version(), Some(7));
    }

    #[test]
    fn multi_dot_suffix_splits_on_last_dot() {
        let parsed = Handle::new("123456789/42.1.5").parse();
        assert_eq!(parsed.canonical, Handle::new("123456789/42.1"));
        assert_eq!(parsed.version, Some(5));
    }

    #[test]
    fn rejects_non_numeric_and_degenerate_suffixes() {
        for raw in [
            "123456789/42.x",
            "123456789/42.",
            "123456789/.4",
            "123456789/42.0",
            "123456789/42.99999999999",
            "42.3",
            "123456789/42.3a",
        ] {
            assert_eq!(Handle::new(raw).version(), None, "{raw}");
        }
    }

    #[test]
    fn compose_reproduces_identifier() {
        let handle = Handle::new("123456789/100.12");
        assert_eq!(handle.parse().compose(), handle);
    }

    #[test]
    fn from_str_requires_separator() {
        assert!("123456789/1".parse::<Handle>().is_ok());
        assert_eq!(
            "".parse::<Handle>().unwrap_err(),
            HandleParseError::Empty
        );
        assert!(matches!(
            "nohandle".parse::<Handle>(),
            Err(HandleParseError::MissingSeparator(_))
        ));
        assert!("/42".parse::<Handle>().is_err());
    }
}
