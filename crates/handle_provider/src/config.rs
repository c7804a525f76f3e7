//! Provider configuration

use crate::errors::Result;
use config::{Config, Environment, File as ConfigFile};
use handle_types::Handle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Prefix registered to no one.
pub const EXAMPLE_PREFIX: &str = "123456789";
/// Global resolver used when no branded canonical URL prefix is configured.
pub const DEFAULT_CANONICAL_URL_PREFIX: &str = "http://hdl.handle.net/";
/// Environment variable prefix (`HANDLE_PREFIX`, `HANDLE_CANONICAL_URL_PREFIX`, ...).
pub const ENV_PREFIX: &str = "HANDLE";

const DEFAULT_SCHEMES: [&str; 3] = ["info:hdl", "hdl", "http://"];

/// Settings passed to the provider at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Naming authority used for freshly minted handles.
    pub prefix: String,
    /// Prepended to canonical handles to form the descriptive URI.
    pub canonical_url_prefix: String,
    /// Identifier prefixes accepted by `supports`.
    pub supported_schemes: Vec<String>,
    /// Default tracing filter for binaries.
    pub log_level: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            prefix: EXAMPLE_PREFIX.to_string(),
            canonical_url_prefix: DEFAULT_CANONICAL_URL_PREFIX.to_string(),
            supported_schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
            log_level: "info".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Layer an optional config file and `HANDLE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(ConfigFile::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        Self::from_source(&builder.build()?)
    }

    /// Read settings from an already built configuration.
    pub fn from_source(config: &Config) -> Result<Self> {
        let defaults = Self::default();

        let prefix = match non_empty(config.get_string("prefix").ok()) {
            Some(prefix) => prefix,
            None => {
                warn!(
                    prefix = %defaults.prefix,
                    "handle prefix is not configured; using example prefix"
                );
                defaults.prefix
            }
        };

        let canonical_url_prefix = non_empty(config.get_string("canonical_url_prefix").ok())
            .unwrap_or(defaults.canonical_url_prefix);

        let supported_schemes = match config.get_string("supported_schemes") {
            Ok(value) => {
                let schemes: Vec<String> = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if schemes.is_empty() {
                    defaults.supported_schemes
                } else {
                    schemes
                }
            }
            Err(_) => defaults.supported_schemes,
        };

        let log_level =
            non_empty(config.get_string("log_level").ok()).unwrap_or(defaults.log_level);

        Ok(Self {
            prefix,
            canonical_url_prefix,
            supported_schemes,
            log_level,
        })
    }

    /// Resolvable URL for a handle, always built from its canonical form.
    pub fn canonical_url(&self, handle: &Handle) -> String {
        format!("{}{}", self.canonical_url_prefix, handle.canonical())
    }

    /// Resolvable URL for a handle exactly as given (used for `X.1`).
    pub fn url_for(&self, handle: &Handle) -> String {
        format!("{}{}", self.canonical_url_prefix, handle)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_example_prefix() {
        let config = ProviderConfig::default();
        assert_eq!(config.prefix, "123456789");
        assert_eq!(config.canonical_url_prefix, "http://hdl.handle.net/");
        assert_eq!(config.supported_schemes.len(), 3);
    }

    #[test]
    fn empty_source_falls_back_to_defaults() {
        let source = Config::builder().build().unwrap();
        let config = ProviderConfig::from_source(&source).unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[test]
    fn empty_url_prefix_falls_back_to_default() {
        let source = Config::builder()
            .set_override("prefix", "10673")
            .unwrap()
            .set_override("canonical_url_prefix", "")
            .unwrap()
            .build()
            .unwrap();
        let config = ProviderConfig::from_source(&source).unwrap();
        assert_eq!(config.prefix, "10673");
        assert_eq!(config.canonical_url_prefix, DEFAULT_CANONICAL_URL_PREFIX);
    }

    #[test]
    fn loads_values_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"prefix = "20.500"
canonical_url_prefix = "https://hdl.example.edu/"
supported_schemes = "hdl, doi:""#
        )
        .unwrap();

        let config = ProviderConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.prefix, "20.500");
        assert_eq!(config.canonical_url_prefix, "https://hdl.example.edu/");
        assert_eq!(config.supported_schemes, vec!["hdl", "doi:"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ProviderConfig::load(Some(Path::new("/nonexistent/handles.toml")));
        assert!(err.is_err());
    }

    #[test]
    fn canonical_url_strips_version() {
        let config = ProviderConfig::default();
        assert_eq!(
            config.canonical_url(&Handle::new("123456789/42.3")),
            "http://hdl.handle.net/123456789/42"
        );
        assert_eq!(
            config.url_for(&Handle::new("123456789/42.1")),
            "http://hdl.handle.net/123456789/42.1"
        );
    }
}
