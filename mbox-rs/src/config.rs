use crate::error::{MboxError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Physical line cap of the underlying source. Longer lines are delivered in
/// chunks and reassembled by the message reader.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Bytes peeked after a `From ` line when deciding whether it is a separator.
pub const DEFAULT_LOOKAHEAD: usize = 2048;

/// Header-shaped lines required after a separator.
pub const DEFAULT_MIN_HEADER_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MboxConfig {
    pub max_line_length: usize,
    pub lookahead: usize,
    pub min_header_lines: usize,
}

impl Default for MboxConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            lookahead: DEFAULT_LOOKAHEAD,
            min_header_lines: DEFAULT_MIN_HEADER_LINES,
        }
    }
}

impl MboxConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MboxError::Config(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| MboxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // A partial chunk holds back a trailing '\r', so it needs room for one more byte.
        if self.max_line_length < 2 {
            return Err(MboxError::Config(format!(
                "max_line_length must be at least 2, got {}",
                self.max_line_length
            )));
        }

        if self.lookahead == 0 {
            return Err(MboxError::Config("lookahead must not be zero".to_string()));
        }

        if self.min_header_lines == 0 {
            return Err(MboxError::Config(
                "min_header_lines must not be zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = MboxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_line_length, 4096);
        assert_eq!(config.lookahead, 2048);
        assert_eq!(config.min_header_lines, 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MboxConfig::from_toml_str("lookahead = 512\n").unwrap();
        assert_eq!(config.lookahead, 512);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
        assert_eq!(config.min_header_lines, DEFAULT_MIN_HEADER_LINES);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(MboxConfig::from_toml_str("max_line_length = 1\n").is_err());
        assert!(MboxConfig::from_toml_str("lookahead = 0\n").is_err());
        assert!(MboxConfig::from_toml_str("min_header_lines = 0\n").is_err());
        assert!(MboxConfig::from_toml_str("lookahead = \"big\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_line_length = 8192").unwrap();
        writeln!(file, "min_header_lines = 3").unwrap();

        let config = MboxConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_line_length, 8192);
        assert_eq!(config.min_header_lines, 3);
        assert_eq!(config.lookahead, DEFAULT_LOOKAHEAD);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = MboxConfig::from_file("/nonexistent/mbox.toml").unwrap_err();
        assert!(matches!(err, MboxError::Config(_)));
    }
}
