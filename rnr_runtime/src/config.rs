//! Session configuration.
//!
//! The config file holds two tokens: the mode keyword and the trace path.
//!
//!   record C:\traces\beatsaber\trace.txt
//!
//! A path containing spaces may be wrapped in double quotes. The file is
//! read once at session start; failures here are fatal.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory under the user's local data dir holding `config.txt`.
pub const CONFIG_DIR_NAME: &str = "librnr";
pub const CONFIG_FILE_NAME: &str = "config.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is missing the mode keyword")]
    MissingMode,

    #[error("unknown mode {0:?}, expected `record` or `replay`")]
    UnknownMode(String),

    #[error("config is missing the trace file path")]
    MissingTracePath,

    #[error("unterminated quoted trace path")]
    UnterminatedQuote,

    #[error("no local data directory available for the default config")]
    NoDataDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Record,
    Replay,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("record") {
            Ok(Mode::Record)
        } else if s.eq_ignore_ascii_case("replay") {
            Ok(Mode::Replay)
        } else {
            Err(ConfigError::UnknownMode(s.to_string()))
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Record => f.write_str("RECORD"),
            Mode::Replay => f.write_str("REPLAY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: Mode,
    pub trace_path: PathBuf,
}

impl SessionConfig {
    pub fn new(mode: Mode, trace_path: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            trace_path: trace_path.into(),
        }
    }

    /// Parse the two-token config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim_start();
        let mode_end = text.find(char::is_whitespace).unwrap_or(text.len());
        let (mode_raw, rest) = text.split_at(mode_end);
        if mode_raw.is_empty() {
            return Err(ConfigError::MissingMode);
        }
        let mode = mode_raw.parse()?;

        let rest = rest.trim_start();
        let trace_path = if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').ok_or(ConfigError::UnterminatedQuote)?;
            &quoted[..end]
        } else {
            rest.split_whitespace().next().unwrap_or("")
        };
        if trace_path.is_empty() {
            return Err(ConfigError::MissingTracePath);
        }

        Ok(Self::new(mode, trace_path))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// `<local data dir>/librnr/config.txt`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::data_local_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_config() {
        let config = SessionConfig::parse("record C:/traces/run1/trace.txt\n").unwrap();
        assert_eq!(config.mode, Mode::Record);
        assert_eq!(config.trace_path, PathBuf::from("C:/traces/run1/trace.txt"));
    }

    #[test]
    fn tokens_may_be_split_across_lines() {
        let config = SessionConfig::parse("replay\n/tmp/trace.txt\n").unwrap();
        assert_eq!(config.mode, Mode::Replay);
        assert_eq!(config.trace_path, PathBuf::from("/tmp/trace.txt"));
    }

    #[test]
    fn mode_keyword_is_case_insensitive() {
        assert_eq!(
            SessionConfig::parse("REPLAY t.txt").unwrap().mode,
            Mode::Replay
        );
    }

    #[test]
    fn quoted_path_may_contain_spaces() {
        let config = SessionConfig::parse("record \"C:/My Traces/a.txt\"").unwrap();
        assert_eq!(config.trace_path, PathBuf::from("C:/My Traces/a.txt"));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(matches!(
            SessionConfig::parse("rewind t.txt"),
            Err(ConfigError::UnknownMode(m)) if m == "rewind"
        ));
    }

    #[test]
    fn rejects_missing_tokens() {
        assert!(matches!(
            SessionConfig::parse("   "),
            Err(ConfigError::MissingMode)
        ));
        assert!(matches!(
            SessionConfig::parse("record\n"),
            Err(ConfigError::MissingTracePath)
        ));
        assert!(matches!(
            SessionConfig::parse("record \"unterminated"),
            Err(ConfigError::UnterminatedQuote)
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SessionConfig::load(Path::new("/nonexistent/librnr/config.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
