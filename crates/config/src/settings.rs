// Application settings
// Loaded from ~/.config/periochart/settings.json

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error loading or saving settings.
#[derive(Debug)]
pub enum SettingsError {
    /// File could not be read or written.
    Io(String),
    /// File contents are not valid settings JSON.
    Parse(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "settings IO error: {msg}"),
            Self::Parse(msg) => write!(f, "settings parse error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Output format preference for command-line reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines (default)
    #[default]
    Text,
    /// JSON documents
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Data entry
    #[serde(rename = "entry.numericDebounceMs")]
    pub numeric_debounce_ms: u64,

    #[serde(rename = "entry.textDebounceMs")]
    pub text_debounce_ms: u64,

    #[serde(rename = "entry.changeDebounceMs")]
    pub change_debounce_ms: u64,

    // Output
    #[serde(rename = "output.format")]
    pub output_format: OutputFormat,

    #[serde(rename = "output.pretty")]
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Data entry
            numeric_debounce_ms: 150,
            text_debounce_ms: 300,
            change_debounce_ms: 100,
            // Output
            output_format: OutputFormat::Text,
            pretty: true,
        }
    }
}

/// Strip comment lines (starting with //) so the file can carry notes.
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("periochart");
        config_dir.join("settings.json")
    }

    /// Parse settings from JSON text. Missing keys take their defaults.
    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(&strip_comments(contents)).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Load settings from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Save settings to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| SettingsError::Io(e.to_string()))
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.numeric_debounce_ms, 150);
        assert_eq!(s.text_debounce_ms, 300);
        assert_eq!(s.change_debounce_ms, 100);
        assert_eq!(s.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_with_comments_and_missing_keys() {
        let text = r#"{
    // slower typists
    "entry.numericDebounceMs": 250,
    "output.format": "json"
}"#;
        let s = Settings::parse(text).unwrap();
        assert_eq!(s.numeric_debounce_ms, 250);
        assert_eq!(s.text_debounce_ms, 300);
        assert_eq!(s.output_format, OutputFormat::Json);
        assert!(s.pretty);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Settings::parse("{ not json"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut s = Settings::default();
        s.change_debounce_ms = 40;
        s.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
