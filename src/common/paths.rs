//! Platform configuration and data paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/htmlsuite-runner/`, `~/.local/share/htmlsuite-runner/`
//! - macOS: `~/Library/Application Support/htmlsuite-runner/`
//! - Windows: `%APPDATA%\htmlsuite-runner\`

use std::path::PathBuf;

/// Application name used for every platform directory
const APP_NAME: &str = "htmlsuite-runner";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the default staging directory for downloaded suites
///
/// Falls back to the system temp directory when no home directory is known.
pub fn staging_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("staging"))
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME).join("staging"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_dir_is_valid() {
        let dir = staging_dir();
        assert!(dir.ends_with("staging"));
    }

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
