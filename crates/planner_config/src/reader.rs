//! Locates and reads a [`Config`] from the filesystem, falling back through
//! a platform config directory and the current working directory.

use std::path::Path;

use directories::BaseDirs;

use super::{Config, ParseError};

/// Error type for [`read_config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigReaderError {
    /// IO error, i.e. could not read file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No config file found among the default locations or the one given as
    /// input.
    #[error("no config file found")]
    NoConfigFile,
    /// Config parse error. See [`ParseError`].
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Result type for [`read_config`].
pub type Result<T> = std::result::Result<T, ConfigReaderError>;

fn default_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![];

    if let Some(base_dirs) = BaseDirs::new() {
        paths.push(base_dirs.config_dir().join("lsc-planner").join("config.toml"));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config/config.toml"));
    }

    paths
}

/// Read a [`Config`] from `path` if given, otherwise search the default
/// platform config directory and `./config/config.toml` in that order.
///
/// # Errors
/// [`ConfigReaderError::NoConfigFile`] if none of the candidate paths exist,
/// [`ConfigReaderError::Io`]/[`ConfigReaderError::Parse`] if the first
/// existing one cannot be read or parsed.
pub fn read_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    let candidate = path
        .map(|p| p.as_ref().to_path_buf())
        .into_iter()
        .chain(default_paths())
        .find(|p| p.exists());

    match candidate {
        Some(path) => Ok(Config::from_file(path)?),
        None => Err(ConfigReaderError::NoConfigFile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_and_no_defaults_is_no_config_file() {
        let result = read_config(Some("/nonexistent/path/to/config.toml"));
        assert!(matches!(result, Err(ConfigReaderError::NoConfigFile)));
    }
}
