use evermark_babel::ConvertError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Error reading '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Error writing '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("'{}' is not a note; --mode {mode} needs an .html file", path.display())]
    NotANote { path: PathBuf, mode: &'static str },

    #[error("No .html notes found in '{}'", .0.display())]
    NoNotes(PathBuf),

    #[error("Failed to convert '{file}': {source}")]
    Convert { file: String, source: ConvertError },

    #[error("Failed to load configuration: {0}")]
    Config(#[from] evermark_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Write {
            path: path.into(),
            source,
        }
    }
}
