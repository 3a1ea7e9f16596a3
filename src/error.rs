use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{0}' failed with exit code {1}")]
    CommandFailed(String, i32),

    #[error("Command '{0}' not found, is it installed?")]
    CommandNotFound(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("USER environment variable not set")]
    MissingUser,

    #[error("Failed to lookup zsh file path: zsh is not on PATH")]
    ZshNotFound,

    #[error("Could not determine your home directory (pass --home)")]
    MissingHome,

    #[error("No package manager selected")]
    NoPackageManager,

    #[error("Failed to move {} into backup: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template path '{0}'")]
    InvalidAsset(String),
}
