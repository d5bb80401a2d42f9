use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("This script must be run as root.")]
    NotRoot,

    /// `package` is only named when it differs from the tool.
    #[error("{tool} is not installed. Please install {} to use this script.", package.unwrap_or("it"))]
    MissingTool {
        tool: &'static str,
        package: Option<&'static str>,
    },

    #[error("This system PN is not listed on the compatible system list.")]
    IncompatibleSystem(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
