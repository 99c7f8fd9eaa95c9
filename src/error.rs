use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown chip: {0}")]
    UnknownChip(String),

    #[error("Chip {chip} has {expected} channels, {got} requested")]
    ChannelCount {
        chip: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Chip initialization failed: {0}")]
    Init(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
