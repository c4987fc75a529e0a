use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("No active displays found")]
    NoDisplay,

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Memory store request failed: {0}")]
    Memory(String),

    #[error("Hotkey registration failed: {0}")]
    Hotkey(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating LLM errors
    pub fn llm(msg: impl Into<String>) -> Self {
        Error::Llm(msg.into())
    }

    /// Helper for creating memory store errors
    pub fn memory(msg: impl Into<String>) -> Self {
        Error::Memory(msg.into())
    }
}
