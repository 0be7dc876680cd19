use thiserror::Error;

pub type LockboxResult<T> = Result<T, LockboxError>;

#[derive(Debug, Error)]
pub enum LockboxError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
