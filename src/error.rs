use thiserror::Error;

#[derive(Error, Debug)]
pub enum OnboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Step '{step}' failed: {message}")]
    Step { step: String, message: String },

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("{0}")]
    Timeout(String),
}

impl OnboardError {
    pub fn step(step: impl Into<String>, message: impl Into<String>) -> Self {
        OnboardError::Step {
            step: step.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OnboardError>;
