//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, unresolved or non-spawnable templates, unknown instances, configuration
//! parsing, and generic errors. The placement pipeline itself never fails a run;
//! these errors surface from validation, config loading and instantiators.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("template at index {index} has no template reference")]
    MissingTemplate { index: usize },

    #[error("template '{id}' cannot be spawned")]
    NotSpawnable { id: String },

    #[error("instance {handle} does not exist")]
    UnknownInstance { handle: u64 },

    #[error("config parse error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(feature = "ron")]
impl From<ron::error::SpannedError> for Error {
    fn from(value: ron::error::SpannedError) -> Self {
        Error::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn missing_template_message_names_index() {
        let err = Error::MissingTemplate { index: 3 };
        assert_eq!(
            err.to_string(),
            "template at index 3 has no template reference"
        );
    }
}
