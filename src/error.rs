// src/error.rs
//! Error type shared by the data group codec, tokenizers and encoders.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The bytes violate the mandatory grammar or end too early.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Legal code that this crate does not produce or consume.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Code reserved by ARIB STD-B24 but unused by the caption profile.
    #[error("not used by standard: {0}")]
    NotUsedByStandard(String),

    /// Code forbidden in the active profile.
    #[error("violates standard: {0}")]
    ViolatesStandard(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Malformed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn malformed(what: impl Into<String>) -> Error {
    Error::Malformed(what.into())
}
