//! Errors raised by the pure tier model.
//!
//! Most lookups in this crate are total (unknown ids fall back to base values),
//! so errors only surface where a caller explicitly asks for strict validation.
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("unknown tier '{0}'")]
    UnknownTier(String),

    #[error("unknown world tier mode '{0}'")]
    UnknownMode(String),

    #[error("tier catalog is empty")]
    EmptyCatalog,
}

pub type Result<T> = std::result::Result<T, TierError>;
