#![forbid(unsafe_code)]

//! Top-level error model.
//!
//! Each layer keeps its own typed error so callers can match on what matters;
//! [`Error`] only wraps them for code that talks to the [`crate::Editor`] and
//! wants a single `?` type.

use std::fmt;

use pagekit_core::CatalogError;
use pagekit_dnd::DropError;
use pagekit_tree::{BlockStoreError, InvariantViolation};

/// Top-level error type for PageKit hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Block vocabulary registration failed.
    Catalog(CatalogError),
    /// A store query or mutation was rejected.
    Store(BlockStoreError),
    /// A programmatic drop was rejected.
    Drop(DropError),
    /// The tree failed validation.
    Corrupt(InvariantViolation),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Drop(err) => write!(f, "{err}"),
            Self::Corrupt(violation) => write!(f, "corrupt block tree: {violation}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Drop(err) => Some(err),
            Self::Corrupt(violation) => Some(violation),
        }
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl From<BlockStoreError> for Error {
    fn from(err: BlockStoreError) -> Self {
        match err {
            BlockStoreError::Corrupt(violation) => Self::Corrupt(violation),
            other => Self::Store(other),
        }
    }
}

impl From<DropError> for Error {
    fn from(err: DropError) -> Self {
        Self::Drop(err)
    }
}

impl From<InvariantViolation> for Error {
    fn from(violation: InvariantViolation) -> Self {
        Self::Corrupt(violation)
    }
}

/// Standard result type for PageKit APIs.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_tree::BlockId;
    use std::error::Error as _;

    #[test]
    fn store_corruption_is_lifted() {
        let id = BlockId::new(3).expect("non-zero id");
        let violation = InvariantViolation::MissingFromSiblings { block: id };
        let err = Error::from(BlockStoreError::Corrupt(violation.clone()));
        assert_eq!(err, Error::Corrupt(violation));
        assert!(err.to_string().starts_with("corrupt block tree"));
    }

    #[test]
    fn sources_point_at_the_layer_error() {
        let err = Error::from(DropError::NoTarget);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source, Some(DropError::NoTarget.to_string()));
    }
}
