//! Errors returned by the [`Table`](crate::table::Table) facade.

use ddbkit_model::{MarshalError, StoreError};

use crate::expression::ExpressionError;

/// Errors from table operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The descriptor could not be compiled.
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    /// A record could not be converted to or from an item.
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    /// The gateway reported a store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No item matched the key.
    #[error("item not found: {key}")]
    NotFound {
        /// The key that matched nothing.
        key: String,
    },
}

impl TableError {
    /// Whether repeating the call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Expression(_) | Self::Marshal(_) | Self::NotFound { .. } => false,
        }
    }

    /// `true` for [`TableError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
