//! Item operations issued against the store.

use std::fmt;

/// Store operations the repository layer issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Get an item by primary key.
    GetItem,
    /// Query items by key condition.
    Query,
    /// Put (insert or replace) an item.
    PutItem,
    /// Delete an item by primary key.
    DeleteItem,
    /// Update an item with an update expression.
    UpdateItem,
}

impl StoreOperation {
    /// Returns the wire operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetItem => "GetItem",
            Self::Query => "Query",
            Self::PutItem => "PutItem",
            Self::DeleteItem => "DeleteItem",
            Self::UpdateItem => "UpdateItem",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
