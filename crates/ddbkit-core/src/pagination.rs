//! Pagination cursors.
//!
//! A [`PageCursor`] wraps the last-evaluated key of a query page as a JSON
//! object in the store's typed encoding (`{"PK": {"S": "..."}}`), so it can
//! be handed to a client and passed back without losing attribute types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ddbkit_model::{Item, MarshalError};

/// Opaque position of a query page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(Map<String, Value>);

impl PageCursor {
    /// Cursor for the key the store stopped at.
    ///
    /// Returns `None` when the key is empty, i.e. there are no more pages.
    #[allow(clippy::implicit_hasher)]
    pub fn from_last_evaluated_key(key: &Item) -> Result<Option<Self>, MarshalError> {
        if key.is_empty() {
            return Ok(None);
        }
        match serde_json::to_value(key)? {
            Value::Object(map) => Ok(Some(Self(map))),
            _ => Ok(None),
        }
    }

    /// Key to resume the query from.
    pub fn to_exclusive_start_key(&self) -> Result<Item, MarshalError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// `true` if the cursor carries no key attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The cursor as a JSON object.
    #[must_use]
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for PageCursor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
