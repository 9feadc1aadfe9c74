//! Response types for the item operations.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;

/// Output for the `GetItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The retrieved item, `None` when no item has the requested key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// Output for the `Query` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutput {
    /// Items matching the key condition and filter.
    #[serde(default)]
    pub items: Vec<Item>,

    /// The number of items in the response.
    #[serde(default)]
    pub count: i32,

    /// The number of items evaluated before the filter was applied.
    #[serde(default)]
    pub scanned_count: i32,

    /// Where the query stopped. Absent when there are no further pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}

/// Output for the `PutItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {}

/// Output for the `DeleteItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {}

/// Output for the `UpdateItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// Attributes selected by the request's `ReturnValues`.
    #[serde(default)]
    pub attributes: Item,
}
