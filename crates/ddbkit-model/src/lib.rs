//! Wire types for the ddbkit single-table store client.
//!
//! This crate holds everything that crosses the boundary to the store: the
//! typed [`AttributeValue`] representation with its DynamoDB JSON encoding,
//! the request and response structs for the five item operations the
//! repository layer issues, the store error type, and the marshalling bridge
//! between `serde` records and typed items.
// "DynamoDB" appears in many doc comments in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod marshal;
pub mod operations;
pub mod output;

pub use attribute_value::{AttributeValue, Item};
pub use error::{StoreError, StoreErrorCode};
pub use input::ReturnValue;
pub use marshal::{MarshalError, from_item, to_item};
pub use operations::StoreOperation;
