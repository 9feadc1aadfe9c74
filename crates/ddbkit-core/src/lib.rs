//! Expression compilers and repository facade for a single-table store.
//!
//! Callers describe reads and writes with plain descriptors ([`Key`],
//! [`UpdateSpec`], [`FilterPredicate`]); the [`expression`] module compiles
//! them into the store's key-condition, update, filter and projection
//! expressions together with their placeholder tables. [`Table`] drives a
//! [`StoreGateway`] with the compiled output.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod expression;
pub mod gateway;
pub mod pagination;
pub mod table;

pub use config::TableConfig;
pub use error::TableError;
pub use expression::{
    CompiledExpression, CompiledQuery, ExpressionError, FilterPredicate, Key, KeyCondition,
    PlaceholderTable, SecondaryIndex, UpdateFunction, UpdateSpec, UpdateValue,
};
pub use gateway::StoreGateway;
pub use pagination::PageCursor;
pub use table::{PageRequest, QueryOptions, QueryPage, Table};
