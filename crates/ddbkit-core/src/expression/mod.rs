//! Compilers from descriptors to store expressions.
//!
//! Every compiler produces a [`CompiledExpression`]: the expression text plus
//! the [`PlaceholderTable`] it references. Expression text only ever refers to
//! `#name` and `:value` tokens, never to raw attribute names or values.
//!
//! - [`key_condition`]: partition/sort key conditions for the primary key or a
//!   secondary index.
//! - [`update`]: `SET` expressions, including `list_append` and counters.
//! - [`filter`]: post-fetch predicates joined by `AND`/`OR`.
//! - [`projection`]: attribute selection.
//! - [`query`]: all of the above merged into one placeholder table.

pub mod error;
pub mod filter;
pub mod key_condition;
pub mod placeholder;
pub mod projection;
pub mod query;
pub mod update;

pub use error::ExpressionError;
pub use filter::{FilterKeyword, FilterPredicate, FilterType, LogicalOp, compile_filter};
pub use key_condition::{Key, KeyCondition, SecondaryIndex, compile_key_condition};
pub use placeholder::{CompiledExpression, PlaceholderTable};
pub use projection::compile_projection;
pub use query::{CompiledQuery, compile_query};
pub use update::{UpdateFunction, UpdateSpec, UpdateValue, compile_update, compile_update_at};
