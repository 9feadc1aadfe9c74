//! Errors raised while building or compiling descriptors.

use super::key_condition::KeyCondition;

/// Errors produced by the expression compilers.
///
/// All of these describe a malformed descriptor. They are never transient and
/// retrying the same call yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// A key condition name outside the supported set.
    #[error("unsupported key condition ({condition})")]
    UnsupportedCondition {
        /// The rejected condition name.
        condition: String,
    },
    /// An update function tag naming an unknown function.
    #[error("unsupported function name ({tag})")]
    UnsupportedFunction {
        /// The rejected tag.
        tag: String,
    },
    /// An update function tag that is not `Fn:<function>:<field>`.
    #[error("unsupported function format ({tag})")]
    UnsupportedFunctionFormat {
        /// The rejected tag.
        tag: String,
    },
    /// An index name outside `GSI1`..`GSI5`.
    #[error("unsupported index name ({index})")]
    UnsupportedIndex {
        /// The rejected index name.
        index: String,
    },
    /// The key has no partition key value.
    #[error("key has no partition key value")]
    MissingPartitionKey,
    /// A sort key condition was given without a sort key value.
    #[error("key condition {condition} requires a sort key value")]
    MissingSortKey {
        /// The condition that needed the sort key.
        condition: KeyCondition,
    },
    /// A `date` filter keyword that is not `start/end`.
    #[error("date filter on {field} expects `start/end`, got {keyword}")]
    InvalidDateRange {
        /// The filtered field.
        field: String,
        /// The keyword as given.
        keyword: String,
    },
    /// A filter keyword of the wrong kind for its predicate type.
    #[error("filter on {field} expects a {expected} keyword")]
    KeywordType {
        /// The filtered field.
        field: String,
        /// The keyword kind the predicate type needs.
        expected: &'static str,
    },
}
