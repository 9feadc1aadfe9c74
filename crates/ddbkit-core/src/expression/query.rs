//! Combined compilation for a single query request.

use serde::Serialize;

use super::error::ExpressionError;
use super::filter::{FilterPredicate, compile_filter};
use super::key_condition::{Key, compile_key_condition};
use super::placeholder::PlaceholderTable;
use super::projection::compile_projection;

/// Expressions of one query sharing a single placeholder table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
    /// Key condition expression.
    pub key_condition: String,
    /// Filter expression, if any predicates were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Projection expression, if any fields were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    /// Placeholders referenced by all expressions.
    #[serde(flatten)]
    pub placeholders: PlaceholderTable,
}

/// Compile the key condition, filter and projection of a query.
///
/// The key condition table is extended by the filter and then the
/// projection, so a filter field equal to a key attribute is suffixed only
/// when it belongs to the child pass. Filter values never replace the key
/// condition's `:gsipk`, `:gsisk`, `:from` or `:to`.
pub fn compile_query(
    key: &Key,
    filter: &[FilterPredicate],
    projection: &[String],
) -> Result<CompiledQuery, ExpressionError> {
    let key_condition = compile_key_condition(key)?;
    let filtered = compile_filter(filter, key_condition.placeholders)?;
    let projected = compile_projection(projection, filtered.placeholders);

    Ok(CompiledQuery {
        key_condition: key_condition.expression,
        filter: non_empty(filtered.expression),
        projection: non_empty(projected.expression),
        placeholders: projected.placeholders,
    })
}

fn non_empty(expression: String) -> Option<String> {
    (!expression.is_empty()).then_some(expression)
}
