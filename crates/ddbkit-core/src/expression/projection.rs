//! Projection expression compiler.

use tracing::debug;

use super::placeholder::{CompiledExpression, PlaceholderTable};

/// Compile `fields` into a projection expression, extending `placeholders`.
///
/// A leading `#` on a field is ignored. No fields yields an empty expression.
pub fn compile_projection(
    fields: &[String],
    mut placeholders: PlaceholderTable,
) -> CompiledExpression {
    let aliases: Vec<String> = fields
        .iter()
        .map(|field| {
            let field = field.trim_start_matches('#');
            placeholders.name(field, field)
        })
        .collect();
    let expression = aliases.join(",");
    if !expression.is_empty() {
        debug!(expression = %expression, "Compiled projection expression");
    }
    CompiledExpression::new(expression, placeholders)
}
