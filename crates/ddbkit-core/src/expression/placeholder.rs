//! Placeholder tables shared by all compilers.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use ddbkit_model::AttributeValue;

/// Name and value placeholders referenced by compiled expressions.
///
/// Name keys always start with `#` and value keys with `:`. Registering an
/// existing token overwrites its previous entry. Entries are kept ordered so
/// that debug output and serialized tables are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceholderTable {
    #[serde(rename = "expressionAttributeNames")]
    names: BTreeMap<String, String>,
    #[serde(rename = "expressionAttributeValues")]
    values: BTreeMap<String, AttributeValue>,
}

impl PlaceholderTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `#token -> raw` and return `#token`.
    pub fn name(&mut self, token: &str, raw: &str) -> String {
        let alias = format!("#{token}");
        self.names.insert(alias.clone(), raw.to_owned());
        alias
    }

    /// Register `:token -> value` and return `:token`.
    pub fn value(&mut self, token: &str, value: AttributeValue) -> String {
        let alias = format!(":{token}");
        self.values.insert(alias.clone(), value);
        alias
    }

    /// Whether `#token` is registered.
    #[must_use]
    pub fn contains_name(&self, token: &str) -> bool {
        self.names.contains_key(&format!("#{token}"))
    }

    /// Whether `:token` is registered.
    #[must_use]
    pub fn contains_value(&self, token: &str) -> bool {
        self.values.contains_key(&format!(":{token}"))
    }

    /// Raw attribute name behind `alias` (including the leading `#`).
    #[must_use]
    pub fn resolve_name(&self, alias: &str) -> Option<&str> {
        self.names.get(alias).map(String::as_str)
    }

    /// Value behind `alias` (including the leading `:`).
    #[must_use]
    pub fn resolve_value(&self, alias: &str) -> Option<&AttributeValue> {
        self.values.get(alias)
    }

    /// Iterate over `(alias, raw name)` pairs.
    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over `(alias, value)` pairs.
    pub fn values(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of name placeholders.
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Number of value placeholders.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// `true` when neither names nor values are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// Split into the maps a store request carries.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        (
            self.names.into_iter().collect(),
            self.values.into_iter().collect(),
        )
    }
}

/// First of `base`, `base_2`, `base_3`, ... accepted by `is_free`.
pub(crate) fn first_free_token(base: &str, is_free: impl Fn(&str) -> bool) -> String {
    if is_free(base) {
        return base.to_owned();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|token| is_free(token))
        .unwrap_or_else(|| base.to_owned())
}

/// Expression text together with the placeholders it references.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledExpression {
    /// The expression text.
    pub expression: String,
    /// Placeholders referenced by `expression`.
    #[serde(flatten)]
    pub placeholders: PlaceholderTable,
}

impl CompiledExpression {
    /// Pair an expression with its placeholders.
    #[must_use]
    pub fn new(expression: String, placeholders: PlaceholderTable) -> Self {
        Self {
            expression,
            placeholders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_prefix_tokens() {
        let mut table = PlaceholderTable::new();
        assert_eq!(table.name("age_2", "age"), "#age_2");
        assert_eq!(table.value("age_2", AttributeValue::from("65")), ":age_2");
        assert!(table.contains_name("age_2"));
        assert!(!table.contains_name("age"));
        assert_eq!(table.resolve_name("#age_2"), Some("age"));
        assert_eq!(
            table.resolve_value(":age_2"),
            Some(&AttributeValue::S("65".to_owned()))
        );
    }

    #[test]
    fn test_should_find_first_free_suffix() {
        let mut table = PlaceholderTable::new();
        table.value("to", AttributeValue::from("b"));
        table.value("to_2", AttributeValue::from("c"));
        assert!(table.contains_value("to"));
        assert!(!table.contains_name("to"));
        assert_eq!(first_free_token("to", |t| !table.contains_value(t)), "to_3");
        assert_eq!(first_free_token("from", |t| !table.contains_value(t)), "from");
    }

    #[test]
    fn test_should_overwrite_existing_token() {
        let mut table = PlaceholderTable::new();
        table.value("_Zero", AttributeValue::from(0_i64));
        table.value("_Zero", AttributeValue::from(0_i64));
        assert_eq!(table.value_count(), 1);
    }

    #[test]
    fn test_should_serialize_with_wire_field_names() {
        let mut table = PlaceholderTable::new();
        table.name("PK", "PK");
        table.value("gsipk", AttributeValue::from("USER#1"));
        let compiled = CompiledExpression::new("#PK = :gsipk".to_owned(), table);
        let json = serde_json::to_value(&compiled).unwrap();
        assert_eq!(json["expression"], "#PK = :gsipk");
        assert_eq!(json["expressionAttributeNames"]["#PK"], "PK");
        assert_eq!(json["expressionAttributeValues"][":gsipk"]["S"], "USER#1");
    }
}
