//! Key descriptors and the key-condition compiler.
//!
//! A [`Key`] addresses either the table's primary key (`PK`/`SK`) or one of
//! the five secondary indexes, whose key attributes carry the index name as a
//! prefix (`GSI1PK`/`GSI1SK`). The compiled condition always uses the value
//! placeholders `:gsipk` and `:gsisk`, or `:from`/`:to` for ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ddbkit_model::{AttributeValue, Item};

use super::error::ExpressionError;
use super::placeholder::{CompiledExpression, PlaceholderTable};

/// Partition key attribute of the primary key.
pub const PARTITION_KEY: &str = "PK";
/// Sort key attribute of the primary key.
pub const SORT_KEY: &str = "SK";

const PARTITION_VALUE: &str = "gsipk";
const SORT_VALUE: &str = "gsisk";
const RANGE_FROM: &str = "from";
const RANGE_TO: &str = "to";

// ---------------------------------------------------------------------------
// Secondary indexes
// ---------------------------------------------------------------------------

/// One of the five secondary index slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SecondaryIndex {
    /// `GSI1`
    #[serde(rename = "GSI1")]
    Gsi1,
    /// `GSI2`
    #[serde(rename = "GSI2")]
    Gsi2,
    /// `GSI3`
    #[serde(rename = "GSI3")]
    Gsi3,
    /// `GSI4`
    #[serde(rename = "GSI4")]
    Gsi4,
    /// `GSI5`
    #[serde(rename = "GSI5")]
    Gsi5,
}

impl SecondaryIndex {
    /// The index name as the store knows it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gsi1 => "GSI1",
            Self::Gsi2 => "GSI2",
            Self::Gsi3 => "GSI3",
            Self::Gsi4 => "GSI4",
            Self::Gsi5 => "GSI5",
        }
    }
}

impl fmt::Display for SecondaryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecondaryIndex {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GSI1" => Ok(Self::Gsi1),
            "GSI2" => Ok(Self::Gsi2),
            "GSI3" => Ok(Self::Gsi3),
            "GSI4" => Ok(Self::Gsi4),
            "GSI5" => Ok(Self::Gsi5),
            other => Err(ExpressionError::UnsupportedIndex {
                index: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for SecondaryIndex {
    type Error = ExpressionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Sort key conditions
// ---------------------------------------------------------------------------

/// Sort key comparison requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum KeyCondition {
    /// `SK = :gsisk`
    Equal,
    /// `SK > :gsisk`
    MoreThan,
    /// `SK < :gsisk`
    LessThan,
    /// `SK >= :gsisk`
    MoreThanEqual,
    /// `SK <= :gsisk`
    LessThanEqual,
    /// `begins_with(SK, :gsisk)`
    Begins,
    /// `SK BETWEEN :from AND :to`
    Between,
}

impl KeyCondition {
    /// The descriptor name of the condition.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::MoreThan => "more_than",
            Self::LessThan => "less_than",
            Self::MoreThanEqual => "more_than_equal",
            Self::LessThanEqual => "less_than_equal",
            Self::Begins => "begins",
            Self::Between => "between",
        }
    }

    /// Condition implied by the shape of a sort key value without a range.
    #[must_use]
    pub fn infer(sort_key: &str) -> Self {
        if sort_key.ends_with('#') {
            Self::Begins
        } else {
            Self::Equal
        }
    }
}

impl fmt::Display for KeyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyCondition {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "more_than" => Ok(Self::MoreThan),
            "less_than" => Ok(Self::LessThan),
            "more_than_equal" => Ok(Self::MoreThanEqual),
            "less_than_equal" => Ok(Self::LessThanEqual),
            "begins" => Ok(Self::Begins),
            "between" => Ok(Self::Between),
            other => Err(ExpressionError::UnsupportedCondition {
                condition: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for KeyCondition {
    type Error = ExpressionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Addressing descriptor for get, query, update and delete calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Partition key value.
    #[serde(rename = "PK", default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<String>,
    /// Sort key value; `from/to` encodes a range.
    #[serde(rename = "SK", default, skip_serializing_if = "Option::is_none")]
    pub sk: Option<String>,
    /// Secondary index to address; `None` for the primary key.
    #[serde(rename = "IndexName", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<SecondaryIndex>,
    /// Explicit sort key comparison; inferred from the sort key when `None`.
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<KeyCondition>,
}

impl Key {
    /// Key on the primary index with only a partition key value.
    #[must_use]
    pub fn new(pk: impl Into<String>) -> Self {
        Self {
            pk: Some(pk.into()),
            ..Self::default()
        }
    }

    /// Set the sort key value.
    #[must_use]
    pub fn with_sort_key(mut self, sk: impl Into<String>) -> Self {
        self.sk = Some(sk.into());
        self
    }

    /// Address a secondary index instead of the primary key.
    #[must_use]
    pub fn on_index(mut self, index: SecondaryIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Set an explicit sort key comparison.
    #[must_use]
    pub fn with_condition(mut self, condition: KeyCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Partition key attribute name (`PK` or `<Index>PK`).
    #[must_use]
    pub fn partition_attribute(&self) -> String {
        format!("{}{PARTITION_KEY}", self.attribute_prefix())
    }

    /// Sort key attribute name (`SK` or `<Index>SK`).
    #[must_use]
    pub fn sort_attribute(&self) -> String {
        format!("{}{SORT_KEY}", self.attribute_prefix())
    }

    fn attribute_prefix(&self) -> &'static str {
        self.index.as_ref().map_or("", SecondaryIndex::as_str)
    }

    /// The primary key map `{PK, SK}` used by get, update and delete.
    ///
    /// The index and condition are ignored; items are always written through
    /// their primary key.
    pub fn primary_key_item(&self) -> Result<Item, ExpressionError> {
        let pk = self
            .pk
            .as_ref()
            .ok_or(ExpressionError::MissingPartitionKey)?;
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_owned(), AttributeValue::S(pk.clone()));
        if let Some(sk) = &self.sk {
            item.insert(SORT_KEY.to_owned(), AttributeValue::S(sk.clone()));
        }
        Ok(item)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PK={}", self.pk.as_deref().unwrap_or(""))?;
        if let Some(sk) = &self.sk {
            write!(f, ", SK={sk}")?;
        }
        if let Some(index) = &self.index {
            write!(f, ", IndexName={index}")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, ", Condition={condition}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compile a key condition for a query on `key`'s index.
///
/// A sort key containing `/` always compiles to `BETWEEN :from AND :to`.
/// Otherwise an explicit condition wins over the shape of the sort key; a
/// `between` condition without a range falls back to the inferred one.
pub fn compile_key_condition(key: &Key) -> Result<CompiledExpression, ExpressionError> {
    let pk = key
        .pk
        .as_deref()
        .ok_or(ExpressionError::MissingPartitionKey)?;

    let mut placeholders = PlaceholderTable::new();
    let partition = key.partition_attribute();
    let pk_name = placeholders.name(&partition, &partition);
    let pk_value = placeholders.value(PARTITION_VALUE, AttributeValue::S(pk.to_owned()));
    let mut expression = format!("{pk_name} = {pk_value}");

    match (key.sk.as_deref(), key.condition) {
        (None, Some(condition)) => return Err(ExpressionError::MissingSortKey { condition }),
        (None, None) => {}
        (Some(sk), condition) => {
            let sort = key.sort_attribute();
            let sk_name = placeholders.name(&sort, &sort);
            let clause = if let Some((from, to)) = sk.split_once('/') {
                let from = placeholders.value(RANGE_FROM, AttributeValue::S(from.to_owned()));
                let to = placeholders.value(RANGE_TO, AttributeValue::S(to.to_owned()));
                format!("{sk_name} BETWEEN {from} AND {to}")
            } else {
                let sk_value = placeholders.value(SORT_VALUE, AttributeValue::S(sk.to_owned()));
                let condition = match condition {
                    Some(KeyCondition::Between) | None => KeyCondition::infer(sk),
                    Some(explicit) => explicit,
                };
                sort_clause(condition, &sk_name, &sk_value)
            };
            expression.push_str(" and ");
            expression.push_str(&clause);
        }
    }

    debug!(key = %key, expression = %expression, "Compiled key condition");
    Ok(CompiledExpression::new(expression, placeholders))
}

fn sort_clause(condition: KeyCondition, name: &str, value: &str) -> String {
    let op = match condition {
        KeyCondition::Begins => return format!("begins_with({name}, {value})"),
        KeyCondition::Equal | KeyCondition::Between => "=",
        KeyCondition::MoreThan => ">",
        KeyCondition::LessThan => "<",
        KeyCondition::MoreThanEqual => ">=",
        KeyCondition::LessThanEqual => "<=",
    };
    format!("{name} {op} {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_key(index: SecondaryIndex, pk: &str, sk: &str) -> Key {
        Key::new(pk).with_sort_key(sk).on_index(index)
    }

    #[test]
    fn test_should_infer_prefix_match_from_trailing_hash() {
        let compiled = compile_key_condition(&index_key(SecondaryIndex::Gsi2, "ORG#1", "A#"))
            .unwrap();
        assert_eq!(
            compiled.expression,
            "#GSI2PK = :gsipk and begins_with(#GSI2SK, :gsisk)"
        );
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_name("#GSI2PK"), Some("GSI2PK"));
        assert_eq!(table.resolve_name("#GSI2SK"), Some("GSI2SK"));
        assert_eq!(table.resolve_value(":gsipk"), Some(&AttributeValue::from("ORG#1")));
        assert_eq!(table.resolve_value(":gsisk"), Some(&AttributeValue::from("A#")));
    }

    #[test]
    fn test_should_infer_exact_match() {
        let compiled =
            compile_key_condition(&index_key(SecondaryIndex::Gsi1, "ORG#1", "USER#7")).unwrap();
        assert_eq!(compiled.expression, "#GSI1PK = :gsipk and #GSI1SK = :gsisk");
    }

    #[test]
    fn test_should_compile_range_without_condition() {
        let key = index_key(SecondaryIndex::Gsi3, "LOG", "2024-01-01/2024-12-31");
        let compiled = compile_key_condition(&key).unwrap();
        assert_eq!(
            compiled.expression,
            "#GSI3PK = :gsipk and #GSI3SK BETWEEN :from AND :to"
        );
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_value(":from"), Some(&AttributeValue::from("2024-01-01")));
        assert_eq!(table.resolve_value(":to"), Some(&AttributeValue::from("2024-12-31")));
        assert!(table.resolve_value(":gsisk").is_none());
    }

    #[test]
    fn test_should_prefer_range_over_explicit_condition() {
        let key =
            index_key(SecondaryIndex::Gsi3, "LOG", "a/b").with_condition(KeyCondition::MoreThan);
        let compiled = compile_key_condition(&key).unwrap();
        assert!(compiled.expression.ends_with("#GSI3SK BETWEEN :from AND :to"));
    }

    #[test]
    fn test_should_split_range_on_first_separator() {
        let key = index_key(SecondaryIndex::Gsi1, "LOG", "a/b/c");
        let compiled = compile_key_condition(&key).unwrap();
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_value(":from"), Some(&AttributeValue::from("a")));
        assert_eq!(table.resolve_value(":to"), Some(&AttributeValue::from("b/c")));
    }

    #[test]
    fn test_should_map_explicit_conditions_to_operators() {
        let cases = [
            (KeyCondition::Equal, "#GSI4SK = :gsisk"),
            (KeyCondition::MoreThan, "#GSI4SK > :gsisk"),
            (KeyCondition::LessThan, "#GSI4SK < :gsisk"),
            (KeyCondition::MoreThanEqual, "#GSI4SK >= :gsisk"),
            (KeyCondition::LessThanEqual, "#GSI4SK <= :gsisk"),
            (KeyCondition::Begins, "begins_with(#GSI4SK, :gsisk)"),
        ];
        for (condition, clause) in cases {
            // A trailing `#` would infer begins_with; the explicit condition must win.
            let key = index_key(SecondaryIndex::Gsi4, "P", "S#").with_condition(condition);
            let compiled = compile_key_condition(&key).unwrap();
            assert_eq!(compiled.expression, format!("#GSI4PK = :gsipk and {clause}"));
        }
    }

    #[test]
    fn test_should_fall_back_to_inference_for_between_without_range() {
        let key = index_key(SecondaryIndex::Gsi1, "P", "S#").with_condition(KeyCondition::Between);
        let compiled = compile_key_condition(&key).unwrap();
        assert_eq!(
            compiled.expression,
            "#GSI1PK = :gsipk and begins_with(#GSI1SK, :gsisk)"
        );
    }

    #[test]
    fn test_should_compile_partition_only_on_primary_key() {
        let compiled = compile_key_condition(&Key::new("USER#1")).unwrap();
        assert_eq!(compiled.expression, "#PK = :gsipk");
        assert_eq!(compiled.placeholders.name_count(), 1);
        assert_eq!(compiled.placeholders.value_count(), 1);
    }

    #[test]
    fn test_should_reject_missing_partition_key() {
        let key = Key {
            sk: Some("A".to_owned()),
            ..Key::default()
        };
        assert_eq!(
            compile_key_condition(&key).unwrap_err(),
            ExpressionError::MissingPartitionKey
        );
    }

    #[test]
    fn test_should_reject_condition_without_sort_key() {
        let key = Key::new("P").with_condition(KeyCondition::Begins);
        assert_eq!(
            compile_key_condition(&key).unwrap_err(),
            ExpressionError::MissingSortKey {
                condition: KeyCondition::Begins
            }
        );
    }

    #[test]
    fn test_should_reject_unknown_condition_name() {
        let err = "greater".parse::<KeyCondition>().unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnsupportedCondition {
                condition: "greater".to_owned()
            }
        );

        let result: Result<Key, _> =
            serde_json::from_str(r#"{"PK":"P","SK":"S","Condition":"greater"}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("unsupported key condition (greater)"));
    }

    #[test]
    fn test_should_reject_unknown_index_name() {
        let err = "GSI6".parse::<SecondaryIndex>().unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnsupportedIndex {
                index: "GSI6".to_owned()
            }
        );
    }

    #[test]
    fn test_should_decode_key_from_json() {
        let key: Key = serde_json::from_str(
            r#"{"PK":"ORG#1","SK":"USER#","IndexName":"GSI5","Condition":"begins"}"#,
        )
        .unwrap();
        assert_eq!(key.index, Some(SecondaryIndex::Gsi5));
        assert_eq!(key.condition, Some(KeyCondition::Begins));
        assert_eq!(key.partition_attribute(), "GSI5PK");

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(
            json,
            r#"{"PK":"ORG#1","SK":"USER#","IndexName":"GSI5","Condition":"begins"}"#
        );
    }

    #[test]
    fn test_should_build_primary_key_item() {
        let item = Key::new("USER#1")
            .with_sort_key("PROFILE")
            .on_index(SecondaryIndex::Gsi1)
            .primary_key_item()
            .unwrap();
        assert_eq!(item.len(), 2);
        assert_eq!(item["PK"], AttributeValue::from("USER#1"));
        assert_eq!(item["SK"], AttributeValue::from("PROFILE"));
    }
}
