//! Filter predicates and the filter expression compiler.
//!
//! Filters run alongside a query, so [`compile_filter`] extends the
//! placeholder table of the key condition rather than starting a new one.
//! Predicates without a `position` are compiled first ("parent" pass), then
//! those with one ("child" pass). A child predicate whose field is already
//! aliased gets a suffixed alias (`#age_2`) so both conditions can coexist.
//! Value aliases already in the table are never replaced: a parent predicate
//! whose value alias is taken (say `:to` from a key range) gets `:to_2`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use ddbkit_model::AttributeValue;

use super::error::ExpressionError;
use super::placeholder::{CompiledExpression, PlaceholderTable, first_free_token};

/// Comparison applied by a [`FilterPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// `contains(#f, :f)`
    Keyword,
    /// `#f = :f`
    Equal,
    /// `#f <> :f`
    NotEqual,
    /// `#f = :f` with a boolean operand.
    Bool,
    /// `#f BETWEEN :fStart AND :fEnd`
    Date,
    /// Compiles to `#f <= :f`, the same clause as [`FilterType::LessThanEqual`].
    LessThan,
    /// `#f <= :f`
    LessThanEqual,
    /// `#f > :f`
    MoreThan,
    /// Compiles to `#f => :f`.
    MoreThanEqual,
}

/// Operand of a filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterKeyword {
    /// Operand of a `bool` predicate.
    Bool(bool),
    /// Operand of every other predicate; `start/end` for `date`.
    Text(String),
}

impl From<bool> for FilterKeyword {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FilterKeyword {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterKeyword {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Connector placed before a clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// `AND`
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    /// `OR`
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicalOp {
    /// The connector as written in expressions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One condition of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Attribute to test.
    pub field: String,
    /// Comparison to apply.
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Operand of the comparison.
    pub keyword: FilterKeyword,
    /// Connector to the previous clause; `AND` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<LogicalOp>,
    /// Marks the predicate for the child pass.
    ///
    /// Only presence matters: any non-null JSON value (`1`, `"1"`, `-1`)
    /// moves the predicate to the child pass, and the value itself is never
    /// used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
}

impl FilterPredicate {
    /// Predicate in the parent pass joined with `AND`.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        filter_type: FilterType,
        keyword: impl Into<FilterKeyword>,
    ) -> Self {
        Self {
            field: field.into(),
            filter_type,
            keyword: keyword.into(),
            condition: None,
            position: None,
        }
    }

    /// Join to the previous clause with `condition`.
    #[must_use]
    pub fn with_condition(mut self, condition: LogicalOp) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Move the predicate to the child pass.
    #[must_use]
    pub fn at_position(mut self, position: impl Into<Value>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// Compile `predicates` into a filter expression, extending `placeholders`.
///
/// Returns an empty expression and the unchanged table when there are no
/// predicates. On error the table is dropped with the partial output.
pub fn compile_filter(
    predicates: &[FilterPredicate],
    placeholders: PlaceholderTable,
) -> Result<CompiledExpression, ExpressionError> {
    let mut builder = FilterBuilder {
        placeholders,
        expression: String::new(),
        clauses: 0,
    };

    for predicate in predicates.iter().filter(|p| p.position.is_none()) {
        let token = builder.free_value_token(predicate);
        if token != predicate.field {
            warn!(
                field = %predicate.field,
                alias = %token,
                "Filter value alias already taken, using suffixed alias"
            );
        }
        builder.push(predicate, &predicate.field, &token)?;
    }

    for predicate in predicates.iter().filter(|p| p.position.is_some()) {
        let token = builder.unique_token(predicate);
        builder.push(predicate, &token, &token)?;
    }

    debug!(
        expression = %builder.expression,
        clauses = builder.clauses,
        "Compiled filter expression"
    );
    Ok(CompiledExpression::new(
        builder.expression,
        builder.placeholders,
    ))
}

#[derive(Debug)]
struct FilterBuilder {
    placeholders: PlaceholderTable,
    expression: String,
    clauses: usize,
}

impl FilterBuilder {
    /// Whether the value aliases `predicate` needs under `token` are unused.
    fn value_free(&self, predicate: &FilterPredicate, token: &str) -> bool {
        match predicate.filter_type {
            FilterType::Date => {
                !self.placeholders.contains_value(&format!("{token}Start"))
                    && !self.placeholders.contains_value(&format!("{token}End"))
            }
            _ => !self.placeholders.contains_value(token),
        }
    }

    fn free_value_token(&self, predicate: &FilterPredicate) -> String {
        first_free_token(&predicate.field, |token| self.value_free(predicate, token))
    }

    fn unique_token(&self, predicate: &FilterPredicate) -> String {
        first_free_token(&predicate.field, |token| {
            !self.placeholders.contains_name(token) && self.value_free(predicate, token)
        })
    }

    fn push(
        &mut self,
        predicate: &FilterPredicate,
        name_token: &str,
        value_token: &str,
    ) -> Result<(), ExpressionError> {
        let field = predicate.field.as_str();
        let name = format!("#{name_token}");
        let value = format!(":{value_token}");

        let clause = match predicate.filter_type {
            FilterType::Date => {
                let range = text_keyword(predicate)?;
                let (start, end) = split_range(range).ok_or_else(|| {
                    ExpressionError::InvalidDateRange {
                        field: field.to_owned(),
                        keyword: range.to_owned(),
                    }
                })?;
                let start = self.placeholders.value(
                    &format!("{value_token}Start"),
                    AttributeValue::S(start.to_owned()),
                );
                let end = self
                    .placeholders
                    .value(&format!("{value_token}End"), AttributeValue::S(end.to_owned()));
                format!("{name} BETWEEN {start} AND {end}")
            }
            FilterType::Bool => {
                let FilterKeyword::Bool(flag) = predicate.keyword else {
                    return Err(ExpressionError::KeywordType {
                        field: field.to_owned(),
                        expected: "boolean",
                    });
                };
                self.placeholders.value(value_token, AttributeValue::Bool(flag));
                format!("{name} = {value}")
            }
            other => {
                let keyword = text_keyword(predicate)?;
                self.placeholders
                    .value(value_token, AttributeValue::S(keyword.to_owned()));
                match other {
                    FilterType::Keyword => format!("contains({name}, {value})"),
                    FilterType::NotEqual => format!("{name} <> {value}"),
                    FilterType::LessThan | FilterType::LessThanEqual => {
                        format!("{name} <= {value}")
                    }
                    FilterType::MoreThan => format!("{name} > {value}"),
                    FilterType::MoreThanEqual => format!("{name} => {value}"),
                    FilterType::Equal | FilterType::Bool | FilterType::Date => {
                        format!("{name} = {value}")
                    }
                }
            }
        };

        self.placeholders.name(name_token, field);
        if self.clauses > 0 {
            let connector = predicate.condition.unwrap_or_default();
            self.expression.push(' ');
            self.expression.push_str(connector.as_str());
            self.expression.push(' ');
        }
        self.expression.push_str(&clause);
        self.clauses += 1;
        Ok(())
    }
}

fn text_keyword(predicate: &FilterPredicate) -> Result<&str, ExpressionError> {
    match &predicate.keyword {
        FilterKeyword::Text(text) => Ok(text),
        FilterKeyword::Bool(_) => Err(ExpressionError::KeywordType {
            field: predicate.field.clone(),
            expected: "string",
        }),
    }
}

fn split_range(range: &str) -> Option<(&str, &str)> {
    range.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(predicates: &[FilterPredicate]) -> CompiledExpression {
        compile_filter(predicates, PlaceholderTable::new()).unwrap()
    }

    #[test]
    fn test_should_suffix_duplicate_field_in_child_pass() {
        let compiled = compile(&[
            FilterPredicate::new("age", FilterType::MoreThan, "18"),
            FilterPredicate::new("age", FilterType::LessThan, "65").at_position(1),
        ]);
        assert_eq!(compiled.expression, "#age > :age AND #age_2 <= :age_2");
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_name("#age"), Some("age"));
        assert_eq!(table.resolve_name("#age_2"), Some("age"));
        assert_eq!(table.resolve_value(":age"), Some(&AttributeValue::from("18")));
        assert_eq!(table.resolve_value(":age_2"), Some(&AttributeValue::from("65")));
    }

    #[test]
    fn test_should_keep_suffixing_until_unique() {
        let compiled = compile(&[
            FilterPredicate::new("age", FilterType::MoreThan, "18"),
            FilterPredicate::new("age", FilterType::Equal, "30").at_position(1),
            FilterPredicate::new("age", FilterType::NotEqual, "40")
                .at_position(2)
                .with_condition(LogicalOp::Or),
        ]);
        assert_eq!(
            compiled.expression,
            "#age > :age AND #age_2 = :age_2 OR #age_3 <> :age_3"
        );
        assert_eq!(compiled.placeholders.resolve_name("#age_3"), Some("age"));
    }

    #[test]
    fn test_should_compile_children_after_parents() {
        let compiled = compile(&[
            FilterPredicate::new("status", FilterType::Equal, "open").at_position(1),
            FilterPredicate::new("title", FilterType::Keyword, "rust"),
        ]);
        assert_eq!(
            compiled.expression,
            "contains(#title, :title) AND #status = :status"
        );
    }

    #[test]
    fn test_should_emit_one_connector_between_clauses() {
        let compiled = compile(&[
            FilterPredicate::new("a", FilterType::Equal, "1").with_condition(LogicalOp::Or),
            FilterPredicate::new("b", FilterType::Equal, "2").with_condition(LogicalOp::Or),
            FilterPredicate::new("c", FilterType::Equal, "3"),
        ]);
        // The first clause never carries its connector.
        assert_eq!(compiled.expression, "#a = :a OR #b = :b AND #c = :c");
        let connectors = compiled
            .expression
            .split(' ')
            .filter(|word| *word == "AND" || *word == "OR")
            .count();
        assert_eq!(connectors, 2);
    }

    #[test]
    fn test_should_compile_date_range() {
        let compiled = compile(&[FilterPredicate::new(
            "created",
            FilterType::Date,
            "2024-01-01/2024-02-01",
        )]);
        assert_eq!(
            compiled.expression,
            "#created BETWEEN :createdStart AND :createdEnd"
        );
        let table = &compiled.placeholders;
        assert_eq!(
            table.resolve_value(":createdStart"),
            Some(&AttributeValue::from("2024-01-01"))
        );
        assert_eq!(
            table.resolve_value(":createdEnd"),
            Some(&AttributeValue::from("2024-02-01"))
        );
        assert!(table.resolve_value(":created").is_none());
    }

    #[test]
    fn test_should_compile_bool_operand() {
        let compiled = compile(&[FilterPredicate::new("active", FilterType::Bool, true)]);
        assert_eq!(compiled.expression, "#active = :active");
        assert_eq!(
            compiled.placeholders.resolve_value(":active"),
            Some(&AttributeValue::Bool(true))
        );
    }

    #[test]
    fn test_should_preserve_operator_quirks() {
        let cases = [
            (FilterType::LessThan, "#n <= :n"),
            (FilterType::LessThanEqual, "#n <= :n"),
            (FilterType::MoreThan, "#n > :n"),
            (FilterType::MoreThanEqual, "#n => :n"),
            (FilterType::NotEqual, "#n <> :n"),
            (FilterType::Keyword, "contains(#n, :n)"),
        ];
        for (filter_type, expected) in cases {
            let compiled = compile(&[FilterPredicate::new("n", filter_type, "1")]);
            assert_eq!(compiled.expression, expected);
        }
    }

    #[test]
    fn test_should_extend_key_condition_table() {
        let mut table = PlaceholderTable::new();
        table.name("PK", "PK");
        table.value("gsipk", AttributeValue::from("USER#1"));
        let compiled = compile_filter(
            &[FilterPredicate::new("name", FilterType::Keyword, "an")],
            table,
        )
        .unwrap();
        assert_eq!(compiled.placeholders.name_count(), 2);
        assert_eq!(compiled.placeholders.value_count(), 2);
        assert_eq!(compiled.placeholders.resolve_name("#PK"), Some("PK"));
    }

    #[test]
    fn test_should_return_empty_expression_without_predicates() {
        let compiled = compile(&[]);
        assert!(compiled.expression.is_empty());
        assert!(compiled.placeholders.is_empty());
    }

    #[test]
    fn test_should_reject_date_without_separator() {
        let err = compile_filter(
            &[FilterPredicate::new("created", FilterType::Date, "2024-01-01")],
            PlaceholderTable::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidDateRange {
                field: "created".to_owned(),
                keyword: "2024-01-01".to_owned(),
            }
        );
    }

    #[test]
    fn test_should_reject_mismatched_keyword_kind() {
        let err = compile_filter(
            &[FilterPredicate::new("active", FilterType::Bool, "yes")],
            PlaceholderTable::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ExpressionError::KeywordType {
                field: "active".to_owned(),
                expected: "boolean",
            }
        );

        let err = compile_filter(
            &[FilterPredicate::new("name", FilterType::Equal, false)],
            PlaceholderTable::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::KeywordType {
                expected: "string",
                ..
            }
        ));
    }

    #[test]
    fn test_should_decode_predicates_from_json() {
        let predicates: Vec<FilterPredicate> = serde_json::from_value(serde_json::json!([
            {"field": "age", "type": "more_than", "keyword": "18"},
            {"field": "age", "type": "less_than", "keyword": "65", "position": 1, "condition": "OR"},
            {"field": "active", "type": "bool", "keyword": true},
        ]))
        .unwrap();
        assert_eq!(predicates[1].condition, Some(LogicalOp::Or));
        assert_eq!(predicates[1].position, Some(serde_json::json!(1)));
        assert_eq!(predicates[2].keyword, FilterKeyword::Bool(true));

        let compiled = compile(&predicates);
        assert_eq!(
            compiled.expression,
            "#age > :age AND #active = :active OR #age_2 <= :age_2"
        );
    }

    #[test]
    fn test_should_treat_any_position_value_as_child_marker() {
        let predicates: Vec<FilterPredicate> = serde_json::from_value(serde_json::json!([
            {"field": "b", "type": "equal", "keyword": "2", "position": "1"},
            {"field": "c", "type": "equal", "keyword": "3", "position": -1},
            {"field": "a", "type": "equal", "keyword": "1", "position": null},
        ]))
        .unwrap();
        assert!(predicates[2].position.is_none());

        let compiled = compile(&predicates);
        assert_eq!(compiled.expression, "#a = :a AND #b = :b AND #c = :c");
    }

    #[test]
    fn test_should_suffix_second_child_duplicate() {
        let compiled = compile(&[
            FilterPredicate::new("age", FilterType::MoreThan, "18").at_position(1),
            FilterPredicate::new("age", FilterType::LessThan, "65").at_position(2),
        ]);
        assert_eq!(compiled.expression, "#age > :age AND #age_2 <= :age_2");
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_name("#age"), Some("age"));
        assert_eq!(table.resolve_name("#age_2"), Some("age"));
        assert_eq!(table.resolve_value(":age"), Some(&AttributeValue::from("18")));
        assert_eq!(table.resolve_value(":age_2"), Some(&AttributeValue::from("65")));
    }

    #[test]
    fn test_should_keep_both_values_of_parent_duplicates() {
        let compiled = compile(&[
            FilterPredicate::new("age", FilterType::MoreThan, "18"),
            FilterPredicate::new("age", FilterType::LessThan, "65"),
        ]);
        assert_eq!(compiled.expression, "#age > :age AND #age <= :age_2");
        let table = &compiled.placeholders;
        assert_eq!(table.name_count(), 1);
        assert_eq!(table.resolve_value(":age"), Some(&AttributeValue::from("18")));
        assert_eq!(table.resolve_value(":age_2"), Some(&AttributeValue::from("65")));
    }

    #[test]
    fn test_should_not_replace_existing_value_alias() {
        let mut table = PlaceholderTable::new();
        table.value("to", AttributeValue::from("2024-12-31"));
        table.value("fromStart", AttributeValue::from("x"));
        let compiled = compile_filter(
            &[
                FilterPredicate::new("to", FilterType::Equal, "bob"),
                FilterPredicate::new("from", FilterType::Date, "a/b"),
            ],
            table,
        )
        .unwrap();
        assert_eq!(
            compiled.expression,
            "#to = :to_2 AND #from BETWEEN :from_2Start AND :from_2End"
        );
        let table = &compiled.placeholders;
        assert_eq!(
            table.resolve_value(":to"),
            Some(&AttributeValue::from("2024-12-31"))
        );
        assert_eq!(table.resolve_value(":to_2"), Some(&AttributeValue::from("bob")));
        assert_eq!(table.resolve_value(":fromStart"), Some(&AttributeValue::from("x")));
    }

    #[test]
    fn test_should_split_date_range_on_first_separator() {
        let compiled = compile(&[FilterPredicate::new("d", FilterType::Date, "a/b/c")]);
        let table = &compiled.placeholders;
        assert_eq!(table.resolve_value(":dStart"), Some(&AttributeValue::from("a")));
        assert_eq!(table.resolve_value(":dEnd"), Some(&AttributeValue::from("b/c")));
    }
}
