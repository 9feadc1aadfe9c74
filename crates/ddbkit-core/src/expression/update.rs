//! Update descriptors and the `SET` expression compiler.
//!
//! An [`UpdateSpec`] is an ordered list of fields with their new values. A
//! value is either a plain assignment, a nested spec for a map attribute, or
//! a function applied to the current attribute value. Only the first level of
//! nesting is compiled into path expressions (`#parent.#child`); deeper specs
//! are assigned as whole `M` values.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use ddbkit_model::AttributeValue;
use ddbkit_model::marshal::json_to_value;

use super::error::ExpressionError;
use super::placeholder::{CompiledExpression, PlaceholderTable, first_free_token};

/// Attribute stamped with the compile time on every update.
pub const UPDATED_TIMESTAMP: &str = "UpdatedTimestamp";

const FUNCTION_TAG_PREFIX: &str = "Fn:";
const ZERO_TOKEN: &str = "_Zero";

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Function applied to the current value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateFunction {
    /// Append the operand list to the attribute list.
    ListAppend,
    /// Add the operand, treating a missing attribute as zero.
    Increase,
    /// Subtract the operand, treating a missing attribute as zero.
    Decrease,
}

impl UpdateFunction {
    /// The function name used in tagged fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListAppend => "list_append",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }

    fn render(self, path: &str, operand: &str) -> String {
        match self {
            Self::ListAppend => format!("list_append({path}, {operand})"),
            Self::Increase => format!("if_not_exists({path}, :{ZERO_TOKEN}) + {operand}"),
            Self::Decrease => format!("if_not_exists({path}, :{ZERO_TOKEN}) - {operand}"),
        }
    }

    fn needs_zero(self) -> bool {
        matches!(self, Self::Increase | Self::Decrease)
    }
}

impl fmt::Display for UpdateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateFunction {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list_append" => Ok(Self::ListAppend),
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            other => Err(ExpressionError::UnsupportedFunction {
                tag: other.to_owned(),
            }),
        }
    }
}

/// Split a field tagged `Fn:<function>:<field>`.
///
/// Returns `None` for untagged fields.
pub fn parse_function_tag(tag: &str) -> Result<Option<(UpdateFunction, &str)>, ExpressionError> {
    if !tag.starts_with(FUNCTION_TAG_PREFIX) {
        return Ok(None);
    }
    let segments: Vec<&str> = tag.split(':').collect();
    let [_, function, field] = segments.as_slice() else {
        return Err(ExpressionError::UnsupportedFunctionFormat {
            tag: tag.to_owned(),
        });
    };
    let function = function
        .parse()
        .map_err(|_| ExpressionError::UnsupportedFunction {
            tag: tag.to_owned(),
        })?;
    Ok(Some((function, *field)))
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// New value for one field of an [`UpdateSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// Plain assignment.
    Leaf(AttributeValue),
    /// Assignment to the fields of a map attribute.
    Nested(UpdateSpec),
    /// Function applied to the current value with the given operand.
    Function(UpdateFunction, AttributeValue),
}

impl UpdateValue {
    /// Render as a single attribute value.
    ///
    /// Functions contribute their operand only.
    #[must_use]
    pub fn into_attribute_value(self) -> AttributeValue {
        match self {
            Self::Leaf(value) | Self::Function(_, value) => value,
            Self::Nested(spec) => spec.into_attribute_value(),
        }
    }
}

impl From<AttributeValue> for UpdateValue {
    fn from(value: AttributeValue) -> Self {
        Self::Leaf(value)
    }
}

impl From<UpdateSpec> for UpdateValue {
    fn from(spec: UpdateSpec) -> Self {
        Self::Nested(spec)
    }
}

/// Ordered field updates.
///
/// Inserting a field that is already present replaces its value in place, so
/// each field appears once. JSON input is read through
/// [`UpdateSpec::from_json`], which accepts `Fn:<function>:<field>` tags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct UpdateSpec {
    entries: Vec<(String, UpdateValue)>,
}

impl UpdateSpec {
    /// Create an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `field`.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(field, UpdateValue::Leaf(value.into()));
        self
    }

    /// Update the fields of the map attribute `field`.
    #[must_use]
    pub fn nested(mut self, field: impl Into<String>, spec: UpdateSpec) -> Self {
        self.insert(field, UpdateValue::Nested(spec));
        self
    }

    /// Apply `function` to `field` with `operand`.
    #[must_use]
    pub fn apply(
        mut self,
        field: impl Into<String>,
        function: UpdateFunction,
        operand: impl Into<AttributeValue>,
    ) -> Self {
        self.insert(field, UpdateValue::Function(function, operand.into()));
        self
    }

    /// Insert or replace the value of `field`.
    ///
    /// Returns the previous value when the field was already present.
    pub fn insert(&mut self, field: impl Into<String>, value: UpdateValue) -> Option<UpdateValue> {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((field, value));
                None
            }
        }
    }

    /// Insert a value under a possibly tagged field name.
    ///
    /// `Fn:<function>:<field>` turns the value into the operand of that
    /// function. A nested spec cannot be a function operand and is rendered as
    /// a map value in that case.
    pub fn insert_tagged(&mut self, tag: &str, value: UpdateValue) -> Result<(), ExpressionError> {
        match parse_function_tag(tag)? {
            Some((function, field)) => {
                let operand = value.into_attribute_value();
                self.insert(field, UpdateValue::Function(function, operand));
            }
            None => {
                self.insert(tag, value);
            }
        }
        Ok(())
    }

    /// Remove `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<UpdateValue> {
        let position = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(position).1)
    }

    /// Value of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&UpdateValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Iterate over entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &UpdateValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a spec from a JSON object.
    ///
    /// Untagged object values become nested specs, other values plain
    /// assignments. Tags are validated here, so compiling never fails.
    pub fn from_json(map: Map<String, Value>) -> Result<Self, ExpressionError> {
        let mut spec = Self::new();
        for (key, value) in map {
            let tagged = parse_function_tag(&key)?.is_some();
            let value = match value {
                Value::Object(child) if !tagged => UpdateValue::Nested(Self::from_json(child)?),
                other => UpdateValue::Leaf(json_to_value(other)),
            };
            spec.insert_tagged(&key, value)?;
        }
        Ok(spec)
    }

    /// Render the whole spec as an `M` attribute value.
    #[must_use]
    pub fn into_attribute_value(self) -> AttributeValue {
        let map: HashMap<String, AttributeValue> = self
            .entries
            .into_iter()
            .map(|(name, value)| (name, value.into_attribute_value()))
            .collect();
        AttributeValue::M(map)
    }
}

impl TryFrom<Map<String, Value>> for UpdateSpec {
    type Error = ExpressionError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_json(map)
    }
}

impl Serialize for UpdateSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            match value {
                UpdateValue::Leaf(v) => map.serialize_entry(name, v)?,
                UpdateValue::Nested(spec) => map.serialize_entry(name, spec)?,
                UpdateValue::Function(function, operand) => map.serialize_entry(
                    &format!("{FUNCTION_TAG_PREFIX}{function}:{name}"),
                    operand,
                )?,
            }
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compile `spec` into a `SET` expression stamped with the current time.
#[must_use]
pub fn compile_update(spec: UpdateSpec) -> CompiledExpression {
    compile_update_at(spec, Utc::now())
}

/// Compile `spec` into a `SET` expression stamped with `now`.
///
/// `UpdatedTimestamp` is always the last assignment and replaces any value
/// the caller supplied for it.
#[must_use]
pub fn compile_update_at(mut spec: UpdateSpec, now: DateTime<Utc>) -> CompiledExpression {
    spec.remove(UPDATED_TIMESTAMP);
    spec.insert(
        UPDATED_TIMESTAMP,
        UpdateValue::Leaf(AttributeValue::S(
            now.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )),
    );

    let builder = UpdateBuilder::default().walk(None, spec);
    let expression = format!("SET {}", builder.clauses.join(", "));
    debug!(expression = %expression, "Compiled update expression");
    CompiledExpression::new(expression, builder.placeholders)
}

#[derive(Debug, Default)]
struct UpdateBuilder {
    placeholders: PlaceholderTable,
    clauses: Vec<String>,
}

impl UpdateBuilder {
    fn walk(mut self, parent: Option<&str>, spec: UpdateSpec) -> Self {
        for (field, value) in spec.entries {
            self.placeholders.name(&field, &field);
            let (path, token) = match parent {
                None => (format!("#{field}"), field.clone()),
                Some(parent) => (format!("#{parent}.#{field}"), format!("{parent}_{field}")),
            };

            match value {
                UpdateValue::Nested(child) if parent.is_none() => {
                    self = self.walk(Some(&field), child);
                }
                UpdateValue::Nested(child) => {
                    let token = self.free_value_token(&token);
                    let alias = self.placeholders.value(&token, child.into_attribute_value());
                    self.clauses.push(format!("{path} = {alias}"));
                }
                UpdateValue::Leaf(value) => {
                    let token = self.free_value_token(&token);
                    let alias = self.placeholders.value(&token, value);
                    self.clauses.push(format!("{path} = {alias}"));
                }
                UpdateValue::Function(function, operand) => {
                    if function.needs_zero() {
                        self.placeholders
                            .value(ZERO_TOKEN, AttributeValue::N("0".to_owned()));
                    }
                    let token = self.free_value_token(&token);
                    let alias = self.placeholders.value(&token, operand);
                    let rendered = function.render(&path, &alias);
                    self.clauses.push(format!("{path} = {rendered}"));
                }
            }
        }
        self
    }

    /// `token`, suffixed when a path-qualified alias already took it.
    ///
    /// `_Zero` is reserved for counters even before the first one is seen.
    fn free_value_token(&self, token: &str) -> String {
        let free = first_free_token(token, |t| {
            t != ZERO_TOKEN && !self.placeholders.contains_value(t)
        });
        if free != token {
            debug!(token, alias = %free, "Update value alias taken, using suffixed alias");
        }
        free
    }
}
