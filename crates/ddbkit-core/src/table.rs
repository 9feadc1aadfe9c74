//! Repository facade over a [`StoreGateway`].
//!
//! [`Table`] turns descriptors into fully compiled store requests, issues
//! them through the gateway, and maps empty results to
//! [`TableError::NotFound`]. Items are always written and deleted through
//! their primary key; secondary indexes are only read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ddbkit_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, UpdateItemInput,
};
use ddbkit_model::input::ReturnValue;
use ddbkit_model::{Item, StoreOperation, from_item, to_item};

use crate::config::TableConfig;
use crate::error::TableError;
use crate::expression::{
    FilterPredicate, Key, UpdateSpec, compile_key_condition, compile_query, compile_update,
};
use crate::gateway::StoreGateway;
use crate::pagination::PageCursor;

// ---------------------------------------------------------------------------
// Query options
// ---------------------------------------------------------------------------

/// Page size and resume position of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Maximum items evaluated per page; 0 means no limit.
    #[serde(default)]
    pub page_size: u32,
    /// Cursor returned with the previous page.
    #[serde(default, alias = "lastEvaluatedKey", skip_serializing_if = "Option::is_none")]
    pub cursor: Option<PageCursor>,
}

/// Optional parts of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Post-fetch filter predicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterPredicate>,
    /// Attributes to return; all when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projection: Vec<String>,
    /// Sort key order; the table default when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,
    /// Pagination; the table default page size when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRequest>,
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    /// Items of this page.
    pub items: Vec<Item>,
    /// Cursor for the next page, `None` on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<PageCursor>,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Single-table repository.
#[derive(Debug)]
pub struct Table<G> {
    gateway: G,
    config: TableConfig,
}

impl<G: StoreGateway> Table<G> {
    /// Create a table facade over `gateway`.
    #[must_use]
    pub fn new(gateway: G, config: TableConfig) -> Self {
        Self { gateway, config }
    }

    /// The table configuration.
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Fetch one item.
    ///
    /// Keys without an index are read by primary key, others through
    /// [`Table::get_item_via_index`].
    pub async fn get_item(&self, key: &Key) -> Result<Item, TableError> {
        if key.index.is_some() {
            return self.get_item_via_index(key).await;
        }

        let input = GetItemInput {
            table_name: self.config.table_name.clone(),
            key: key.primary_key_item()?,
            consistent_read: None,
        };
        self.log_call(StoreOperation::GetItem);
        let output = self.gateway.get_item(input).await?;
        output.item.ok_or_else(|| not_found(key))
    }

    /// Fetch the first item matching `key` on its index.
    pub async fn get_item_via_index(&self, key: &Key) -> Result<Item, TableError> {
        let compiled = compile_key_condition(key)?;
        let (names, values) = compiled.placeholders.into_parts();
        let input = QueryInput {
            table_name: self.config.table_name.clone(),
            index_name: key.index.map(|index| index.as_str().to_owned()),
            key_condition_expression: compiled.expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            limit: Some(1),
            ..QueryInput::default()
        };
        self.log_call(StoreOperation::Query);
        let output = self.gateway.query(input).await?;
        output
            .items
            .into_iter()
            .next()
            .ok_or_else(|| not_found(key))
    }

    /// Fetch one item and unmarshal it into a record.
    pub async fn get_record<T: DeserializeOwned>(&self, key: &Key) -> Result<T, TableError> {
        let item = self.get_item(key).await?;
        Ok(from_item(&item)?)
    }

    /// Query one page of items.
    ///
    /// Fails with [`TableError::NotFound`] only when the page is empty and
    /// the store reports no further pages.
    pub async fn query(&self, key: &Key, options: &QueryOptions) -> Result<QueryPage, TableError> {
        let compiled = compile_query(key, &options.filter, &options.projection)?;
        let (names, values) = compiled.placeholders.into_parts();

        let page = options.page.as_ref();
        let exclusive_start_key = match page.and_then(|p| p.cursor.as_ref()) {
            Some(cursor) => cursor.to_exclusive_start_key()?,
            None => Item::new(),
        };

        let input = QueryInput {
            table_name: self.config.table_name.clone(),
            index_name: key.index.map(|index| index.as_str().to_owned()),
            key_condition_expression: compiled.key_condition,
            filter_expression: compiled.filter,
            projection_expression: compiled.projection,
            expression_attribute_names: names,
            expression_attribute_values: values,
            scan_index_forward: Some(
                options
                    .scan_index_forward
                    .unwrap_or(self.config.scan_index_forward),
            ),
            limit: self.page_limit(page),
            exclusive_start_key,
        };
        self.log_call(StoreOperation::Query);
        let output = self.gateway.query(input).await?;

        let last_key = output.last_evaluated_key.unwrap_or_default();
        if output.items.is_empty() && last_key.is_empty() {
            return Err(not_found(key));
        }
        Ok(QueryPage {
            items: output.items,
            cursor: PageCursor::from_last_evaluated_key(&last_key)?,
        })
    }

    /// Marshal `record` and write it.
    pub async fn put_item<T>(&self, record: &T) -> Result<(), TableError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let item = to_item(record)?;
        self.put_raw_item(item).await
    }

    /// Write an already typed item.
    pub async fn put_raw_item(&self, item: Item) -> Result<(), TableError> {
        let input = PutItemInput {
            table_name: self.config.table_name.clone(),
            item,
        };
        self.log_call(StoreOperation::PutItem);
        self.gateway.put_item(input).await?;
        Ok(())
    }

    /// Delete the item with `key`'s primary key.
    pub async fn delete_item(&self, key: &Key) -> Result<(), TableError> {
        let input = DeleteItemInput {
            table_name: self.config.table_name.clone(),
            key: key.primary_key_item()?,
        };
        self.log_call(StoreOperation::DeleteItem);
        self.gateway.delete_item(input).await?;
        Ok(())
    }

    /// Apply `spec` to the item with `key`'s primary key.
    ///
    /// Returns the updated attributes.
    pub async fn update_item(&self, key: &Key, spec: UpdateSpec) -> Result<Item, TableError> {
        let primary_key = key.primary_key_item()?;
        let compiled = compile_update(spec);
        let (names, values) = compiled.placeholders.into_parts();
        let input = UpdateItemInput {
            table_name: self.config.table_name.clone(),
            key: primary_key,
            update_expression: compiled.expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            return_values: Some(ReturnValue::UpdatedNew),
        };
        self.log_call(StoreOperation::UpdateItem);
        let output = self.gateway.update_item(input).await?;
        Ok(output.attributes)
    }

    fn page_limit(&self, page: Option<&PageRequest>) -> Option<i32> {
        let size = page
            .map(|p| p.page_size)
            .filter(|size| *size > 0)
            .unwrap_or(self.config.default_page_size);
        (size > 0).then(|| i32::try_from(size).unwrap_or(i32::MAX))
    }

    fn log_call(&self, operation: StoreOperation) {
        debug!(
            table = %self.config.table_name,
            operation = %operation,
            "Calling store gateway"
        );
    }
}

fn not_found(key: &Key) -> TableError {
    TableError::NotFound {
        key: key.to_string(),
    }
}
