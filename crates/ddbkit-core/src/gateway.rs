//! Store gateway seam.
//!
//! The gateway performs the actual item operations. It owns transport,
//! timeouts and retries; the [`Table`](crate::table::Table) facade only
//! hands it fully compiled requests.

use std::sync::Arc;

use async_trait::async_trait;

use ddbkit_model::StoreError;
use ddbkit_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, UpdateItemInput,
};
use ddbkit_model::output::{
    DeleteItemOutput, GetItemOutput, PutItemOutput, QueryOutput, UpdateItemOutput,
};

/// Item operations against the store.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Fetch one item by primary key.
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, StoreError>;

    /// Query one page of a partition.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, StoreError>;

    /// Write a whole item.
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, StoreError>;

    /// Delete one item by primary key.
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, StoreError>;

    /// Apply an update expression to one item.
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, StoreError>;
}

#[async_trait]
impl<G: StoreGateway + ?Sized> StoreGateway for Arc<G> {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, StoreError> {
        (**self).get_item(input).await
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, StoreError> {
        (**self).query(input).await
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, StoreError> {
        (**self).put_item(input).await
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, StoreError> {
        (**self).delete_item(input).await
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, StoreError> {
        (**self).update_item(input).await
    }
}
