//! Seams between the interaction core and the outside world.
//!
//! The core only talks to the language model and the spreadsheet through these
//! traits; the concrete HTTP adapters live in `etymo-agent` and `etymo-sheets`.

use async_trait::async_trait;

use crate::domain::event::{InboundEvent, OutboundAction};
use crate::domain::save::Row;
use crate::errors::{ProviderError, StoreError};

#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn generate(&self, word: &str) -> Result<String, ProviderError>;
}

/// Append-only tabular destination. Duplicate words are separate rows.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn append(&self, row: &Row) -> Result<(), StoreError>;
}

/// Turns one inbound event into exactly one outbound action.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(&self, event: InboundEvent) -> OutboundAction;
}

#[async_trait]
impl<T> ExplanationProvider for std::sync::Arc<T>
where
    T: ExplanationProvider + ?Sized,
{
    async fn generate(&self, word: &str) -> Result<String, ProviderError> {
        (**self).generate(word).await
    }
}

#[async_trait]
impl<T> RowStore for std::sync::Arc<T>
where
    T: RowStore + ?Sized,
{
    async fn append(&self, row: &Row) -> Result<(), StoreError> {
        (**self).append(row).await
    }
}
