//! Access to subscriber records and their message history.
//!
//! Subscribers are owned by the billing layer; this service only reads them
//! and appends to the message history.

mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::message::{Message, NewMessage};
use crate::domain::message_kind::MessageKind;
use crate::domain::subscriber::{ActiveSubscription, Subscriber};

pub use postgres::PostgresSubscriberStore;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to query the subscriber store.")]
    Database(#[from] sqlx::Error),
    #[error("The subscriber store returned an invalid record: {0}")]
    InvalidRecord(String),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;
        if let StoreError::Database(err) = self {
            write!(f, "\n\t({})", err)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Subscribers on the `basic` or `premium` plan.
    async fn get_active_subscribers(&self) -> Result<Vec<ActiveSubscription>, StoreError>;

    async fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>, StoreError>;

    /// The most recently sent message of `kind` for the subscriber.
    async fn get_last_message(
        &self,
        subscriber_id: Uuid,
        kind: MessageKind,
    ) -> Result<Option<Message>, StoreError>;

    async fn insert_message(&self, message: NewMessage) -> Result<Message, StoreError>;
}
