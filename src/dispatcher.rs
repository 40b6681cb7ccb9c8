//! Decides who is owed a message, generates it once and hands it to delivery.
//!
//! Subscribers are processed one after the other. A failure while processing
//! one subscriber is logged and never stops the rest of the batch.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::content_generator::ContentGenerator;
use crate::delivery::DeliveryRouter;
use crate::domain::cadence::CadencePolicy;
use crate::domain::message::{Message, NewMessage};
use crate::domain::message_kind::MessageKind;
use crate::domain::subscriber::{ActiveSubscription, Subscriber};
use crate::store::{StoreError, SubscriberStore};

/// A second message of the same kind for the same subscriber inside this
/// window is treated as a duplicate of the first.
pub const DEDUP_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DispatchOutcome {
    pub processed: usize,
}

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("Subscriber {0} was not found.")]
    NotFound(Uuid),
    #[error("The subscriber store failed.")]
    Store(#[from] StoreError),
    #[error("Content generation returned no text.")]
    EmptyContent,
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;
        if let DispatchError::Store(err) = self {
            write!(f, "\n\t{:?}", err)?;
        }
        Ok(())
    }
}

/// Stores a generated message unless one of the same kind was stored for the
/// subscriber within the dedup window, in which case `None` is returned.
///
/// The lookup and the insert are separate store calls, so two overlapping
/// invocations for the same subscriber can both pass the check.
#[tracing::instrument(
    name = "Persisting a generated message",
    skip(store, content),
    fields(subscriber_id = %subscriber_id, message_kind = %kind)
)]
pub async fn persist_message(
    store: &dyn SubscriberStore,
    subscriber_id: Uuid,
    content: &str,
    kind: MessageKind,
    now: DateTime<Utc>,
) -> Result<Option<Message>, StoreError> {
    let since = now - Duration::minutes(DEDUP_WINDOW_MINUTES);

    if let Some(recent) = store.get_last_message(subscriber_id, kind).await? {
        if recent.sent_at >= since {
            tracing::info!(
                last_sent_at = %recent.sent_at,
                "A message of this kind was stored moments ago, skipping"
            );
            return Ok(None);
        }
    }

    let message = store
        .insert_message(NewMessage {
            subscriber_id,
            kind,
            content: content.to_string(),
            sent_at: now,
        })
        .await?;

    Ok(Some(message))
}

pub struct Dispatcher {
    store: Arc<dyn SubscriberStore>,
    content_generator: ContentGenerator,
    delivery_router: DeliveryRouter,
    cadence_policy: CadencePolicy,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        content_generator: ContentGenerator,
        delivery_router: DeliveryRouter,
        cadence_policy: CadencePolicy,
    ) -> Self {
        Self {
            store,
            content_generator,
            delivery_router,
            cadence_policy,
        }
    }

    /// Sends a message to a single subscriber right away, whether or not one
    /// is due.
    #[tracing::instrument(name = "Processing an on-demand trigger", skip(self))]
    pub async fn process_one(&self, subscriber_id: Uuid) -> Result<DispatchOutcome, DispatchError> {
        let subscriber = self
            .store
            .get_subscriber(subscriber_id)
            .await?
            .ok_or(DispatchError::NotFound(subscriber_id))?;

        let produced = self.generate_and_send(&subscriber).await?;

        Ok(DispatchOutcome {
            processed: usize::from(produced),
        })
    }

    /// Runs over every active subscriber and sends the messages that are due.
    /// `processed` counts the messages that were generated and stored.
    #[tracing::instrument(name = "Running the horoscope batch", skip(self))]
    pub async fn run_batch(&self) -> Result<DispatchOutcome, DispatchError> {
        let subscriptions = self.store.get_active_subscribers().await?;
        let mut processed = 0;

        tracing::info!("{} active subscribers", subscriptions.len());

        for subscription in &subscriptions {
            match self.process_subscription(subscription).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        subscriber_id = %subscription.id,
                        message_kind = %subscription.message_kind(),
                        "Failed to process subscriber: {:?}",
                        err
                    );
                }
            }
        }

        tracing::info!("Batch finished, {} messages produced", processed);

        Ok(DispatchOutcome { processed })
    }

    #[tracing::instrument(
        name = "Processing a subscriber",
        skip(self, subscription),
        fields(
            subscriber_id = %subscription.id,
            message_kind = %subscription.message_kind()
        )
    )]
    async fn process_subscription(
        &self,
        subscription: &ActiveSubscription,
    ) -> Result<bool, DispatchError> {
        let kind = subscription.message_kind();
        let last_sent_at = self
            .store
            .get_last_message(subscription.id, kind)
            .await?
            .map(|message| message.sent_at);

        if !self
            .cadence_policy
            .is_due(last_sent_at, subscription.cadence, Utc::now())
        {
            return Ok(false);
        }

        let Some(subscriber) = self.store.get_subscriber(subscription.id).await? else {
            tracing::warn!("Subscriber disappeared before its profile could be loaded");
            return Ok(false);
        };

        self.generate_and_send(&subscriber).await
    }

    /// Returns whether a new message was stored. Delivery failures are logged
    /// but the stored message still counts.
    async fn generate_and_send(&self, subscriber: &Subscriber) -> Result<bool, DispatchError> {
        let kind = subscriber.message_kind();
        let now = Utc::now();
        let content = self
            .content_generator
            .generate(subscriber, now.date_naive())
            .await;

        if content.trim().is_empty() {
            return Err(DispatchError::EmptyContent);
        }

        let Some(message) =
            persist_message(self.store.as_ref(), subscriber.id, &content, kind, now).await?
        else {
            return Ok(false);
        };

        if let Err(err) = self
            .delivery_router
            .deliver(subscriber, &message.content, kind)
            .await
        {
            tracing::error!(
                subscriber_id = %subscriber.id,
                message_kind = %kind,
                message_id = %message.id,
                "Message stored but not delivered: {:?}",
                err
            );
        }

        Ok(true)
    }
}
