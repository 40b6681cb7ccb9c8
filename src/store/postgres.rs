use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::cadence::Cadence;
use crate::domain::delivery_channel::DeliveryChannel;
use crate::domain::locale::Locale;
use crate::domain::message::{Message, NewMessage};
use crate::domain::message_kind::MessageKind;
use crate::domain::subscriber::{ActiveSubscription, Subscriber};
use crate::domain::subscription_status::SubscriptionStatus;
use crate::store::{StoreError, SubscriberStore};

pub struct PostgresSubscriberStore {
    db_pool: PgPool,
}

impl PostgresSubscriberStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriberStore for PostgresSubscriberStore {
    #[tracing::instrument(name = "Fetching active subscribers", skip(self))]
    async fn get_active_subscribers(&self) -> Result<Vec<ActiveSubscription>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, subscription_type, subscription_status
            FROM users
            WHERE subscription_status IN ('basic', 'premium')
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ActiveSubscription, StoreError> {
                Ok(ActiveSubscription {
                    id: row.try_get("id")?,
                    cadence: cadence_from_row(row)?,
                    status: status_from_row(row)?,
                })
            })
            .collect()
    }

    #[tracing::instrument(name = "Fetching a subscriber", skip(self))]
    async fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, fullname, sex, date_of_birth, time_of_birth, place_of_birth,
                   language, subscription_type, communication_channel, send_to,
                   subscription_status
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(|row| subscriber_from_row(&row)).transpose()
    }

    #[tracing::instrument(name = "Fetching the last message", skip(self))]
    async fn get_last_message(
        &self,
        subscriber_id: Uuid,
        kind: MessageKind,
    ) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, messagetype, content, sentat, read
            FROM horoscope
            WHERE user_id = $1 AND messagetype = $2
            ORDER BY sentat DESC
            LIMIT 1
            "#,
        )
        .bind(subscriber_id)
        .bind(kind.as_ref())
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(|row| message_from_row(&row)).transpose()
    }

    #[tracing::instrument(
        name = "Inserting a new message",
        skip(self, message),
        fields(
            subscriber_id = %message.subscriber_id,
            message_kind = %message.kind
        )
    )]
    async fn insert_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO horoscope (id, user_id, messagetype, content, sentat, read)
            VALUES ($1, $2, $3, $4, $5, false)
            "#,
        )
        .bind(id)
        .bind(message.subscriber_id)
        .bind(message.kind.as_ref())
        .bind(&message.content)
        .bind(message.sent_at)
        .execute(&self.db_pool)
        .await?;

        Ok(message.into_message(id))
    }
}

fn cadence_from_row(row: &PgRow) -> Result<Cadence, StoreError> {
    let cadence: Option<String> = row.try_get("subscription_type")?;

    Ok(Cadence::parse_or_daily(cadence.as_deref().unwrap_or_default()))
}

fn status_from_row(row: &PgRow) -> Result<SubscriptionStatus, StoreError> {
    let status: Option<String> = row.try_get("subscription_status")?;

    Ok(SubscriptionStatus::parse_or_inactive(status))
}

fn subscriber_from_row(row: &PgRow) -> Result<Subscriber, StoreError> {
    let language: Option<String> = row.try_get("language")?;
    let channel: Option<String> = row.try_get("communication_channel")?;

    Ok(Subscriber {
        id: row.try_get("id")?,
        full_name: row.try_get("fullname")?,
        sex: row.try_get("sex")?,
        date_of_birth: row.try_get::<Option<NaiveDate>, _>("date_of_birth")?,
        time_of_birth: row.try_get::<Option<NaiveTime>, _>("time_of_birth")?,
        place_of_birth: row.try_get("place_of_birth")?,
        locale: Locale::parse_or_default(language.as_deref()),
        cadence: cadence_from_row(row)?,
        channel: DeliveryChannel::parse_or_email(channel.as_deref()),
        send_to: row.try_get("send_to")?,
        status: status_from_row(row)?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let kind = MessageKind::parse(row.try_get("messagetype")?).map_err(StoreError::InvalidRecord)?;

    Ok(Message {
        id: row.try_get("id")?,
        subscriber_id: row.try_get("user_id")?,
        kind,
        content: row.try_get("content")?,
        sent_at: row.try_get::<DateTime<Utc>, _>("sentat")?,
        read: row.try_get("read")?,
    })
}
