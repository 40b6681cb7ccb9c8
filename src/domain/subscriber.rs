use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::cadence::Cadence;
use crate::domain::delivery_channel::DeliveryChannel;
use crate::domain::locale::Locale;
use crate::domain::message_kind::MessageKind;
use crate::domain::subscription_status::SubscriptionStatus;

/// Full subscriber profile. Written by the billing layer, read-only here.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub time_of_birth: Option<NaiveTime>,
    pub place_of_birth: Option<String>,
    pub locale: Locale,
    pub cadence: Cadence,
    pub channel: DeliveryChannel,
    /// Raw destination; validated against `channel` right before delivery.
    pub send_to: Option<String>,
    pub status: SubscriptionStatus,
}

impl Subscriber {
    pub fn message_kind(&self) -> MessageKind {
        MessageKind::from(self.cadence)
    }
}

/// The scheduling columns of an active subscriber, enough to decide whether a
/// message is due without loading the whole profile.
#[derive(Debug, Clone)]
pub struct ActiveSubscription {
    pub id: Uuid,
    pub cadence: Cadence,
    pub status: SubscriptionStatus,
}

impl ActiveSubscription {
    pub fn message_kind(&self) -> MessageKind {
        MessageKind::from(self.cadence)
    }
}
