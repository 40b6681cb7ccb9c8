use crate::domain::delivery_channel::DeliveryChannel;
use crate::domain::message_kind::MessageKind;
use crate::domain::phone_number::PhoneNumber;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::messaging_client::MessagingClient;

const MAX_TEXT_MESSAGE_CHARS: usize = 1500;
const ELLIPSIS: &str = "...";

#[derive(thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid destination for the {channel} channel: {reason}")]
    InvalidDestination { channel: String, reason: String },
    #[error("No {0} transport is configured.")]
    TransportUnavailable(&'static str),
    #[error("The {0} channel is not supported.")]
    UnsupportedChannel(String),
    #[error("The delivery provider rejected the message.")]
    Transport(#[from] reqwest::Error),
}

impl std::fmt::Debug for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;
        if let DeliveryError::Transport(err) = self {
            write!(f, "\n\t({})", err)?;
        }
        Ok(())
    }
}

/// Sends persisted messages over the subscriber's chosen channel.
pub struct DeliveryRouter {
    email_client: Option<EmailClient>,
    messaging_client: Option<MessagingClient>,
    disabled: bool,
}

impl DeliveryRouter {
    pub fn new(
        email_client: Option<EmailClient>,
        messaging_client: Option<MessagingClient>,
        disabled: bool,
    ) -> Self {
        Self {
            email_client,
            messaging_client,
            disabled,
        }
    }

    #[tracing::instrument(
        name = "Delivering a message",
        skip(self, subscriber, content),
        fields(
            subscriber_id = %subscriber.id,
            channel = %subscriber.channel.as_ref(),
            message_kind = %kind
        )
    )]
    pub async fn deliver(
        &self,
        subscriber: &Subscriber,
        content: &str,
        kind: MessageKind,
    ) -> Result<(), DeliveryError> {
        if self.disabled {
            tracing::info!(
                send_to = ?subscriber.send_to,
                "Delivery is disabled, skipping the send"
            );
            return Ok(());
        }

        let channel = &subscriber.channel;
        let destination = subscriber
            .send_to
            .as_deref()
            .map(str::trim)
            .filter(|destination| !destination.is_empty())
            .ok_or_else(|| DeliveryError::InvalidDestination {
                channel: channel.as_ref().to_string(),
                reason: String::from("missing destination"),
            })?;

        match channel {
            DeliveryChannel::Email => {
                let recipient = SubscriberEmail::parse(destination.to_string())
                    .map_err(|reason| invalid_destination(channel, reason))?;

                let Some(email_client) = &self.email_client else {
                    tracing::warn!(
                        recipient = %recipient.as_ref(),
                        "No email transport configured, the email was not sent"
                    );
                    return Ok(());
                };

                email_client
                    .send_horoscope(&recipient, kind, content)
                    .await?;
            }
            DeliveryChannel::Sms | DeliveryChannel::Whatsapp => {
                let recipient = PhoneNumber::parse(destination.to_string())
                    .map_err(|reason| invalid_destination(channel, reason))?;
                let messaging_client = self
                    .messaging_client
                    .as_ref()
                    .ok_or(DeliveryError::TransportUnavailable("messaging"))?;
                let body = truncate_for_text_message(content);

                if *channel == DeliveryChannel::Sms {
                    messaging_client.send_sms(&recipient, &body).await?;
                } else {
                    messaging_client.send_whatsapp(&recipient, &body).await?;
                }
            }
            DeliveryChannel::Unsupported(channel) => {
                return Err(DeliveryError::UnsupportedChannel(channel.clone()));
            }
        }

        tracing::info!("Message delivered");

        Ok(())
    }
}

fn invalid_destination(channel: &DeliveryChannel, reason: String) -> DeliveryError {
    DeliveryError::InvalidDestination {
        channel: channel.as_ref().to_string(),
        reason,
    }
}

/// Caps text message bodies at 1500 characters, replacing the tail with an
/// ellipsis when the content is longer.
pub fn truncate_for_text_message(content: &str) -> String {
    if content.chars().count() <= MAX_TEXT_MESSAGE_CHARS {
        return content.to_string();
    }

    let kept: String = content
        .chars()
        .take(MAX_TEXT_MESSAGE_CHARS - ELLIPSIS.len())
        .collect();

    format!("{}{}", kept, ELLIPSIS)
}
