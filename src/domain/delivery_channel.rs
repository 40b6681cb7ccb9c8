#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum DeliveryChannel {
    Email,
    Sms,
    Whatsapp,
    /// A channel value written by another system that this service cannot send to.
    Unsupported(String),
}

impl DeliveryChannel {
    /// Subscribers without a stored channel receive email.
    pub fn parse_or_email(channel: Option<&str>) -> DeliveryChannel {
        let Some(channel) = channel.map(|c| c.trim().to_lowercase()) else {
            return DeliveryChannel::Email;
        };

        match channel.as_str() {
            "" | "email" => DeliveryChannel::Email,
            "sms" => DeliveryChannel::Sms,
            "whatsapp" => DeliveryChannel::Whatsapp,
            _ => DeliveryChannel::Unsupported(channel),
        }
    }

    /// SMS and WhatsApp bodies are capped, so content is generated shorter.
    pub fn is_short_format(&self) -> bool {
        matches!(self, DeliveryChannel::Sms | DeliveryChannel::Whatsapp)
    }
}

impl AsRef<str> for DeliveryChannel {
    fn as_ref(&self) -> &str {
        match self {
            DeliveryChannel::Email => "email",
            DeliveryChannel::Sms => "sms",
            DeliveryChannel::Whatsapp => "whatsapp",
            DeliveryChannel::Unsupported(channel) => channel.as_str(),
        }
    }
}
