pub mod cadence;
pub mod delivery_channel;
pub mod locale;
pub mod message;
pub mod message_kind;
pub mod phone_number;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_name;
pub mod subscription_status;
