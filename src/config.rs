use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use std::time;

use crate::completion_client::CompletionClient;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::messaging_client::{MessagingClient, MessagingCredentials};

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub completion_client: CompletionClientSettings,
    pub email_client: EmailClientSettings,
    pub messaging_client: MessagingClientSettings,
    pub delivery: DeliverySettings,
    #[serde(default)]
    pub trigger: TriggerSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct CompletionClientSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub temperature: f32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tokens: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    // Without a key there is no email transport and emails are only logged
    pub api_key: Option<Secret<String>>,
    #[serde(default = "default_email_content_type")]
    pub content_type: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

fn default_email_content_type() -> String {
    String::from("text/html")
}

#[derive(serde::Deserialize, Clone)]
pub struct MessagingClientSettings {
    pub base_url: String,
    pub account_sid: Option<String>,
    pub auth_token: Option<Secret<String>>,
    // An API key pair takes precedence over the auth token when both are set
    pub api_key_sid: Option<String>,
    pub api_key_secret: Option<Secret<String>>,
    pub from_sms: String,
    pub from_whatsapp: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct DeliverySettings {
    // Kill switch: when true nothing is sent, deliveries are only logged
    pub disabled: bool,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct TriggerSettings {
    pub cron_secret: Option<Secret<String>>,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_completion_client_base_url(&mut self, new_base_url: String) {
        self.completion_client.base_url = new_base_url
    }

    pub fn set_email_client_base_url(&mut self, new_base_url: String) {
        self.email_client.base_url = new_base_url
    }

    pub fn set_messaging_client_base_url(&mut self, new_base_url: String) {
        self.messaging_client.base_url = new_base_url
    }

    pub fn set_cron_secret(&mut self, cron_secret: Option<String>) {
        self.trigger.cron_secret = cron_secret.map(Secret::new);
    }

    pub fn is_delivery_disabled(&self) -> bool {
        self.delivery.disabled
    }
}

impl DatabaseSettings {
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_db_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let mut db_options = PgConnectOptions::new()
            .host(&self.host)
            .password(self.password.expose_secret())
            .username(&self.username)
            .port(self.port)
            .database(&self.name)
            .ssl_mode(ssl_mode);

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        db_options
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl CompletionClientSettings {
    pub fn client(&self) -> CompletionClient {
        CompletionClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.model.clone(),
            self.temperature,
            self.max_tokens,
            Some(time::Duration::from_millis(self.timeout_milliseconds)),
        )
    }
}

impl EmailClientSettings {
    pub fn get_sender_email(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    /// `Ok(None)` when no API key is configured.
    pub fn client(&self) -> Result<Option<EmailClient>, String> {
        let Some(api_key) = non_empty_secret(&self.api_key) else {
            return Ok(None);
        };

        Ok(Some(EmailClient::new(
            self.base_url.clone(),
            self.get_sender_email()?,
            api_key,
            self.content_type.clone(),
            Some(time::Duration::from_millis(self.timeout_milliseconds)),
        )))
    }
}

impl MessagingClientSettings {
    /// `None` unless the account SID and either an API key pair or the auth
    /// token are configured.
    pub fn client(&self) -> Option<MessagingClient> {
        let account_sid = non_empty(&self.account_sid)?;
        let credentials = self.credentials()?;

        Some(MessagingClient::new(
            self.base_url.clone(),
            account_sid,
            credentials,
            self.from_sms.clone(),
            self.from_whatsapp.clone(),
            Some(time::Duration::from_millis(self.timeout_milliseconds)),
        ))
    }
}

impl MessagingClientSettings {
    fn credentials(&self) -> Option<MessagingCredentials> {
        let api_key = non_empty(&self.api_key_sid).zip(non_empty_secret(&self.api_key_secret));

        match api_key {
            Some((sid, secret)) => Some(MessagingCredentials::ApiKey { sid, secret }),
            None => non_empty_secret(&self.auth_token).map(MessagingCredentials::AuthToken),
        }
    }
}

impl TriggerSettings {
    pub fn get_cron_secret(&self) -> Option<Secret<String>> {
        non_empty_secret(&self.cron_secret)
    }
}

// Environment overrides cannot unset a key, so an empty string counts as missing.
fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|value| !value.trim().is_empty())
}

fn non_empty_secret(secret: &Option<Secret<String>>) -> Option<Secret<String>> {
    secret
        .as_ref()
        .filter(|secret| !secret.expose_secret().trim().is_empty())
        .cloned()
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir()
        .map_err(|err| ConfigError::Message(format!("Failed to determine the current directory: {}", err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_DELIVERY__DISABLED would set Settings.delivery.disabled
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}
