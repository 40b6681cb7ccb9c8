use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::phone_number::{whatsapp_address, PhoneNumber};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// How requests are authenticated against the messaging provider. Both modes
/// address the account by its SID in the URL.
#[derive(Debug)]
pub enum MessagingCredentials {
    /// Basic auth as the account SID with the account auth token.
    AuthToken(Secret<String>),
    /// Basic auth as a standalone API key.
    ApiKey { sid: String, secret: Secret<String> },
}

/// Client for a Twilio-compatible programmable messaging API, used for both
/// SMS and WhatsApp.
#[derive(Debug)]
pub struct MessagingClient {
    http_client: Client,
    base_url: String,
    account_sid: String,
    credentials: MessagingCredentials,
    from_sms: String,
    from_whatsapp: String,
}

#[derive(serde::Serialize)]
struct CreateMessageForm<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
}

impl MessagingClient {
    pub fn new(
        base_url: String,
        account_sid: String,
        credentials: MessagingCredentials,
        from_sms: String,
        from_whatsapp: String,
        timeout: Option<time::Duration>,
    ) -> MessagingClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .expect("Failed to build the messaging HTTP client.");

        MessagingClient {
            http_client,
            base_url,
            account_sid,
            credentials,
            from_sms,
            from_whatsapp,
        }
    }

    pub async fn send_sms(&self, recipient: &PhoneNumber, body: &str) -> Result<(), reqwest::Error> {
        self.send_message(&self.from_sms, recipient.as_ref(), body)
            .await
    }

    pub async fn send_whatsapp(
        &self,
        recipient: &PhoneNumber,
        body: &str,
    ) -> Result<(), reqwest::Error> {
        self.send_message(
            &whatsapp_address(&self.from_whatsapp),
            &recipient.as_whatsapp(),
            body,
        )
        .await
    }

    fn basic_auth(&self) -> (&str, &Secret<String>) {
        match &self.credentials {
            MessagingCredentials::AuthToken(token) => (self.account_sid.as_str(), token),
            MessagingCredentials::ApiKey { sid, secret } => (sid.as_str(), secret),
        }
    }

    #[tracing::instrument(
        name = "Sending a message through the messaging provider",
        skip(self, body)
    )]
    async fn send_message(&self, from: &str, to: &str, body: &str) -> Result<(), reqwest::Error> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let (username, password) = self.basic_auth();

        self.http_client
            .post(&url)
            .basic_auth(username, Some(password.expose_secret()))
            .form(&CreateMessageForm { from, to, body })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
