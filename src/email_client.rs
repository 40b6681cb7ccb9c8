use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::message_kind::MessageKind;
use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client for a SendGrid-compatible `/mail/send` endpoint.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
    content_type: String,
}

#[derive(serde::Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(serde::Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(serde::Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        content_type: String,
        timeout: Option<time::Duration>,
    ) -> EmailClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .expect("Failed to build the email HTTP client.");

        EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
            content_type,
        }
    }

    /// Emails a generated message, titled after its kind.
    #[tracing::instrument(
        name = "Sending a horoscope email",
        skip(self, recipient, content),
        fields(message_kind = %kind)
    )]
    pub async fn send_horoscope(
        &self,
        recipient: &SubscriberEmail,
        kind: MessageKind,
        content: &str,
    ) -> Result<(), reqwest::Error> {
        let html = render_html(content);

        self.send(recipient, kind.email_subject(), &html).await
    }

    async fn send(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        body: &str,
    ) -> Result<(), reqwest::Error> {
        let request = MailSendRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: recipient.as_ref(),
                }],
            }],
            from: Address {
                email: self.sender.as_ref(),
            },
            subject,
            content: [Content {
                content_type: &self.content_type,
                value: body,
            }],
        };

        self.http_client
            .post(format!("{}/mail/send", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Generated text is plain prose with line breaks.
pub fn render_html(content: &str) -> String {
    format!("<div>{}</div>", content.replace('\n', "<br/>"))
}
