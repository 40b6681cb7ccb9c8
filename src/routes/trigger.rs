use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use uuid::Uuid;

use crate::dispatcher::{DispatchError, DispatchOutcome, Dispatcher};

/// Shared secret callers must present as `key`.
pub struct TriggerSecret(pub Option<Secret<String>>);

#[derive(Deserialize, Debug, Default)]
pub struct TriggerParameters {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub key: Option<String>,
}

impl TriggerParameters {
    /// An empty body carries no parameters. Anything else must be a JSON
    /// object whose values are strings.
    fn from_body(body: &[u8]) -> Result<Option<TriggerParameters>, TriggerError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(body)
            .map(Some)
            .map_err(|err| TriggerError::InvalidBody(err.to_string()))
    }

    // Query string values win over the JSON body
    fn merge(self, body: Option<TriggerParameters>) -> TriggerParameters {
        let body = body.unwrap_or_default();

        TriggerParameters {
            user_id: non_empty(self.user_id).or_else(|| non_empty(body.user_id)),
            key: non_empty(self.key).or_else(|| non_empty(body.key)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(serde::Serialize)]
struct TriggerResponse {
    success: bool,
    processed: usize,
}

#[tracing::instrument(
    name = "Horoscope trigger handler",
    skip(query, dispatcher, secret),
    fields(user_id = ?query.user_id)
)]
pub async fn handle_trigger_get(
    query: web::Query<TriggerParameters>,
    dispatcher: web::Data<Dispatcher>,
    secret: web::Data<TriggerSecret>,
) -> Result<HttpResponse, TriggerError> {
    trigger(query.into_inner(), &dispatcher, &secret).await
}

#[tracing::instrument(
    name = "Horoscope trigger handler",
    skip(query, body, dispatcher, secret),
    fields(user_id = ?query.user_id)
)]
pub async fn handle_trigger_post(
    query: web::Query<TriggerParameters>,
    body: web::Bytes,
    dispatcher: web::Data<Dispatcher>,
    secret: web::Data<TriggerSecret>,
) -> Result<HttpResponse, TriggerError> {
    let parameters = query
        .into_inner()
        .merge(TriggerParameters::from_body(&body)?);

    trigger(parameters, &dispatcher, &secret).await
}

async fn trigger(
    parameters: TriggerParameters,
    dispatcher: &Dispatcher,
    secret: &TriggerSecret,
) -> Result<HttpResponse, TriggerError> {
    let parameters = TriggerParameters::default().merge(Some(parameters));

    authorize(secret, parameters.key.as_deref())?;

    let outcome: DispatchOutcome = match parameters.user_id {
        Some(user_id) => {
            let subscriber_id = Uuid::parse_str(&user_id)
                .map_err(|_| TriggerError::InvalidSubscriberId(user_id))?;

            dispatcher.process_one(subscriber_id).await?
        }
        None => dispatcher.run_batch().await?,
    };

    Ok(HttpResponse::Ok().json(TriggerResponse {
        success: true,
        processed: outcome.processed,
    }))
}

fn authorize(secret: &TriggerSecret, key: Option<&str>) -> Result<(), TriggerError> {
    let Some(secret) = &secret.0 else {
        tracing::error!("The trigger secret is not configured");
        return Err(TriggerError::MissingSecret);
    };

    match key {
        Some(key) if constant_time_eq(key.as_bytes(), secret.expose_secret().as_bytes()) => {
            Ok(())
        }
        _ => Err(TriggerError::Unauthorized),
    }
}

/// Takes the same time for every key of a given length.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[derive(thiserror::Error)]
pub enum TriggerError {
    #[error("Internal server configuration error")]
    MissingSecret,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0} is not a valid user id")]
    InvalidSubscriberId(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    DispatchError(#[source] DispatchError),
}

impl From<DispatchError> for TriggerError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound(_) => TriggerError::NotFound,
            err => TriggerError::DispatchError(err),
        }
    }
}

impl std::fmt::Debug for TriggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;
        if let TriggerError::DispatchError(err) = self {
            write!(f, "\n\t{:?}", err)?;
        }
        Ok(())
    }
}

impl ResponseError for TriggerError {
    fn status_code(&self) -> StatusCode {
        match self {
            TriggerError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            TriggerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TriggerError::InvalidSubscriberId(_) | TriggerError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            TriggerError::NotFound => StatusCode::NOT_FOUND,
            TriggerError::DispatchError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let TriggerError::DispatchError(err) = self {
            tracing::error!("Horoscope trigger failed: {:?}", err);
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}
