use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::content_generator::ContentGenerator;
use crate::delivery::DeliveryRouter;
use crate::dispatcher::Dispatcher;
use crate::domain::cadence::CadencePolicy;
use crate::routes::{handle_trigger_get, handle_trigger_post, health_check, TriggerSecret};
use crate::store::{PostgresSubscriberStore, SubscriberStore};

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let store = Arc::new(PostgresSubscriberStore::new(db_pool));

        Self::build_with_store(config, store).await
    }

    /// Builds the application on top of an already constructed store.
    pub async fn build_with_store(
        config: Settings,
        store: Arc<dyn SubscriberStore>,
    ) -> Result<Self, std::io::Error> {
        let email_client = config
            .email_client
            .client()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
        let messaging_client = config.messaging_client.client();

        if email_client.is_none() {
            tracing::warn!("No email transport configured, emails will only be logged");
        }
        if messaging_client.is_none() {
            tracing::warn!("No messaging transport configured, SMS and WhatsApp deliveries will fail");
        }
        if config.is_delivery_disabled() {
            tracing::warn!("Delivery is disabled, no message will be sent");
        }

        let dispatcher = Dispatcher::new(
            store,
            ContentGenerator::new(config.completion_client.client()),
            DeliveryRouter::new(
                email_client,
                messaging_client,
                config.is_delivery_disabled(),
            ),
            CadencePolicy::default(),
        );
        let secret = TriggerSecret(config.trigger.get_cron_secret());

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, dispatcher, secret)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    dispatcher: Dispatcher,
    secret: TriggerSecret,
) -> Result<Server, std::io::Error> {
    let dispatcher = web::Data::new(dispatcher);
    let secret = web::Data::new(secret);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/trigger-horoscope", web::get().to(handle_trigger_get))
            .route("/trigger-horoscope", web::post().to(handle_trigger_post))
            .app_data(dispatcher.clone())
            .app_data(secret.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
