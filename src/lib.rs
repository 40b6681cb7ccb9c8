pub mod completion_client;
pub mod config;
pub mod content_generator;
pub mod delivery;
pub mod dispatcher;
pub mod domain;
pub mod email_client;
pub mod messaging_client;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
