pub mod action_token;
pub mod configuration;
pub mod domain;
pub mod feeds_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod templates;
