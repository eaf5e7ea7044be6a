use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::action_token::ActionTokenCodec;
use crate::configuration::Settings;
use crate::feeds_client::FeedsClient;
use crate::routes::{execute_action, health_check};
use crate::templates::Templates;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, std::io::Error> {
        let timeout = configuration.feeds_api.timeout();
        let feeds_client = FeedsClient::new(
            configuration.feeds_api.base_url,
            configuration.feeds_api.client_id,
            configuration.feeds_api.client_secret,
            timeout,
        );
        let token_codec = ActionTokenCodec::new(
            configuration.action_token.secret,
            configuration.action_token.validity_hours,
        );

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr().unwrap().port();
        let server = run(
            listener,
            feeds_client,
            token_codec,
            configuration.application.base_url,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Self base URL prepended to generated undo links.
pub struct ApplicationBaseUrl(pub String);

pub fn run(
    listener: TcpListener,
    feeds_client: FeedsClient,
    token_codec: ActionTokenCodec,
    base_url: String,
) -> Result<Server, std::io::Error> {
    // `web::Data` is basically `Arc`, which will safely share the app state across threads
    let feeds_client = web::Data::new(feeds_client);
    let token_codec = web::Data::new(token_codec);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));
    let templates = web::Data::new(Templates);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/actions", web::get().to(execute_action))
            .app_data(feeds_client.clone())
            .app_data(token_codec.clone())
            .app_data(base_url.clone())
            .app_data(templates.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
