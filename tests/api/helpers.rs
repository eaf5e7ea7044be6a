use once_cell::sync::Lazy;
use reader_actions::{
    action_token::{ActionTokenCodec, ActionTokenPayload},
    configuration::get_configuration,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use reqwest::Url;
use secrecy::Secret;
use wiremock::MockServer;

// Ensure that the `tracing` stack is only initialized once
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // We cannot assign the output of `get_subscriber` to a variable based on the value TEST_LOG because the sink is part of the type
    // returned by `get_subscriber` so they are not the same type.  We could work around it, but this is the most straight-forward way of moving forward
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Stands in for the upstream feed-management API.
    pub feeds_server: MockServer,
    pub token_codec: ActionTokenCodec,
    token_secret: Secret<String>,
    api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get_action(&self, token: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/actions", self.address))
            .query(&[("action", token)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_action_without_token(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/actions", self.address))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Encode an action token exactly as the external link-generation process
    /// would, using the secret the application is configured with.
    pub fn action_token(&self, payload: &ActionTokenPayload) -> String {
        self.token_codec
            .encode(payload)
            .expect("Failed to encode an action token")
    }

    /// Same, but with the expiry stamped in the past (well beyond the
    /// decoder's leeway).
    pub fn expired_action_token(&self, payload: &ActionTokenPayload) -> String {
        ActionTokenCodec::new(self.token_secret.clone(), -1)
            .encode(payload)
            .expect("Failed to encode an expired action token")
    }

    /// Pull the single undo link out of a rendered confirmation page and
    /// decode the token it carries.
    pub fn decode_undo_link(&self, html: &str) -> ActionTokenPayload {
        let links: Vec<_> = linkify::LinkFinder::new()
            .links(html)
            .filter(|link| *link.kind() == linkify::LinkKind::Url)
            .collect();
        assert_eq!(links.len(), 1, "should have been one link in {}", html);
        let url = Url::parse(links[0].as_str()).expect("undo link is not a valid URL");
        let (_, token) = url
            .query_pairs()
            .find(|(key, _)| key == "action")
            .expect("undo link has no action parameter");
        self.token_codec
            .decode(&token)
            .expect("Failed to decode the undo token")
    }
}

pub async fn spawn_app() -> TestApp {
    // The first time this is invoked, the code in `TRACING` will be executed. All other invocations will skip execution
    Lazy::force(&TRACING);

    // launch mock server to stand in for the feeds API
    let feeds_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration");
        // let OS choose a random port
        c.application.port = 0;
        c.feeds_api.base_url = feeds_server.uri();
        c
    };

    let token_codec = ActionTokenCodec::new(
        configuration.action_token.secret.clone(),
        configuration.action_token.validity_hours,
    );
    let token_secret = configuration.action_token.secret.clone();

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application");
    let port = application.port();
    let address = format!("http://127.0.0.1:{}", port);
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        port,
        feeds_server,
        token_codec,
        token_secret,
        api_client: reqwest::Client::new(),
    }
}
