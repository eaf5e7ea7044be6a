use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};

use crate::routes::error_chain_fmt;

/// Thin client for the upstream feed-management API. Each action mints a
/// per-request bearer credential via `/login` and then issues exactly one
/// POST against the operation endpoint.
pub struct FeedsClient {
    http_client: Client,
    base_url: String,
    client_id: String,
    client_secret: Secret<String>,
}

#[derive(serde::Serialize)]
struct UserAssertion {
    #[serde(rename = "userId")]
    user_id: i64,
}

#[derive(thiserror::Error)]
pub enum FeedsApiError {
    #[error("the feeds API login returned {0}")]
    AuthenticationFailed(StatusCode),
    #[error("the feeds API returned {0} for an article action")]
    UpstreamFailure(StatusCode),
    #[error("the user id in the token is not numeric")]
    InvalidUserId(#[source] std::num::ParseIntError),
    #[error("failed to sign the user assertion")]
    Assertion(#[source] jsonwebtoken::errors::Error),
    #[error("failed to reach the feeds API")]
    Transport(#[from] reqwest::Error),
}

impl std::fmt::Debug for FeedsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl FeedsClient {
    pub fn new(
        base_url: String,
        client_id: String,
        client_secret: Secret<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let http_client = Client::builder().timeout(timeout).build().unwrap();
        Self {
            http_client,
            base_url,
            client_id,
            client_secret,
        }
    }

    #[tracing::instrument(name = "Mark an article as read", skip(self))]
    pub async fn mark_read(&self, user_id: &str, article_id: &str) -> Result<(), FeedsApiError> {
        self.post_article_action("/feeds/markArticleRead", user_id, article_id)
            .await
    }

    #[tracing::instrument(name = "Keep an article unread", skip(self))]
    pub async fn keep_unread(&self, user_id: &str, article_id: &str) -> Result<(), FeedsApiError> {
        self.post_article_action("/feeds/markArticleUnread", user_id, article_id)
            .await
    }

    #[tracing::instrument(name = "Save an article", skip(self))]
    pub async fn save_article(&self, user_id: &str, article_id: &str) -> Result<(), FeedsApiError> {
        self.post_article_action("/feeds/saveArticle", user_id, article_id)
            .await
    }

    async fn post_article_action(
        &self,
        endpoint: &str,
        user_id: &str,
        article_id: &str,
    ) -> Result<(), FeedsApiError> {
        let bearer = self.authenticate_user(user_id).await?;
        // The upstream expects a one-element array, not a bare string
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, endpoint))
            .header("Authorization", bearer)
            .json(&[article_id])
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, endpoint, "the feeds API rejected the article action");
            return Err(FeedsApiError::UpstreamFailure(status));
        }
        Ok(())
    }

    /// Exchange a signed `{userId}` assertion for a per-request bearer
    /// credential. The raw response body *is* the credential; the upstream
    /// contract gives us nothing to parse.
    #[tracing::instrument(name = "Authenticate with the feeds API", skip(self))]
    async fn authenticate_user(&self, user_id: &str) -> Result<String, FeedsApiError> {
        let body = serde_json::json!({
            "grant_type": "bearer",
            "client_id": self.client_id,
            "token": self.user_assertion(user_id)?,
        });
        let response = self
            .http_client
            .post(format!("{}/login", self.base_url))
            .json(&body)
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "the feeds API login failed");
            return Err(FeedsApiError::AuthenticationFailed(status));
        }
        Ok(response.text().await?)
    }

    fn user_assertion(&self, user_id: &str) -> Result<String, FeedsApiError> {
        let user_id: i64 = user_id.parse().map_err(FeedsApiError::InvalidUserId)?;
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &UserAssertion { user_id },
            &EncodingKey::from_secret(self.client_secret.expose_secret().as_bytes()),
        )
        .map_err(FeedsApiError::Assertion)
    }
}
