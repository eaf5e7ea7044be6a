use actix_web::{web, HttpRequest, HttpResponse};
use anyhow::Context;

use crate::action_token::{ActionTokenCodec, ActionTokenPayload, TokenError};
use crate::domain::ActionOperation;
use crate::feeds_client::FeedsClient;
use crate::startup::ApplicationBaseUrl;
use crate::templates::Templates;

/// Query parameter carrying the signed action token.
pub const ACTION_PARAM: &str = "action";

#[derive(serde::Deserialize)]
pub struct Parameters {
    pub action: String,
}

/// Entry point for email action links.
///
/// Whatever happens inside, the caller gets a 200 with one of the five HTML
/// pages; failures are logged, never surfaced as non-200 statuses.
#[tracing::instrument(name = "Execute an action link", skip_all)]
pub async fn execute_action(
    request: HttpRequest,
    codec: web::Data<ActionTokenCodec>,
    feeds_client: web::Data<FeedsClient>,
    templates: web::Data<Templates>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> HttpResponse {
    let parameters = match web::Query::<Parameters>::from_query(request.query_string()) {
        Ok(parameters) => parameters,
        Err(e) => {
            tracing::warn!(error = %e, "the action link is missing its token parameter");
            return templates.error_page();
        }
    };

    let payload = match codec.decode(&parameters.action) {
        Ok(payload) => payload,
        Err(TokenError::Expired) => {
            tracing::info!("token expired");
            return templates
                .page(
                    "token-expired.html",
                    &[("expiration", &codec.validity_hours().to_string())],
                )
                .unwrap_or_else(|_| templates.error_page());
        }
        Err(e) => {
            tracing::warn!(error = ?e, "failed to decode the action token");
            return templates.error_page();
        }
    };

    let operation = match payload.operation() {
        Some(operation) => operation,
        None => {
            tracing::warn!(operation = %payload.operation, "unknown operation in action token");
            return templates.error_page();
        }
    };

    match perform(operation, &payload, &feeds_client, &codec, &base_url, &templates).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "failed to execute the action");
            templates.error_page()
        }
    }
}

async fn perform(
    operation: ActionOperation,
    payload: &ActionTokenPayload,
    feeds_client: &FeedsClient,
    codec: &ActionTokenCodec,
    base_url: &ApplicationBaseUrl,
    templates: &Templates,
) -> Result<HttpResponse, anyhow::Error> {
    let response = match operation {
        ActionOperation::MarkRead => {
            tracing::info!("mark read request");
            feeds_client
                .mark_read(&payload.user_id, &payload.article_id)
                .await
                .context("Failed to mark the article as read")?;
            let unread_link = undo_link(codec, base_url, payload, ActionOperation::MarkUnread)?;
            templates.page(
                "marked-read.html",
                &[("title", &payload.title), ("unread_link", &unread_link)],
            )?
        }
        ActionOperation::MarkUnread => {
            tracing::info!("keep unread request");
            feeds_client
                .keep_unread(&payload.user_id, &payload.article_id)
                .await
                .context("Failed to keep the article unread")?;
            let read_link = undo_link(codec, base_url, payload, ActionOperation::MarkRead)?;
            templates.page(
                "marked-unread.html",
                &[("title", &payload.title), ("read_link", &read_link)],
            )?
        }
        ActionOperation::SaveArticle => {
            tracing::info!("save article request");
            feeds_client
                .save_article(&payload.user_id, &payload.article_id)
                .await
                .context("Failed to save the article")?;
            templates.page("save-article.html", &[("title", &payload.title)])?
        }
    };
    Ok(response)
}

/// Build a fully-qualified action link that reverses the operation just
/// performed, by re-encoding the payload with the operation overwritten.
fn undo_link(
    codec: &ActionTokenCodec,
    base_url: &ApplicationBaseUrl,
    payload: &ActionTokenPayload,
    new_operation: ActionOperation,
) -> Result<String, anyhow::Error> {
    let token = codec
        .encode(&payload.with_operation(new_operation))
        .context("Failed to encode the undo token")?;
    Ok(format!(
        "{}/actions?{}={}",
        base_url.0, ACTION_PARAM, token
    ))
}
