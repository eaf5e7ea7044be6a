use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};

use crate::domain::ActionOperation;

/// The contents of a signed action link token.
///
/// `operation` stays a plain string on purpose: a token carrying an unknown
/// operation must still decode so the dispatcher can degrade to the generic
/// error page instead of failing signature validation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionTokenPayload {
    pub operation: String,
    pub user_id: String,
    pub article_id: String,
    pub title: String,
}

impl ActionTokenPayload {
    pub fn operation(&self) -> Option<ActionOperation> {
        ActionOperation::parse(&self.operation)
    }

    /// Clone the payload with the operation swapped. Used only when building
    /// the undo link on a confirmation page.
    pub fn with_operation(&self, operation: ActionOperation) -> Self {
        Self {
            operation: operation.as_str().to_owned(),
            ..self.clone()
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Claims {
    operation: String,
    user_id: String,
    article_id: String,
    title: String,
    exp: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("the action token has expired")]
    Expired,
    #[error("failed to decode the action token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Encodes and decodes the signed, expiring tokens embedded in action links.
#[derive(Clone)]
pub struct ActionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity_hours: i64,
}

impl ActionTokenCodec {
    pub fn new(secret: Secret<String>, validity_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validity_hours,
        }
    }

    /// The configured validity window, as shown on the token-expired page.
    pub fn validity_hours(&self) -> i64 {
        self.validity_hours
    }

    pub fn encode(&self, payload: &ActionTokenPayload) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            operation: payload.operation.clone(),
            user_id: payload.user_id.clone(),
            article_id: payload.article_id.clone(),
            title: payload.title.clone(),
            exp: (Utc::now() + Duration::hours(self.validity_hours)).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn decode(&self, token: &str) -> Result<ActionTokenPayload, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        })?;
        Ok(ActionTokenPayload {
            operation: data.claims.operation,
            user_id: data.claims.user_id,
            article_id: data.claims.article_id,
            title: data.claims.title,
        })
    }
}
