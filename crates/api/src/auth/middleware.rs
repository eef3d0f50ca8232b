//! Bearer authentication for the dashboard HTTP surface

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chatrelay_shared::PartyKind;

use super::jwt::JwtManager;
use crate::error::ApiError;

/// Validated identity extracted from a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub kind: PartyKind,
    pub party_id: String,
    pub name: Option<String>,
}

impl AuthIdentity {
    /// Validate a raw token and extract the identity it carries
    pub fn from_token(jwt: &JwtManager, token: &str) -> Result<Self, ApiError> {
        let claims = jwt.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ApiError::InvalidToken
        })?;

        Ok(Self {
            kind: claims.role,
            party_id: claims.sub.trim().to_string(),
            name: claims.name,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require an admin bearer token; inserts the `AuthIdentity` extension
pub async fn require_admin(
    State(jwt): State<JwtManager>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized)?;

    let identity = AuthIdentity::from_token(&jwt, token)?;
    if identity.kind != PartyKind::Admin {
        tracing::warn!(
            party_id = %identity.party_id,
            kind = %identity.kind,
            "Non-admin token used on dashboard route"
        );
        return Err(ApiError::Forbidden);
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
