use axum::{extract::State, response::Json, routing::post, Router};

use crate::auth::{AuthError, AuthService, LoginRequest, TokenResponse};
use crate::error::ValidatedJson;

/// Authentication routes
pub fn auth_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(auth_service)
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}
