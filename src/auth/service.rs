use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::auth::{AuthError, JwtService, LoginRequest, TokenResponse, UserSession};
use crate::store::SharedStore;

#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    store: SharedStore,
}

impl AuthService {
    pub fn new(store: SharedStore, jwt_service: JwtService) -> Self {
        Self { jwt_service, store }
    }

    /// Exchange email and password for a bearer token.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        let user = match self.store.find_user_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .jwt_service
            .create_access_token(user.id, &user.email, user.role)?;

        info!(user_id = %user.id, "User logged in");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Tokens are self-contained; there is no server-side session table.
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }
}
