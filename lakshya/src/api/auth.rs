//! Authentication endpoints (`/auth/*`)

use crate::api::users::User;
use crate::client::{ApiClient, ApiRequest, AuthMode};
use crate::error::ApiError;
use log::info;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by login, registration, and refresh alike.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl ApiClient {
    /// Creates a new session, storing the returned tokens and user before returning them.
    pub async fn login(&self, data: &LoginRequest) -> Result<TokenResponse, ApiError> {
        let req = ApiRequest::post("/auth/login")
            .json(data)?
            .auth_mode(AuthMode::Anonymous)
            .fallback_message("Login failed");
        self.establish_session(&req).await
    }

    /// Creates an account and signs straight into it.
    pub async fn register(&self, data: &RegisterRequest) -> Result<TokenResponse, ApiError> {
        if data.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("name must not be empty".to_string()));
        }
        let req = ApiRequest::post("/auth/register")
            .json(data)?
            .auth_mode(AuthMode::Anonymous)
            .fallback_message("Registration failed");
        self.establish_session(&req).await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.request(&ApiRequest::get("/auth/me").auth_mode(AuthMode::BearerOnly))
            .await
    }

    pub async fn change_password(
        &self,
        data: &ChangePasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        if data.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidRequest(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let req = ApiRequest::post("/auth/change-password")
            .json(data)?
            .auth_mode(AuthMode::BearerOnly);
        self.request(&req).await
    }

    /// Uses the stored refresh token to replace the whole session.
    ///
    /// Shares the pipeline's refresh path: coalesced with any in-flight refresh, and a
    /// failure ends the session exactly like an unrecoverable 401 does.
    pub async fn refresh_session(&self) -> Result<String, ApiError> {
        let current = self.session().access_token();
        match self.refresh_after(current.as_deref()).await {
            Some(token) => Ok(token),
            None => {
                self.end_session();
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn establish_session(&self, req: &ApiRequest) -> Result<TokenResponse, ApiError> {
        let tokens: TokenResponse = self.request(req).await?;
        self.session()
            .set_session(&tokens.access_token, &tokens.refresh_token, &tokens.user)?;
        info!("signed in as {}", tokens.user.email);
        Ok(tokens)
    }
}
