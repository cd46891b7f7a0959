//! Identity endpoints (`/auth/v1`).

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Response, StatusCode};
use tokio::sync::broadcast;
use tracing::instrument;

use family_wishlist_core::{AvatarUrl, Password, UserId, Username};

use super::SupabaseBackend;
use super::dto::{
    AuthErrorBody, PasswordGrant, RefreshGrant, SignUpRequest, SignUpResponse, TokenResponse,
    UserMetadata, UserResponse,
};
use crate::backend::{AuthSession, BackendError, IdentityService, SessionEvent, SignUpOutcome};

const SIGN_UP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const USER_PATH: &str = "auth/v1/user";
const LOGOUT_PATH: &str = "auth/v1/logout";

/// Error codes meaning the login address is already registered.
const ALREADY_REGISTERED_CODES: &[&str] = &["user_already_exists", "email_exists"];

/// Which call produced an identity error; decides how 4xx answers read.
#[derive(Debug, Clone, Copy)]
enum AuthCall {
    SignUp,
    PasswordGrant,
    RefreshGrant,
    Session,
}

impl SupabaseBackend {
    async fn token_request<T: serde::Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &T,
        call: AuthCall,
    ) -> Result<AuthSession, BackendError> {
        let url = self.endpoint(TOKEN_PATH)?;
        let response = self
            .inner
            .client
            .post(url)
            .query(&[("grant_type", grant_type)])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response, call).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl IdentityService for SupabaseBackend {
    #[instrument(skip_all, fields(username = %username))]
    async fn sign_up(
        &self,
        username: &Username,
        password: &Password,
        avatar_url: Option<&AvatarUrl>,
    ) -> Result<SignUpOutcome, BackendError> {
        let address = self.identity_address(username);
        let body = SignUpRequest {
            email: &address,
            password: password.expose(),
            data: UserMetadata {
                username: username.as_str(),
                avatar_url: avatar_url.map(AvatarUrl::as_str),
            },
        };

        let url = self.endpoint(SIGN_UP_PATH)?;
        let response = self.inner.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(auth_error(response, AuthCall::SignUp).await);
        }

        let outcome = match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.emit(SessionEvent::SignedIn(session.clone()));
                SignUpOutcome {
                    user_id: session.user_id,
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUpOutcome {
                user_id: UserId::new(user.id),
                session: None,
            },
        };

        tracing::info!(user_id = %outcome.user_id, "Identity created");
        Ok(outcome)
    }

    #[instrument(skip_all, fields(username = %username))]
    async fn sign_in(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<AuthSession, BackendError> {
        let address = self.identity_address(username);
        let grant = PasswordGrant {
            email: &address,
            password: password.expose(),
        };

        let session = self
            .token_request("password", &grant, AuthCall::PasswordGrant)
            .await?;
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    #[instrument(skip_all, fields(user_id = %session.user_id))]
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, BackendError> {
        let grant = RefreshGrant {
            refresh_token: session.refresh_token(),
        };

        let refreshed = self
            .token_request("refresh_token", &grant, AuthCall::RefreshGrant)
            .await?;
        tracing::debug!("Access token refreshed");
        self.emit(SessionEvent::TokenRefreshed(refreshed.clone()));
        Ok(refreshed)
    }

    #[instrument(skip_all, fields(user_id = %session.user_id))]
    async fn current_user(&self, session: &AuthSession) -> Result<UserId, BackendError> {
        let url = self.endpoint(USER_PATH)?;
        let request = self.inner.client.get(url);
        let response = self
            .with_bearer(request, Some(session.access_token()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response, AuthCall::Session).await);
        }

        let user: UserResponse = response.json().await?;
        Ok(UserId::new(user.id))
    }

    #[instrument(skip_all, fields(user_id = %session.user_id))]
    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        let url = self.endpoint(LOGOUT_PATH)?;
        let request = self.inner.client.post(url);
        let response = self
            .with_bearer(request, Some(session.access_token()))
            .send()
            .await?;

        // An already-revoked token still counts as signed out.
        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            return Err(auth_error(response, AuthCall::Session).await);
        }

        self.emit(SessionEvent::SignedOut(session.user_id));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}

/// Classify an identity error response.
async fn auth_error(response: Response, call: AuthCall) -> BackendError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: AuthErrorBody = serde_json::from_str(&text).unwrap_or_default();
    classify(status, &body, call)
}

fn classify(status: StatusCode, body: &AuthErrorBody, call: AuthCall) -> BackendError {
    let already_registered = body
        .code()
        .is_some_and(|code| ALREADY_REGISTERED_CODES.contains(&code));

    match (call, status) {
        (AuthCall::SignUp, _) if already_registered => {
            BackendError::Conflict("identity already registered".to_string())
        }
        (AuthCall::SignUp, StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY) => {
            BackendError::Conflict(body.message())
        }
        (AuthCall::PasswordGrant, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) => {
            BackendError::InvalidCredentials
        }
        (AuthCall::RefreshGrant | AuthCall::Session, s)
            if s == StatusCode::BAD_REQUEST
                || s == StatusCode::UNAUTHORIZED
                || s == StatusCode::FORBIDDEN =>
        {
            BackendError::Unauthorized
        }
        _ => {
            let message = body.message();
            tracing::error!(status = %status, ?call, message = %message, "Identity request failed");
            BackendError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}
