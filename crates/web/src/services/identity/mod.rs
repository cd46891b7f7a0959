//! Identity flow: sign-up, sign-in and sign-out against the backend.
//!
//! All form validation happens before the first backend call. Sign-up is a
//! three-step sequence (username pre-check, identity creation, profile
//! insert) with no rollback; a failure in the last step leaves an orphaned
//! identity that is reported as [`AuthError::ProfileNotCreated`].

mod error;

pub use error::AuthError;

use family_wishlist_core::{Profile, SignIn, SignUp};

use crate::backend::{AuthSession, Backend, BackendError, SignUpOutcome};

/// Identity service.
///
/// Borrowed per request from the application state.
pub struct IdentityFlow<'a> {
    backend: &'a Backend,
}

impl<'a> IdentityFlow<'a> {
    /// Create a new identity flow.
    #[must_use]
    pub const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Register a new user and create their profile.
    ///
    /// An empty `avatar_url` means no avatar.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is malformed.
    /// Returns `AuthError::UsernameTaken` if a profile already uses the username.
    /// Returns `AuthError::ProfileNotCreated` if the identity was created but
    /// the profile insert failed.
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        avatar_url: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let form = SignUp::validate(username, password, avatar_url)?;

        if self.backend.profiles().username_exists(&form.username).await? {
            tracing::info!(username = %form.username, "Sign-up rejected: username taken");
            return Err(AuthError::UsernameTaken);
        }

        let outcome = self
            .backend
            .identity()
            .sign_up(&form.username, &form.password, form.avatar_url.as_ref())
            .await
            .map_err(|e| match e {
                BackendError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Backend(other),
            })?;

        let profile = Profile {
            id: outcome.user_id,
            username: form.username,
            avatar_url: form.avatar_url,
        };

        if let Err(source) = self
            .backend
            .profiles()
            .insert_profile(outcome.session.as_ref(), &profile)
            .await
        {
            tracing::error!(
                user_id = %outcome.user_id,
                username = %profile.username,
                error = %source,
                "Profile insert failed after identity creation; identity is orphaned"
            );
            return Err(AuthError::ProfileNotCreated {
                user_id: outcome.user_id,
                source,
            });
        }

        tracing::info!(user_id = %outcome.user_id, "User signed up");
        Ok(outcome)
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is malformed.
    /// Returns `AuthError::InvalidCredentials` if the pair is not accepted.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let form = SignIn::validate(username, password)?;

        let session = self
            .backend
            .identity()
            .sign_in(&form.username, &form.password)
            .await
            .map_err(|e| match e {
                BackendError::InvalidCredentials => AuthError::InvalidCredentials,
                other => AuthError::Backend(other),
            })?;

        tracing::info!(user_id = %session.user_id, "User signed in");
        Ok(session)
    }

    /// Revoke the session at the identity service.
    ///
    /// Best effort: a failure is logged and otherwise ignored, since the
    /// browser session is cleared either way.
    pub async fn sign_out(&self, session: &AuthSession) {
        if let Err(e) = self.backend.identity().sign_out(session).await {
            tracing::warn!(user_id = %session.user_id, error = %e, "Token revocation failed");
        }
        tracing::info!(user_id = %session.user_id, "User signed out");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use family_wishlist_core::{Username, UsernameError, ValidationError};

    use super::*;
    use crate::backend::InMemoryBackend;

    fn setup() -> (InMemoryBackend, Backend) {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        (store, backend)
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_session() {
        let (store, backend) = setup();
        let flow = IdentityFlow::new(&backend);

        let outcome = flow.sign_up("alice", "secret1", "").await.unwrap();

        assert!(outcome.session.is_some());
        let profile = store.profile(outcome.user_id).unwrap();
        assert_eq!(profile.username.as_str(), "alice");
        assert!(profile.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_spaces_before_backend() {
        let (store, backend) = setup();
        let flow = IdentityFlow::new(&backend);

        let result = flow.sign_up("alice smith", "secret1", "").await;

        assert!(matches!(
            result,
            Err(AuthError::Validation(ValidationError::Username(
                UsernameError::ContainsSpace
            )))
        ));
        assert!(!store.has_identity(&Username::parse("alice").unwrap()));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_non_image_avatar() {
        let (_, backend) = setup();
        let flow = IdentityFlow::new(&backend);

        let result = flow
            .sign_up("alice", "secret1", "https://example.com/me.gif")
            .await;
        assert!(matches!(
            result,
            Err(AuthError::Validation(ValidationError::AvatarUrl(_)))
        ));
    }

    #[tokio::test]
    async fn test_sign_up_username_taken() {
        let (_, backend) = setup();
        let flow = IdentityFlow::new(&backend);

        flow.sign_up("alice", "secret1", "").await.unwrap();
        let result = flow.sign_up("alice", "another1", "").await;

        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_profile_failure_reports_orphan() {
        let (store, backend) = setup();
        store.fail_profile_insert(true);
        let flow = IdentityFlow::new(&backend);

        let result = flow.sign_up("alice", "secret1", "").await;

        let Err(AuthError::ProfileNotCreated { user_id, .. }) = result else {
            panic!("expected ProfileNotCreated, got {result:?}");
        };
        assert!(store.has_identity(&Username::parse("alice").unwrap()));
        assert!(store.profile(user_id).is_none());
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let (_, backend) = setup();
        let flow = IdentityFlow::new(&backend);
        flow.sign_up("alice", "secret1", "").await.unwrap();

        let wrong = flow.sign_in("alice", "wrong-password").await;
        let unknown = flow.sign_in("bob", "secret1").await;

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_short_password_allowed() {
        let (_, backend) = setup();
        let flow = IdentityFlow::new(&backend);

        // Length is only enforced at sign-up; a short password is just wrong.
        let result = flow.sign_in("alice", "abc").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
