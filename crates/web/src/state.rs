//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{Backend, BackendError};
use crate::config::WishlistConfig;
use crate::services::{IdentityFlow, InFlightRegistry, SessionController, WishlistCommands};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WishlistConfig,
    backend: Backend,
    sessions: SessionController,
    in_flight: InFlightRegistry,
}

impl AppState {
    /// Create the state with the backend named in the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: WishlistConfig) -> Result<Self, BackendError> {
        let backend = Backend::from_config(&config.backend)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Create the state around an existing backend.
    #[must_use]
    pub fn with_backend(config: WishlistConfig, backend: Backend) -> Self {
        let sessions = SessionController::new(backend.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                sessions,
                in_flight: InFlightRegistry::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WishlistConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Session controller holding per-user read models.
    #[must_use]
    pub fn sessions(&self) -> &SessionController {
        &self.inner.sessions
    }

    #[must_use]
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.inner.in_flight
    }

    /// Sign-up, sign-in and sign-out.
    #[must_use]
    pub fn identity(&self) -> IdentityFlow<'_> {
        IdentityFlow::new(&self.inner.backend)
    }

    /// Item mutations for the current request.
    #[must_use]
    pub fn commands(&self) -> WishlistCommands<'_> {
        WishlistCommands::new(
            &self.inner.backend,
            &self.inner.sessions,
            &self.inner.in_flight,
        )
    }
}
