//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, referrer policy)
//! 5. Session layer (tower-sessions with a bounded `moka` store)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_store;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAuth, clear_auth_session, set_auth_session,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use session_store::MokaSessionStore;
