//! End-to-end test harness for Family Wishlist.
//!
//! [`TestApp::spawn`] serves the real router on an ephemeral port over the
//! in-memory backend. Each [`Browser`] is a `reqwest` client with its own
//! cookie jar that does not follow redirects, so tests can assert on
//! `Location` headers and play several family members at once.
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! let alice = app.browser();
//! alice.sign_up("alice", "secret1").await;
//! let page = alice.get("/").await;
//! ```

use std::net::{IpAddr, Ipv4Addr};

use reqwest::{Client, Response, redirect};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use family_wishlist_core::{UserId, Username};
use family_wishlist_web::{
    app,
    backend::{Backend, InMemoryBackend},
    config::{BackendConfig, WishlistConfig},
    state::AppState,
};

/// A running application instance.
pub struct TestApp {
    pub base_url: String,
    /// Direct handle on the backend tables and test hooks.
    pub store: InMemoryBackend,
    server: JoinHandle<()>,
    listener: JoinHandle<()>,
}

impl TestApp {
    /// Start the application on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);

        let config = WishlistConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: BackendConfig::Memory,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::with_backend(config, backend);
        let listener = state.sessions().spawn_listener();

        let tcp = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = tcp.local_addr().expect("Failed to read local address");

        let router = app(state);
        let server = tokio::spawn(async move {
            axum::serve(tcp, router).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            server,
            listener,
        }
    }

    /// A fresh browser with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn browser(&self) -> Browser {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Browser {
            client,
            base_url: self.base_url.clone(),
        }
    }

    /// Identity id for a registered username.
    ///
    /// # Panics
    ///
    /// Panics if the username is invalid or not registered.
    #[must_use]
    pub fn user_id(&self, username: &str) -> UserId {
        let username = Username::parse(username).expect("Invalid username");
        self.store
            .user_id(&username)
            .expect("Username is not registered")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
        self.listener.abort();
    }
}

/// One browser: a client with its own cookies.
#[derive(Clone)]
pub struct Browser {
    client: Client,
    base_url: String,
}

impl Browser {
    /// # Panics
    ///
    /// Panics if the request fails at the transport level.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }

    /// # Panics
    ///
    /// Panics if the request fails at the transport level.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Register and sign in.
    pub async fn sign_up(&self, username: &str, password: &str) -> Response {
        self.post(
            "/auth/register",
            &[
                ("username", username),
                ("password", password),
                ("avatar_url", ""),
            ],
        )
        .await
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Response {
        self.post(
            "/auth/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Submit the create form with a title and a price.
    pub async fn add_wish(&self, title: &str, price: &str) -> Response {
        self.post("/items", &[("title", title), ("price", price)])
            .await
    }

    /// Body of a `GET` that must succeed.
    ///
    /// # Panics
    ///
    /// Panics unless the response is `200 OK`.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path} did not render");
        response.text().await.expect("Failed to read body")
    }
}

/// `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response is not a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    assert!(
        response.status().is_redirection(),
        "expected a redirect, got {}",
        response.status()
    );
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("Redirect without Location")
        .to_string()
}
