//! Mock Podio API server.
//!
//! Provides an axum-based HTTP server that simulates the Podio API,
//! including the OAuth token endpoint.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

/// A mock Podio API server for testing.
///
/// The server runs in the background; point a [`crate::Session`] at
/// [`MockServer::url`] and use the client credentials of its state.
pub struct MockServer {
    url: String,
    handle: JoinHandle<()>,
    /// Shared state that can be inspected or modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with the default scenario.
    ///
    /// The server listens on a random available port and returns immediately.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario()).await
    }

    /// Start a mock server with empty state.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        let api = Router::new()
            // Organizations
            .route("/org/", get(handlers::list_orgs))
            .route("/org/url", get(handlers::get_org_by_url))
            // Spaces and members
            .route("/space/", post(handlers::create_space))
            .route("/space/:space_id", get(handlers::get_space))
            .route("/space/org/:org_id/", get(handlers::list_org_spaces))
            .route("/space/:space_id/member/", get(handlers::list_members))
            .route("/space/:space_id/member", post(handlers::add_members))
            // Apps and items
            .route("/app/:app_id", get(handlers::get_app))
            .route("/app/space/:space_id", get(handlers::list_space_apps))
            .route("/app/:app_id/install", post(handlers::install_app))
            .route("/item/app/:app_id", post(handlers::create_item))
            .route("/item/app/:app_id/filter/", post(handlers::filter_items))
            .route("/item/app/:app_id/xlsx", get(handlers::export_items))
            // Files
            .route("/file", post(handlers::upload_file))
            .route("/file/:file_id", get(handlers::get_file))
            .route("/file/:file_id/copy", post(handlers::copy_file))
            .route("/file/space/:space_id", get(handlers::list_space_files))
            // Widgets, flows and embeds
            // Widget ids and ref types share the first segment.
            .route(
                "/widget/:ref_type",
                get(handlers::get_widget).delete(handlers::delete_widget),
            )
            .route("/widget/:ref_type/:ref_id", get(handlers::list_widgets))
            .route("/widget/:ref_type/:ref_id/", post(handlers::create_widget))
            .route("/flow/:ref_type/:ref_id/", get(handlers::list_flows))
            .route("/embed/", post(handlers::create_embed))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                handlers::require_token,
            ));

        Router::new()
            .route("/oauth/token", post(handlers::token))
            .route("/health", get(health_check))
            .merge(api)
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
