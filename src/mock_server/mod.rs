//! Mock Podio API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the Podio
//! API, token endpoint included. Unlike wiremock, which mocks at the HTTP
//! level per test, this server keeps state across requests, so workflows
//! such as "create a space, then list it" behave as they would remotely.
//!
//! # Example
//!
//! ```ignore
//! use podioapi::mock_server::{MockServer, TEST_PASSWORD, TEST_USERNAME};
//! use podioapi::{Credentials, Get, Session, Space};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let credentials = Credentials::new("test-client", "test-secret")
//!         .with_password(TEST_USERNAME, TEST_PASSWORD);
//!     let session = Session::builder(credentials)
//!         .base_url(server.url())
//!         .build()
//!         .unwrap();
//!
//!     let space = Space::get(&session, 42).await.unwrap();
//!     assert_eq!(space.name(), Some("Engineering"));
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{record, Fixtures, TEST_PASSWORD, TEST_USERNAME};
pub use server::MockServer;
pub use state::MockState;
