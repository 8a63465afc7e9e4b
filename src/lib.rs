//! Podio API client library.
//!
//! An async Rust library for the Podio REST API. A [`Session`] owns the
//! OAuth2 credentials and the connection pool; entity types such as
//! [`Organization`], [`Space`] and [`App`] wrap the JSON records Podio
//! returns and expose further operations scoped by their own id.
//!
//! # Quick Start
//!
//! ```no_run
//! use podioapi::{Credentials, Organization, Session};
//!
//! #[tokio::main]
//! async fn main() -> podioapi::Result<()> {
//!     let credentials = Credentials::new("client-id", "client-secret")
//!         .with_password("me@example.com", "password");
//!     let session = Session::new(credentials)?;
//!
//!     // The first call authenticates.
//!     let org = Organization::get_by_url(&session, "my-org").await?;
//!
//!     for space in org.spaces().await? {
//!         println!("{}", space.name().unwrap_or("<unnamed>"));
//!         for app in space.apps().await? {
//!             println!("  {}", app.name().unwrap_or("<unnamed>"));
//!         }
//!     }
//!
//!     // Keep the refresh token to skip the password grant next time.
//!     let refresh_token = session.refresh_token().await;
//!     println!("refresh token known: {}", refresh_token.is_some());
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Session::call`] sends every request. It authenticates lazily and
//!   runs each response through a single error check; a failed response
//!   drops the token so the next call logs in again.
//! - [`Entity`] is the wrapping contract: the record plus the session.
//! - [`Get`] and [`List`] are implemented by entities that can be fetched
//!   by id or by parent.
//!
//! # Configuration
//!
//! [`Session::from_env`] reads:
//!
//! - `PODIO_CLIENT_ID`, `PODIO_CLIENT_SECRET` (required)
//! - `PODIO_REFRESH_TOKEN`, `PODIO_USERNAME`, `PODIO_PASSWORD` (optional)
//! - `PODIO_API_URL` (optional, defaults to `https://api.podio.com`)

mod auth;
mod entity;
mod error;
mod models;
mod pagination;
mod session;
mod traits;

#[cfg(feature = "test-server")]
pub mod mock_server;

pub use auth::Credentials;
pub use entity::{AppId, Entity, Record, RefType, Reference, SpaceId, UserId};
pub use error::{PodioError, Result};
pub use pagination::{Page, PaginationParams};
pub use session::{RequestOptions, Session, SessionBuilder, SessionState};

pub use traits::{Get, List};

pub use models::{
    // Apps and items
    App,
    EmbedValue,
    Item,
    ItemFilter,
    NewItem,
    LINK_EMBED,
    // Embeds
    Embed,
    // Files
    File,
    FileListQuery,
    FileSource,
    // Flows
    Flow,
    // Members
    Member,
    MemberInvite,
    MEMBER_ROLES,
    // Organizations and spaces
    NewSpace,
    Organization,
    Privacy,
    Space,
    // Widgets
    Widget,
    WIDGET_TYPES,
};

pub use models::required_config;
