//! List trait for fetching the entities under a parent.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Session;

/// List the entities that belong to a parent resource.
///
/// # Example
///
/// ```ignore
/// use podioapi::{App, List, Session, SpaceId};
///
/// let session = Session::from_env()?;
/// let apps = App::list(&session, SpaceId(42), &()).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// Identifies the parent (a space, an org, a widget reference).
    type Parent: Send;

    /// Filters accepted by the endpoint.
    type Query: Default + Send + Sync;

    /// List the parent's entities matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails validation or the request fails.
    async fn list(session: &Session, parent: Self::Parent, query: &Self::Query)
        -> Result<Vec<Self>>;
}
