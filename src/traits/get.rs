//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Session;

/// Fetch a single entity by ID.
///
/// Implement this trait for entity types that Podio serves individually
/// by a numeric identifier.
///
/// # Example
///
/// ```ignore
/// use podioapi::{Get, Session, Space};
///
/// let session = Session::from_env()?;
/// let space = Space::get(&session, 42).await?;
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id: Send;

    /// Fetch the entity by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn get(session: &Session, id: Self::Id) -> Result<Self>;
}
