//! Embed model.
//!
//! An embed is Podio's stored preview of an external URL; items and
//! comments reference embeds by id.

use serde::Serialize;
use serde_json::Value;

use crate::entity::{require_id, Entity, Record};
use crate::error::Result;
use crate::session::Session;

/// A link embedded into Podio.
#[derive(Debug, Clone)]
pub struct Embed {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for Embed {
    const KIND: &'static str = "Embed";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "embed_id")?;
        Ok(Self { session, id, data })
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn data(&self) -> &Record {
        &self.data
    }

    fn into_record(self) -> Record {
        self.data
    }
}

#[derive(Serialize)]
struct EmbedRequest {
    url: String,
}

impl Embed {
    /// Create an embed for `url`.
    #[tracing::instrument(skip(session))]
    pub async fn create(session: &Session, url: &str) -> Result<Self> {
        let request = EmbedRequest {
            url: url.to_string(),
        };
        let value: Value = session.post_json("/embed/", request).await?;
        Self::from_value(session, value)
    }

    pub fn embed_id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> Option<&str> {
        self.field_str("original_url").or_else(|| self.field_str("url"))
    }

    /// The embed kind Podio detected (`link`, `image`, `video`, ...).
    pub fn embed_type(&self) -> Option<&str> {
        self.field_str("type")
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("title")
    }
}
