//! Flow model.
//!
//! Flows are automation rules attached to an app.

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::{require_id, Entity, Record, Reference};
use crate::error::Result;
use crate::session::Session;
use crate::traits::List;

/// A flow defined on an app.
#[derive(Debug, Clone)]
pub struct Flow {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for Flow {
    const KIND: &'static str = "Flow";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "flow_id")?;
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

impl Flow {
    pub fn flow_id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.field_str("name")
    }

    /// The trigger type (e.g. `item.create`).
    pub fn flow_type(&self) -> Option<&str> {
        self.field_str("type")
    }

    pub fn status(&self) -> Option<&str> {
        self.field_str("status")
    }
}

#[async_trait]
impl List for Flow {
    type Parent = Reference;
    type Query = ();

    #[tracing::instrument(skip(session, _query))]
    async fn list(session: &Session, reference: Reference, _query: &()) -> Result<Vec<Self>> {
        let path = format!("/flow/{}/{}/", reference.ref_type, reference.ref_id);
        let value: Value = session.get_json(&path).await?;
        Self::from_values(session, value)
    }
}
