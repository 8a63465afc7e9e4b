//! Organization model.

use serde_json::Value;

use crate::entity::{require_id, Entity, Record};
use crate::error::Result;
use crate::models::space::{NewSpace, Space};
use crate::session::Session;

/// Public web host that organization URL labels hang off.
const PODIO_WEB_URL: &str = "https://podio.com/";

/// An organization, the top-level container of spaces.
#[derive(Debug, Clone)]
pub struct Organization {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for Organization {
    const KIND: &'static str = "Organization";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "org_id")?;
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

impl Organization {
    pub fn org_id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.field_str("name")
    }

    /// The label used in the org's web URL (`https://podio.com/{label}`).
    pub fn url_label(&self) -> Option<&str> {
        self.field_str("url_label")
    }

    /// Look up an organization by the label in its web URL.
    #[tracing::instrument(skip(session))]
    pub async fn get_by_url(session: &Session, url_label: &str) -> Result<Self> {
        let org_url = format!("{PODIO_WEB_URL}{url_label}");
        let response = session
            .get_with_query("/org/url", [("url", org_url)])
            .await?;
        let value: Value = Session::read_json(response).await?;

        let mut org = Self::from_value(session, value)?;
        org.data
            .entry("url_label")
            .or_insert_with(|| Value::String(url_label.to_string()));
        Ok(org)
    }

    /// Every organization the user belongs to.
    #[tracing::instrument(skip(session))]
    pub async fn list(session: &Session) -> Result<Vec<Self>> {
        let value: Value = session.get_json("/org/").await?;
        Self::from_values(session, value)
    }

    pub async fn spaces(&self) -> Result<Vec<Space>> {
        Space::list_by_org(&self.session, self.id).await
    }

    /// Create a space in this organization.
    pub async fn new_space(&self, space: NewSpace) -> Result<Space> {
        Space::create(&self.session, self.id, space).await
    }
}
