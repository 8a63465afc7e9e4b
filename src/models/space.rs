//! Space model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{require_id, Entity, Record, RefType, Reference, SpaceId};
use crate::error::Result;
use crate::models::app::App;
use crate::models::file::{File, FileListQuery};
use crate::models::member::{Member, MemberInvite};
use crate::models::widget::Widget;
use crate::session::Session;
use crate::traits::{Get, List};

/// A workspace within an organization.
#[derive(Debug, Clone)]
pub struct Space {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for Space {
    const KIND: &'static str = "Space";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "space_id")?;
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

impl From<&Space> for SpaceId {
    fn from(space: &Space) -> Self {
        space.space_id()
    }
}

/// Who may see and join a space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Open,
    #[default]
    Closed,
}

/// Settings for a new space.
#[derive(Debug, Clone, Serialize)]
pub struct NewSpace {
    pub name: String,
    pub privacy: Privacy,
    /// Whether new employees of the org join automatically.
    pub auto_join: bool,
    /// Post to the stream when an app is added.
    pub new_app_post: bool,
    /// Post to the stream when a member joins.
    pub new_member_post: bool,
}

impl NewSpace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privacy: Privacy::default(),
            auto_join: false,
            new_app_post: false,
            new_member_post: false,
        }
    }

    #[must_use]
    pub fn privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }

    #[must_use]
    pub fn auto_join(mut self, auto_join: bool) -> Self {
        self.auto_join = auto_join;
        self
    }

    #[must_use]
    pub fn new_app_post(mut self, enabled: bool) -> Self {
        self.new_app_post = enabled;
        self
    }

    #[must_use]
    pub fn new_member_post(mut self, enabled: bool) -> Self {
        self.new_member_post = enabled;
        self
    }
}

#[derive(Serialize)]
struct CreateSpaceRequest {
    org_id: u64,
    #[serde(flatten)]
    space: NewSpace,
}

#[derive(Deserialize)]
struct CreatedSpace {
    space_id: u64,
}

impl Space {
    pub fn space_id(&self) -> SpaceId {
        SpaceId(self.id)
    }

    pub fn name(&self) -> Option<&str> {
        self.field_str("name")
    }

    pub fn url(&self) -> Option<&str> {
        self.field_str("url")
    }

    pub fn url_label(&self) -> Option<&str> {
        self.field_str("url_label")
    }

    pub fn org_id(&self) -> Option<u64> {
        self.field_u64("org_id")
    }

    pub fn privacy(&self) -> Option<Privacy> {
        self.field("privacy")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn created_on(&self) -> Option<chrono::NaiveDateTime> {
        self.field_timestamp("created_on")
    }

    fn widget_ref(&self) -> Reference {
        Reference::new(RefType::Space, self.id)
    }

    /// List the spaces of an organization the user can see.
    #[tracing::instrument(skip(session))]
    pub async fn list_by_org(session: &Session, org_id: u64) -> Result<Vec<Self>> {
        let value: Value = session.get_json(&format!("/space/org/{org_id}/")).await?;
        Self::from_values(session, value)
    }

    /// Create a space in `org_id` and fetch it.
    #[tracing::instrument(skip(session))]
    pub async fn create(session: &Session, org_id: u64, space: NewSpace) -> Result<Self> {
        let request = CreateSpaceRequest { org_id, space };
        let created: CreatedSpace = session.post_json("/space/", request).await?;
        Self::get(session, created.space_id).await
    }

    pub async fn apps(&self) -> Result<Vec<App>> {
        App::list_by_space(&self.session, self).await
    }

    pub async fn widgets(&self) -> Result<Vec<Widget>> {
        Widget::list(&self.session, self.widget_ref(), &()).await
    }

    pub async fn add_widget(&self, widget_type: &str, title: &str, config: Record) -> Result<Widget> {
        Widget::add(&self.session, self.widget_ref(), widget_type, title, config).await
    }

    /// List one page of this space's files.
    pub async fn files(&self, query: &FileListQuery) -> Result<Vec<File>> {
        File::list_space_files(&self.session, self, query).await
    }

    pub async fn members(&self) -> Result<Vec<Member>> {
        Member::list_by_space(&self.session, self).await
    }

    /// Invite users to this space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PodioError::Validation`] for an unknown role or an
    /// invitation with nobody to invite, without contacting the API.
    #[tracing::instrument(skip(self, invite), fields(space_id = self.id))]
    pub async fn add_member(&self, invite: MemberInvite) -> Result<()> {
        invite.validate()?;
        self.session
            .post(&format!("/space/{}/member", self.id), invite)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Get for Space {
    type Id = u64;

    #[tracing::instrument(skip(session))]
    async fn get(session: &Session, space_id: u64) -> Result<Self> {
        let value: Value = session.get_json(&format!("/space/{space_id}")).await?;
        Self::from_value(session, value)
    }
}

#[async_trait]
impl List for Space {
    type Parent = u64;
    type Query = ();

    async fn list(session: &Session, org_id: u64, _query: &()) -> Result<Vec<Self>> {
        Self::list_by_org(session, org_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use serde_json::json;

    #[test]
    fn test_create_request_body() {
        let request = CreateSpaceRequest {
            org_id: 5,
            space: NewSpace::new("Eng").privacy(Privacy::Open).auto_join(true),
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "org_id": 5,
                "name": "Eng",
                "privacy": "open",
                "auto_join": true,
                "new_app_post": false,
                "new_member_post": false
            })
        );
    }

    #[test]
    fn test_space_accessors() {
        let session = Session::new(Credentials::new("id", "secret")).unwrap();
        let space = Space::from_value(
            &session,
            json!({"space_id": 42, "name": "Eng", "privacy": "closed", "org_id": 5}),
        )
        .unwrap();

        assert_eq!(SpaceId::from(&space), SpaceId(42));
        assert_eq!(space.name(), Some("Eng"));
        assert_eq!(space.privacy(), Some(Privacy::Closed));
        assert_eq!(space.org_id(), Some(5));
        assert_eq!(space.field("nonexistent"), None);
    }
}
