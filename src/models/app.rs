//! App model.
//!
//! Apps are the tables of a space; items are their rows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{require_id, AppId, Entity, Record, RefType, Reference, SpaceId};
use crate::error::Result;
use crate::models::embed::Embed;
use crate::models::flow::Flow;
use crate::models::item::{FilteredItems, Item, ItemFilter, NewItem};
use crate::models::widget::Widget;
use crate::pagination::{collect_all, Page};
use crate::session::Session;
use crate::traits::{Get, List};

/// An app within a space.
#[derive(Debug, Clone)]
pub struct App {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for App {
    const KIND: &'static str = "App";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "app_id")?;
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

impl From<&App> for AppId {
    fn from(app: &App) -> Self {
        AppId(app.id)
    }
}

#[derive(Serialize)]
struct InstallRequest {
    space_id: SpaceId,
}

#[derive(Deserialize)]
struct AppRef {
    app_id: u64,
}

impl App {
    pub fn app_id(&self) -> AppId {
        AppId(self.id)
    }

    pub fn space_id(&self) -> Option<SpaceId> {
        self.field_u64("space_id").map(SpaceId)
    }

    /// The app name from its config.
    pub fn name(&self) -> Option<&str> {
        self.field("config")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
    }

    pub fn url_label(&self) -> Option<&str> {
        self.field_str("url_label")
    }

    fn reference(&self) -> Reference {
        Reference::new(RefType::App, self.id)
    }

    /// List the apps of a space.
    ///
    /// The listing endpoint returns abbreviated records, so each app is
    /// fetched again by id.
    #[tracing::instrument(skip(session, space))]
    pub async fn list_by_space(session: &Session, space: impl Into<SpaceId>) -> Result<Vec<Self>> {
        let space_id = space.into();
        let summaries: Vec<AppRef> = session.get_json(&format!("/app/space/{space_id}")).await?;

        let mut apps = Vec::with_capacity(summaries.len());
        for summary in summaries {
            apps.push(Self::get(session, summary.app_id).await?);
        }
        Ok(apps)
    }

    /// Install a copy of this app into `space` and fetch the copy.
    #[tracing::instrument(skip(self, space), fields(app_id = self.id))]
    pub async fn copy(&self, space: impl Into<SpaceId>) -> Result<Self> {
        let request = InstallRequest {
            space_id: space.into(),
        };
        let installed: AppRef = self
            .session
            .post_json(&format!("/app/{}/install", self.id), request)
            .await?;
        Self::get(&self.session, installed.app_id).await
    }

    /// Flows defined on this app.
    pub async fn flows(&self) -> Result<Vec<Flow>> {
        Flow::list(&self.session, self.reference(), &()).await
    }

    pub async fn widgets(&self) -> Result<Vec<Widget>> {
        Widget::list(&self.session, self.reference(), &()).await
    }

    pub async fn add_widget(&self, widget_type: &str, title: &str, config: Record) -> Result<Widget> {
        Widget::add(&self.session, self.reference(), widget_type, title, config).await
    }

    /// Create an item in this app.
    ///
    /// Link embeds are registered through `/embed/` first and the field
    /// value replaced by the embed id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PodioError::Unsupported`] for any embed kind other
    /// than `link`, before any request is made.
    #[tracing::instrument(skip(self, item), fields(app_id = self.id))]
    pub async fn add_item(&self, item: NewItem) -> Result<Item> {
        item.check_embeds()?;

        let mut embed_ids = Vec::with_capacity(item.embeds().len());
        for embed in item.embeds() {
            let created = Embed::create(&self.session, &embed.url).await?;
            embed_ids.push((embed.field.clone(), created.embed_id()));
        }

        let payload = item.into_payload(&embed_ids);
        let value: Value = self
            .session
            .post_json(&format!("/item/app/{}", self.id), payload)
            .await?;
        Item::from_value(&self.session, value)
    }

    /// Fetch one page of items matching `filter`.
    #[tracing::instrument(skip(self), fields(app_id = self.id))]
    pub async fn filter_items(&self, filter: &ItemFilter) -> Result<Page<Item>> {
        let response: FilteredItems = self
            .session
            .post_json(&format!("/item/app/{}/filter/", self.id), filter.clone())
            .await?;

        tracing::debug!(total = ?response.total, filtered = ?response.filtered, "items filtered");
        let items = response
            .items
            .into_iter()
            .map(|value| Item::from_value(&self.session, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, filter.pagination(), response.filtered))
    }

    /// Fetch every item matching `filter`, starting at its offset.
    pub async fn filter_all_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        collect_all(filter.pagination(), |params| {
            let filter = filter.clone().page(params);
            async move { self.filter_items(&filter).await }
        })
        .await
    }

    /// Export all items as an Excel workbook.
    #[tracing::instrument(skip(self), fields(app_id = self.id))]
    pub async fn export_xlsx(&self) -> Result<Vec<u8>> {
        let response = self
            .session
            .get(&format!("/item/app/{}/xlsx", self.id))
            .await?;
        let bytes = response.bytes().await.map_err(crate::PodioError::transport)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Get for App {
    type Id = u64;

    #[tracing::instrument(skip(session))]
    async fn get(session: &Session, app_id: u64) -> Result<Self> {
        let value: Value = session.get_json(&format!("/app/{app_id}")).await?;
        Self::from_value(session, value)
    }
}

#[async_trait]
impl List for App {
    type Parent = SpaceId;
    type Query = ();

    async fn list(session: &Session, space: SpaceId, _query: &()) -> Result<Vec<Self>> {
        Self::list_by_space(session, space).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use serde_json::json;

    #[test]
    fn test_app_accessors() {
        let session = Session::new(Credentials::new("id", "secret")).unwrap();
        let app = App::from_value(
            &session,
            json!({"app_id": 3, "space_id": 42, "config": {"name": "Leads"}, "url_label": "leads"}),
        )
        .unwrap();

        assert_eq!(AppId::from(&app), AppId(3));
        assert_eq!(app.space_id(), Some(SpaceId(42)));
        assert_eq!(app.name(), Some("Leads"));
        assert_eq!(app.reference(), Reference::new(RefType::App, 3));
    }

    #[test]
    fn test_install_body() {
        let body = serde_json::to_value(InstallRequest {
            space_id: SpaceId(9),
        })
        .unwrap();
        assert_eq!(body, json!({"space_id": 9}));
    }
}
