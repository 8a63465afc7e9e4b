//! Item model and the payloads used to create and filter items.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::entity::{require_id, Entity, Record};
use crate::error::{PodioError, Result};
use crate::pagination::PaginationParams;
use crate::session::Session;

/// The only embed kind that can be attached when creating an item.
pub const LINK_EMBED: &str = "link";

/// An item (row) in an app.
#[derive(Debug, Clone)]
pub struct Item {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for Item {
    const KIND: &'static str = "Item";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "item_id")?;
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

impl Item {
    pub fn item_id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("title")
    }

    /// The per-app sequential id shown in the Podio UI.
    pub fn app_item_id(&self) -> Option<u64> {
        self.field_u64("app_item_id")
    }

    pub fn external_id(&self) -> Option<&str> {
        self.field_str("external_id")
    }

    pub fn link(&self) -> Option<&str> {
        self.field_str("link")
    }
}

/// An external URL to attach to an item field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedValue {
    pub field: String,
    pub kind: String,
    pub url: String,
}

/// Fields for a new item.
///
/// Field values are keyed by field external id or field id, exactly as
/// Podio expects them in the `fields` object.
///
/// ```
/// use podioapi::NewItem;
///
/// let item = NewItem::new()
///     .field("title", "Quarterly report")
///     .embed_link("source", "https://example.com/report")
///     .tags(["finance"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    fields: Record,
    embeds: Vec<EmbedValue>,
    external_id: Option<String>,
    tags: Vec<String>,
}

impl NewItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach a link embed to `field`.
    #[must_use]
    pub fn embed_link(self, field: impl Into<String>, url: impl Into<String>) -> Self {
        self.embed(field, LINK_EMBED, url)
    }

    /// Attach an embed of the given kind to `field`.
    ///
    /// Only [`LINK_EMBED`] can be sent; other kinds are rejected when the
    /// item is added.
    #[must_use]
    pub fn embed(
        mut self,
        field: impl Into<String>,
        kind: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.embeds.push(EmbedValue {
            field: field.into(),
            kind: kind.into(),
            url: url.into(),
        });
        self
    }

    #[must_use]
    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub(crate) fn embeds(&self) -> &[EmbedValue] {
        &self.embeds
    }

    /// Reject embed kinds that cannot be sent.
    pub(crate) fn check_embeds(&self) -> Result<()> {
        match self.embeds.iter().find(|e| e.kind != LINK_EMBED) {
            Some(embed) => Err(PodioError::Unsupported(format!(
                "embed kind \"{}\" on field \"{}\" is not supported; only \"{}\" embeds can be attached",
                embed.kind, embed.field, LINK_EMBED
            ))),
            None => Ok(()),
        }
    }

    /// Build the request body, with each embed replaced by its embed id.
    pub(crate) fn into_payload(self, embed_ids: &[(String, u64)]) -> ItemPayload {
        let mut fields = self.fields;
        for (field, embed_id) in embed_ids {
            fields.insert(field.clone(), serde_json::json!({ "embed": embed_id }));
        }
        ItemPayload {
            fields,
            external_id: self.external_id,
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags)
            },
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub(crate) struct ItemPayload {
    fields: Record,
    external_id: Option<String>,
    tags: Option<Vec<String>>,
}

/// Body of `POST /item/app/{app_id}/filter/`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ItemFilter {
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    /// Filter definitions keyed by field id or filter key.
    pub filters: Option<Record>,
    pub limit: u32,
    pub offset: u32,
    /// Whether Podio should remember this view for the user.
    pub remember: Option<bool>,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            sort_by: None,
            sort_desc: None,
            filters: None,
            limit: 30,
            offset: 0,
            remember: None,
        }
    }
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sort_by(mut self, key: impl Into<String>, descending: bool) -> Self {
        self.sort_by = Some(key.into());
        self.sort_desc = Some(descending);
        self
    }

    /// Add a filter on `key`.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .get_or_insert_with(Record::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn page(mut self, params: PaginationParams) -> Self {
        self.limit = params.limit;
        self.offset = params.offset;
        self
    }

    pub(crate) fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.limit, self.offset)
    }
}

/// Response of the filter endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct FilteredItems {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub filtered: Option<u64>,
    pub items: Vec<Value>,
}
