//! Widget model.
//!
//! Widgets are display components attached to a space, app, org or user.
//! Each widget type has a fixed set of required config properties; see
//! <https://developers.podio.com/doc/widgets>.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{require_id, Entity, Record, Reference};
use crate::error::{PodioError, Result};
use crate::session::Session;
use crate::traits::{Get, List};

/// Widget types and the config properties each one requires.
pub const WIDGET_TYPES: &[(&str, &[&str])] = &[
    ("text", &["text"]),
    ("image", &["file_id"]),
    ("link", &["links"]),
    ("tag_cloud", &["limit"]),
    ("calculation", &["app_id", "app_link", "calculation", "unit"]),
    ("tasks", &["kind", "limit"]),
    ("events", &["limit"]),
    ("profiles", &["limit"]),
    ("apps", &["limit"]),
    ("app_view", &["view_id", "limit"]),
    ("contacts", &["limit"]),
    ("files", &["limit"]),
];

/// A widget on a space, app, org or user.
#[derive(Debug, Clone)]
pub struct Widget {
    session: Session,
    id: u64,
    reference: Option<Reference>,
    data: Record,
}

impl Entity for Widget {
    const KIND: &'static str = "Widget";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "widget_id")?;
        let reference = data.get("ref").and_then(Reference::from_json);
        Ok(Self {
            session,
            id,
            reference,
            data,
        })
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
struct WidgetPayload {
    #[serde(rename = "type")]
    widget_type: String,
    title: String,
    config: Record,
}

#[derive(Deserialize)]
struct CreatedWidget {
    widget_id: u64,
}

impl Widget {
    pub fn widget_id(&self) -> u64 {
        self.id
    }

    /// The object this widget is attached to, when known.
    pub fn reference(&self) -> Option<Reference> {
        self.reference
    }

    pub fn widget_type(&self) -> Option<&str> {
        self.field_str("type")
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("title")
    }

    pub fn config(&self) -> Option<&Record> {
        self.field("config").and_then(Value::as_object)
    }

    /// Add a widget to `reference`.
    ///
    /// `config` must hold every property the widget type requires; entries
    /// whose value is `null` are dropped before sending.
    ///
    /// When adding images, the file must not already back another widget.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Validation`] for an unknown type or missing
    /// config properties, without contacting the API.
    #[tracing::instrument(skip(session, config))]
    pub async fn add(
        session: &Session,
        reference: Reference,
        widget_type: &str,
        title: &str,
        config: Record,
    ) -> Result<Self> {
        validate_widget(widget_type, &config)?;
        let config = strip_nulls(config);

        let payload = WidgetPayload {
            widget_type: widget_type.to_string(),
            title: title.to_string(),
            config: config.clone(),
        };

        let path = format!("/widget/{}/{}/", reference.ref_type, reference.ref_id);
        let created: CreatedWidget = session.post_json(&path, payload).await?;

        let mut data = Record::new();
        data.insert("widget_id".to_string(), created.widget_id.into());
        data.insert("ref".to_string(), reference.to_json());
        data.insert("type".to_string(), widget_type.into());
        data.insert("title".to_string(), title.into());
        data.insert("config".to_string(), Value::Object(config));

        Ok(Self {
            session: session.clone(),
            id: created.widget_id,
            reference: Some(reference),
            data,
        })
    }

    /// Re-fetch the widget and overlay the returned fields.
    #[tracing::instrument(skip(self), fields(widget_id = self.id))]
    pub async fn refresh(&mut self) -> Result<()> {
        let fresh = Self::get(&self.session, self.id).await?;
        if fresh.reference.is_some() {
            self.reference = fresh.reference;
        }
        for (key, value) in fresh.data {
            self.data.insert(key, value);
        }
        Ok(())
    }

    /// Delete the widget remotely.
    #[tracing::instrument(skip(self), fields(widget_id = self.id))]
    pub async fn delete(&self) -> Result<()> {
        self.session
            .delete(&format!("/widget/{}", self.id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Get for Widget {
    type Id = u64;

    #[tracing::instrument(skip(session))]
    async fn get(session: &Session, widget_id: u64) -> Result<Self> {
        let value: Value = session.get_json(&format!("/widget/{widget_id}")).await?;
        Self::from_value(session, value)
    }
}

#[async_trait]
impl List for Widget {
    type Parent = Reference;
    type Query = ();

    #[tracing::instrument(skip(session, _query))]
    async fn list(session: &Session, reference: Reference, _query: &()) -> Result<Vec<Self>> {
        let path = format!("/widget/{}/{}", reference.ref_type, reference.ref_id);
        let value: Value = session.get_json(&path).await?;

        let mut widgets = Self::from_values(session, value)?;
        for widget in &mut widgets {
            widget.reference.get_or_insert(reference);
        }
        Ok(widgets)
    }
}

/// Required config properties for a widget type.
pub fn required_config(widget_type: &str) -> Option<&'static [&'static str]> {
    WIDGET_TYPES
        .iter()
        .find(|(name, _)| *name == widget_type)
        .map(|(_, props)| *props)
}

fn validate_widget(widget_type: &str, config: &Record) -> Result<()> {
    let required = required_config(widget_type).ok_or_else(|| {
        let valid: Vec<&str> = WIDGET_TYPES.iter().map(|(name, _)| *name).collect();
        PodioError::Validation(format!(
            "Not a valid widget type. Valid widget types are {}",
            quoted_list(&valid)
        ))
    })?;

    if required.iter().all(|prop| config.contains_key(*prop)) {
        Ok(())
    } else {
        Err(PodioError::Validation(format!(
            "Widget config must contain the following properties: {}",
            quoted_list(required)
        )))
    }
}

fn strip_nulls(config: Record) -> Record {
    config.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

fn quoted_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_unknown_widget_type() {
        let err = validate_widget("carousel", &Record::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Not a valid widget type"));
        assert!(msg.contains("\"calculation\""));
    }

    #[test]
    fn test_missing_required_config() {
        let config = record(json!({"app_id": 1, "calculation": "sum"}));
        let err = validate_widget("calculation", &config).unwrap_err();
        assert!(matches!(err, PodioError::Validation(_)));
        assert!(err.to_string().contains("\"app_link\""));
    }

    #[test]
    fn test_null_valued_keys_count_as_present() {
        let config = record(json!({"kind": null, "limit": 5}));
        assert!(validate_widget("tasks", &config).is_ok());
        assert_eq!(strip_nulls(config), record(json!({"limit": 5})));
    }

    #[test]
    fn test_required_config_lookup() {
        assert_eq!(required_config("app_view"), Some(&["view_id", "limit"][..]));
        assert_eq!(required_config("nope"), None);
    }
}
