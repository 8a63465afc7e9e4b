//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic Podio records.

use serde_json::{json, Value};

use crate::Record;

use super::state::MockState;

/// Username accepted by the default scenario.
pub const TEST_USERNAME: &str = "tester@example.com";
/// Password accepted by the default scenario.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Unwrap a `json!` object literal into a record.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be a JSON object, got {other}"),
    }
}

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    pub fn org(org_id: u64, name: &str, url_label: &str) -> Record {
        record(json!({
            "org_id": org_id,
            "name": name,
            "url_label": url_label,
            "url": format!("https://podio.com/{url_label}"),
            "type": "premium",
        }))
    }

    pub fn space(space_id: u64, org_id: u64, name: &str) -> Record {
        let label = name.to_lowercase().replace(' ', "-");
        record(json!({
            "space_id": space_id,
            "org_id": org_id,
            "name": name,
            "url_label": label,
            "privacy": "closed",
            "created_on": "2024-03-01 14:22:05",
        }))
    }

    pub fn app(app_id: u64, space_id: u64, name: &str) -> Record {
        record(json!({
            "app_id": app_id,
            "space_id": space_id,
            "status": "active",
            "url_label": name.to_lowercase(),
            "config": {"name": name, "item_name": "Item"},
        }))
    }

    pub fn item(item_id: u64, app_id: u64, title: &str) -> Record {
        record(json!({
            "item_id": item_id,
            "app_id": app_id,
            "app_item_id": item_id,
            "title": title,
            "fields": [],
            "created_on": "2024-03-02 09:00:00",
        }))
    }

    pub fn file(file_id: u64, space_id: u64, name: &str, mimetype: &str) -> Record {
        record(json!({
            "file_id": file_id,
            "space_id": space_id,
            "name": name,
            "mimetype": mimetype,
            "size": 1024,
            "hosted_by": "podio",
            "link": format!("https://files.podio.com/{file_id}"),
        }))
    }

    pub fn widget(widget_id: u64, ref_type: &str, ref_id: u64, widget_type: &str, title: &str) -> Record {
        record(json!({
            "widget_id": widget_id,
            "ref": {"type": ref_type, "id": ref_id},
            "type": widget_type,
            "title": title,
            "config": {"text": "Hello"},
        }))
    }

    pub fn flow(flow_id: u64, app_id: u64, name: &str) -> Record {
        record(json!({
            "flow_id": flow_id,
            "ref": {"type": "app", "id": app_id},
            "name": name,
            "type": "item.create",
            "status": "active",
        }))
    }

    pub fn member(user_id: u64, name: &str, role: &str) -> Record {
        record(json!({
            "user": {"user_id": user_id},
            "profile": {"name": name},
            "role": role,
        }))
    }

    // =========================================================================
    // Scenario Builders
    // =========================================================================

    /// One org with a space, two apps and assorted attached records.
    ///
    /// Org 1 (`acme`) holds space 42 (`Engineering`), which holds apps
    /// 100 and 101. The default user and password are accepted.
    pub fn default_scenario() -> MockState {
        let mut state = MockState::new()
            .with_user(TEST_USERNAME, TEST_PASSWORD)
            .with_org(Self::org(1, "Acme", "acme"))
            .with_space(Self::space(42, 1, "Engineering"))
            .with_space(Self::space(43, 1, "Sales"))
            .with_app(Self::app(100, 42, "Bugs"))
            .with_app(Self::app(101, 42, "Releases"))
            .with_file(Self::file(500, 42, "design.pdf", "application/pdf"))
            .with_file(Self::file(501, 42, "logo.png", "image/png"))
            .with_widget(Self::widget(700, "space", 42, "text", "Welcome"))
            .with_flow(Self::flow(800, 100, "Notify on new bug"))
            .with_member(42, Self::member(7, "Ada", "admin"))
            .with_member(42, Self::member(8, "Grace", "regular"));

        for n in 0..45 {
            let item = Self::item(2000 + n, 100, &format!("Bug {n}"));
            state.items.insert(2000 + n, item);
        }
        state
    }
}
