//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Podio API server.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::Record;

/// First id handed out for records created through the API.
const FIRST_GENERATED_ID: u64 = 10_000;

/// Shared state for the mock server.
///
/// Records are stored as the JSON objects the real API would return,
/// indexed by their numeric id.
#[derive(Debug)]
pub struct MockState {
    /// OAuth client accepted by the token endpoint.
    pub client_id: String,
    pub client_secret: String,

    /// Username to password for the password grant.
    pub users: HashMap<String, String>,
    /// Refresh tokens that are currently valid.
    pub refresh_tokens: HashSet<String>,
    /// Access tokens that are currently valid.
    pub access_tokens: HashSet<String>,
    /// Grant types of every token request received, in order.
    pub token_requests: Vec<String>,

    pub orgs: BTreeMap<u64, Record>,
    pub spaces: BTreeMap<u64, Record>,
    pub apps: BTreeMap<u64, Record>,
    pub items: BTreeMap<u64, Record>,
    pub files: BTreeMap<u64, Record>,
    pub widgets: BTreeMap<u64, Record>,
    pub flows: BTreeMap<u64, Record>,
    pub embeds: BTreeMap<u64, Record>,
    /// Membership records indexed by space id.
    pub members: HashMap<u64, Vec<Record>>,
    /// Bodies of every member invitation, indexed by space id.
    pub invitations: HashMap<u64, Vec<Value>>,

    next_id: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            users: HashMap::new(),
            refresh_tokens: HashSet::new(),
            access_tokens: HashSet::new(),
            token_requests: Vec::new(),
            orgs: BTreeMap::new(),
            spaces: BTreeMap::new(),
            apps: BTreeMap::new(),
            items: BTreeMap::new(),
            files: BTreeMap::new(),
            widgets: BTreeMap::new(),
            flows: BTreeMap::new(),
            embeds: BTreeMap::new(),
            members: HashMap::new(),
            invitations: HashMap::new(),
            next_id: FIRST_GENERATED_ID,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Accept `username`/`password` on the password grant.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users.insert(username.to_string(), password.to_string());
        self
    }

    /// Accept `token` on the refresh-token grant.
    pub fn with_refresh_token(mut self, token: &str) -> Self {
        self.refresh_tokens.insert(token.to_string());
        self
    }

    pub fn with_org(mut self, org: Record) -> Self {
        insert_by(&mut self.orgs, "org_id", org);
        self
    }

    pub fn with_space(mut self, space: Record) -> Self {
        insert_by(&mut self.spaces, "space_id", space);
        self
    }

    pub fn with_app(mut self, app: Record) -> Self {
        insert_by(&mut self.apps, "app_id", app);
        self
    }

    pub fn with_file(mut self, file: Record) -> Self {
        insert_by(&mut self.files, "file_id", file);
        self
    }

    pub fn with_widget(mut self, widget: Record) -> Self {
        insert_by(&mut self.widgets, "widget_id", widget);
        self
    }

    pub fn with_flow(mut self, flow: Record) -> Self {
        insert_by(&mut self.flows, "flow_id", flow);
        self
    }

    pub fn with_member(mut self, space_id: u64, member: Record) -> Self {
        self.members.entry(space_id).or_default().push(member);
        self
    }

    /// Next id for a created record.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of token requests with the given grant type.
    pub fn token_request_count(&self, grant_type: &str) -> usize {
        self.token_requests
            .iter()
            .filter(|g| g.as_str() == grant_type)
            .count()
    }

    /// Revoke every access token so the next API call is rejected.
    pub fn expire_access_tokens(&mut self) {
        self.access_tokens.clear();
    }

    /// Find an org by the `url` query parameter of `/org/url`.
    pub fn org_by_url(&self, url: &str) -> Option<&Record> {
        let label = url.trim_end_matches('/').rsplit('/').next()?;
        self.orgs
            .values()
            .find(|org| org.get("url_label").and_then(Value::as_str) == Some(label))
    }

    /// Spaces belonging to an org.
    pub fn spaces_in_org(&self, org_id: u64) -> Vec<&Record> {
        self.spaces
            .values()
            .filter(|s| field_u64(s, "org_id") == Some(org_id))
            .collect()
    }

    /// Apps belonging to a space.
    pub fn apps_in_space(&self, space_id: u64) -> Vec<&Record> {
        self.apps
            .values()
            .filter(|a| field_u64(a, "space_id") == Some(space_id))
            .collect()
    }

    /// Items belonging to an app.
    pub fn items_in_app(&self, app_id: u64) -> Vec<&Record> {
        self.items
            .values()
            .filter(|i| field_u64(i, "app_id") == Some(app_id))
            .collect()
    }

    /// Files attached to a space.
    pub fn files_in_space(&self, space_id: u64) -> Vec<&Record> {
        self.files
            .values()
            .filter(|f| field_u64(f, "space_id") == Some(space_id))
            .collect()
    }

    /// Widgets attached to `{ref_type}/{ref_id}`.
    pub fn widgets_on(&self, ref_type: &str, ref_id: u64) -> Vec<&Record> {
        self.widgets
            .values()
            .filter(|w| has_ref(w, ref_type, ref_id))
            .collect()
    }

    /// Flows attached to `{ref_type}/{ref_id}`.
    pub fn flows_on(&self, ref_type: &str, ref_id: u64) -> Vec<&Record> {
        self.flows
            .values()
            .filter(|f| has_ref(f, ref_type, ref_id))
            .collect()
    }
}

fn insert_by(map: &mut BTreeMap<u64, Record>, key: &str, record: Record) {
    if let Some(id) = field_u64(&record, key) {
        map.insert(id, record);
    }
}

fn field_u64(record: &Record, key: &str) -> Option<u64> {
    record.get(key).and_then(Value::as_u64)
}

fn has_ref(record: &Record, ref_type: &str, ref_id: u64) -> bool {
    let Some(reference) = record.get("ref") else {
        return false;
    };
    reference.get("type").and_then(Value::as_str) == Some(ref_type)
        && reference.get("id").and_then(Value::as_u64) == Some(ref_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::fixtures::record;
    use serde_json::json;

    #[test]
    fn test_records_indexed_by_id() {
        let state = MockState::new()
            .with_space(record(json!({"space_id": 1, "org_id": 5})))
            .with_space(record(json!({"space_id": 2, "org_id": 6})))
            .with_space(record(json!({"name": "no id"})));

        assert_eq!(state.spaces.len(), 2);
        assert_eq!(state.spaces_in_org(5).len(), 1);
    }

    #[test]
    fn test_org_by_url() {
        let state = MockState::new()
            .with_org(record(json!({"org_id": 1, "url_label": "acme"})));

        assert!(state.org_by_url("https://podio.com/acme").is_some());
        assert!(state.org_by_url("https://podio.com/other").is_none());
    }

    #[test]
    fn test_widgets_by_reference() {
        let state = MockState::new()
            .with_widget(record(json!({"widget_id": 1, "ref": {"type": "space", "id": 3}})))
            .with_widget(record(json!({"widget_id": 2, "ref": {"type": "app", "id": 3}})));

        assert_eq!(state.widgets_on("space", 3).len(), 1);
        assert_eq!(state.widgets_on("org", 3).len(), 0);
    }

    #[test]
    fn test_generated_ids_increase() {
        let mut state = MockState::new();
        let first = state.next_id();
        assert_eq!(state.next_id(), first + 1);
    }
}
