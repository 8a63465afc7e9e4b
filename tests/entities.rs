//! Entity operations against a mocked Podio API.
//!
//! Checks the wire shape of each operation and that argument validation
//! happens before anything is sent.

use podioapi::{
    App, Entity, FileListQuery, Flow, Get, ItemFilter, List, MemberInvite, NewItem, NewSpace,
    Organization, PaginationParams, PodioError, Privacy, Record, RefType, Reference, Session,
    Space, SpaceId, Widget,
};
use podioapi::{Credentials, File};
use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session(server: &MockServer) -> Session {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_in": 28800
        })))
        .mount(server)
        .await;

    Session::builder(Credentials::new("id", "secret").with_password("me", "pw"))
        .base_url(server.uri())
        .build()
        .unwrap()
}

/// A session whose server fails the test on any request.
async fn silent_session(server: &MockServer) -> Session {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;

    Session::builder(Credentials::new("id", "secret").with_password("me", "pw"))
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

// =============================================================================
// Organizations and spaces
// =============================================================================

#[tokio::test]
async fn test_org_by_url_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/url"))
        .and(query_param("url", "https://podio.com/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"org_id": 1, "name": "Acme"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let org = Organization::get_by_url(&session, "acme").await.unwrap();

    assert_eq!(org.org_id(), 1);
    assert_eq!(org.name(), Some("Acme"));
    assert_eq!(org.url_label(), Some("acme"));
}

#[tokio::test]
async fn test_org_url_label_stays_on_podio_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/url"))
        .and(query_param("url", "https://podio.com///other.host/x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"org_id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let org = Organization::get_by_url(&session, "//other.host/x").await.unwrap();
    assert_eq!(org.org_id(), 2);
}

#[tokio::test]
async fn test_org_spaces_and_new_space() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/space/org/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"space_id": 42, "name": "Eng"},
            {"space_id": 43, "name": "Sales"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/space/"))
        .and(body_json(json!({
            "org_id": 1,
            "name": "Ops",
            "privacy": "open",
            "auto_join": false,
            "new_app_post": true,
            "new_member_post": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"space_id": 44})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/space/44"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"space_id": 44, "name": "Ops"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let org = Organization::from_value(&session, json!({"org_id": 1})).unwrap();

    let spaces = org.spaces().await.unwrap();
    assert_eq!(spaces.len(), 2);
    assert_eq!(spaces[1].name(), Some("Sales"));

    let space = org
        .new_space(NewSpace::new("Ops").privacy(Privacy::Open).new_app_post(true))
        .await
        .unwrap();
    assert_eq!(space.space_id(), SpaceId(44));
}

#[tokio::test]
async fn test_space_apps_fetch_each_app() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/space/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"app_id": 1}, {"app_id": 2}])))
        .expect(1)
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/app/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "app_id": id,
                "config": {"name": format!("App {id}")}
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let session = session(&server).await;
    let space = Space::from_value(&session, json!({"space_id": 42, "name": "Eng"})).unwrap();
    assert_eq!(space.field("nonexistent"), None);

    let apps = space.apps().await.unwrap();
    let names: Vec<_> = apps.iter().filter_map(|a| a.name()).collect();
    assert_eq!(names, vec!["App 1", "App 2"]);
}

#[tokio::test]
async fn test_add_member_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/space/99/member"))
        .and(body_json(json!({"message": "join", "role": "admin", "users": [7]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let space = Space::from_value(&session, json!({"space_id": 99})).unwrap();

    space
        .add_member(MemberInvite::new("admin", "join").user(7u64))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_member_with_bad_role_sends_nothing() {
    let server = MockServer::start().await;
    let session = silent_session(&server).await;
    let space = Space::from_value(&session, json!({"space_id": 99})).unwrap();

    let err = space
        .add_member(MemberInvite::new("owner", "join").user(7u64))
        .await
        .unwrap_err();

    assert!(matches!(err, PodioError::Validation(_)));
    assert!(err.to_string().contains("light, regular, admin"));
}

#[tokio::test]
async fn test_members_of_space() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/space/42/member/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"user": {"user_id": 7}, "role": "admin"},
            {"user": {"user_id": 8}, "role": "light"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let members = podioapi::Member::list(&session, SpaceId(42), &()).await.unwrap();
    let roles: Vec<_> = members.iter().filter_map(|m| m.role()).collect();
    assert_eq!(roles, vec!["admin", "light"]);
}

// =============================================================================
// Apps and items
// =============================================================================

#[tokio::test]
async fn test_copy_app_installs_then_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/3/install"))
        .and(body_json(json!({"space_id": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"app_id": 30})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app/30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"app_id": 30, "space_id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();
    let space = Space::from_value(&session, json!({"space_id": 42})).unwrap();

    let copy = app.copy(&space).await.unwrap();
    assert_eq!(copy.space_id(), Some(SpaceId(42)));
}

#[tokio::test]
async fn test_add_item_resolves_link_embeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed/"))
        .and(body_json(json!({"url": "https://example.com/report"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embed_id": 77, "type": "link"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/item/app/3"))
        .and(body_json(json!({
            "fields": {"title": "Report", "source": {"embed": 77}},
            "tags": ["finance"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"item_id": 900, "title": "Report"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();

    let item = app
        .add_item(
            NewItem::new()
                .field("title", "Report")
                .embed_link("source", "https://example.com/report")
                .tags(["finance"]),
        )
        .await
        .unwrap();
    assert_eq!(item.item_id(), 900);
}

#[tokio::test]
async fn test_add_item_with_unsupported_embed_sends_nothing() {
    let server = MockServer::start().await;
    let session = silent_session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();

    let err = app
        .add_item(NewItem::new().embed("cover", "image", "https://example.com/a.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, PodioError::Unsupported(_)));
}

#[tokio::test]
async fn test_filter_items_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/item/app/3/filter/"))
        .and(body_json(json!({"limit": 2, "offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 5,
            "filtered": 3,
            "items": [{"item_id": 1}, {"item_id": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();

    let page = app
        .filter_items(&ItemFilter::new().page(PaginationParams::new(2, 0)))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.total, Some(3));
    assert!(page.has_more);
}

#[tokio::test]
async fn test_export_xlsx_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/app/3/xlsx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04data".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();

    let bytes = app.export_xlsx().await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_app_flows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flow/app/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"flow_id": 8, "name": "Notify", "type": "item.create"}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let app = App::from_value(&session, json!({"app_id": 3})).unwrap();

    let flows = app.flows().await.unwrap();
    assert_eq!(flows[0].flow_id(), 8);

    let direct = Flow::list(&session, Reference::new(RefType::App, 3), &()).await.unwrap();
    assert_eq!(direct[0].flow_type(), Some("item.create"));
}

// =============================================================================
// Files
// =============================================================================

#[tokio::test]
async fn test_list_space_files_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file/space/42"))
        .and(query_param("filetype", "image"))
        .and(query_param("sort_by", "created_on"))
        .and(query_param("sort_desc", "false"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"file_id": 5, "name": "a.png"}])))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let query = FileListQuery::new()
        .file_type("image")
        .sort_by("created_on", false);

    let files = File::list_space_files(&session, 42u64, &query).await.unwrap();
    assert_eq!(files[0].name(), Some("a.png"));
}

#[tokio::test]
async fn test_invalid_file_filters_send_nothing() {
    let server = MockServer::start().await;
    let session = silent_session(&server).await;

    let query = FileListQuery::new().attached_to("comment").hosted_by("ftp");
    let err = File::list_space_files(&session, 42u64, &query).await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("\"attached_to\" should be one of"));
    assert!(msg.contains("\"hosted_by\" should be one of"));
}

#[tokio::test]
async fn test_upload_bytes_uses_given_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/file"))
        .and(body_string_contains("name=\"filename\""))
        .and(body_string_contains("notes.txt"))
        .and(body_string_contains("name=\"source\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": 12, "name": "notes.txt"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let file = File::upload(&session, b"hello".to_vec(), Some("notes.txt"))
        .await
        .unwrap();
    assert_eq!(file.file_id(), 12);
}

#[tokio::test]
async fn test_copy_file_fetches_copy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/file/5/copy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": 6})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_id": 6, "name": "copy.pdf"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let copy = File::copy_file(&session, 5).await.unwrap();
    assert_eq!(copy.name(), Some("copy.pdf"));
}

// =============================================================================
// Widgets
// =============================================================================

#[tokio::test]
async fn test_add_widget_strips_nulls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/widget/space/42/"))
        .and(body_json(json!({
            "type": "tasks",
            "title": "Open tasks",
            "config": {"kind": "all", "limit": 5}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"widget_id": 70})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let space = Space::from_value(&session, json!({"space_id": 42})).unwrap();

    let config = record(json!({"kind": "all", "limit": 5, "extra": null}));
    let widget = space.add_widget("tasks", "Open tasks", config).await.unwrap();

    assert_eq!(widget.widget_id(), 70);
    assert_eq!(widget.reference(), Some(Reference::new(RefType::Space, 42)));
    assert_eq!(widget.title(), Some("Open tasks"));
}

#[tokio::test]
async fn test_add_widget_validation_sends_nothing() {
    let server = MockServer::start().await;
    let session = silent_session(&server).await;
    let reference = Reference::new(RefType::App, 3);

    let err = Widget::add(&session, reference, "carousel", "x", Record::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Not a valid widget type"));

    let config = record(json!({"app_id": 1}));
    let err = Widget::add(&session, reference, "calculation", "x", config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("\"unit\""));
}

#[tokio::test]
async fn test_widget_refresh_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/widget/70"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "widget_id": 70,
            "title": "Renamed",
            "ref": {"type": "space", "id": 42}
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/widget/70"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let mut widget = Widget::get(&session, 70).await.unwrap();
    widget.refresh().await.unwrap();

    assert_eq!(widget.title(), Some("Renamed"));
    assert_eq!(widget.reference(), Some(Reference::new(RefType::Space, 42)));
    widget.delete().await.unwrap();
}

#[tokio::test]
async fn test_not_found_entity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/space/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "not_found",
            "error_description": "Object not found"
        })))
        .mount(&server)
        .await;

    let session = session(&server).await;
    let err = Space::get(&session, 1).await.unwrap_err();
    assert!(err.is_not_found());
}
