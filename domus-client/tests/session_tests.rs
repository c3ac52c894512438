//! Session behavior against a stub API.

mod common;

use common::{admin_config, config, RecordedRequest, StubResponse, StubServer};
use domus_client::notifications::NotificationAction;
use domus_client::persistence::{self, PersistedSelection, PersistedState};
use domus_client::{ClientError, ListFilter, NavError, ResourceData, ResourceKind, Session};
use domus_core::{FetchError, HierarchyLevel, Pagination, Role, Section};
use domus_query::{QueryError, SelectionError};
use serde_json::json;

fn api(request: &RecordedRequest) -> StubResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/api/mtk/") => StubResponse::ok(json!({
            "items": [{ "id": 1, "name": "North MTK" }],
            "total": 1,
            "page": 1,
            "page_size": 20
        })),
        ("GET", "/api/mtk/1/") => StubResponse::ok(json!({ "id": 1, "name": "North MTK" })),
        ("GET", "/api/complexes/") => {
            StubResponse::ok(json!([{ "id": 2, "mtk_id": 1, "name": "Riverside" }]))
        }
        ("GET", "/api/complexes/2/") => {
            StubResponse::ok(json!({ "id": 2, "mtk_id": 1, "name": "Riverside" }))
        }
        ("GET", "/api/buildings/") => StubResponse::json(500, json!({ "detail": "boom" })),
        ("GET", "/api/blocks/") => StubResponse::ok(json!({
            "items": [
                { "id": 7, "building_id": 3, "name": "A" },
                { "id": 8, "building_id": 3, "name": "B" }
            ],
            "total": 2,
            "page": 1,
            "page_size": 20
        })),
        ("POST", "/api/blocks/") => {
            StubResponse::json(201, json!({ "id": 9, "building_id": 3, "name": "C" }))
        }
        ("DELETE", "/api/blocks/7/") => StubResponse::no_content(),
        ("PATCH", "/api/blocks/8/") | ("PUT", "/api/blocks/8/") => {
            StubResponse::ok(json!({ "id": 8, "building_id": 3, "name": "B2" }))
        }
        _ => StubResponse::not_found(),
    }
}

async fn admin_session(server: &StubServer, dir: &tempfile::TempDir) -> Session {
    Session::new(admin_config(&server.base_url(), dir.path())).unwrap()
}

#[tokio::test]
async fn list_sends_cookie_token_and_caches() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    let data = session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();
    assert_eq!(data.ids(), vec![1]);
    let again = session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();
    assert_eq!(again, data);

    let requests = server.requests_to("GET", "/api/mtk/");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok-1"));
    assert_eq!(requests[0].query("page"), Some("1"));
    assert_eq!(requests[0].query("page_size"), Some("20"));
    assert_eq!(session.query().stats().hits, 1);
}

#[tokio::test]
async fn token_cookie_is_read_per_request() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();
    session.cookies().set("access_token", "tok-2");
    session
        .refresh(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();
    session.cookies().remove("access_token");
    session
        .refresh(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();

    let auth: Vec<Option<String>> = server
        .requests_to("GET", "/api/mtk/")
        .iter()
        .map(|r| r.header("authorization").map(str::to_string))
        .collect();
    assert_eq!(
        auth,
        vec![
            Some("Bearer tok-1".to_string()),
            Some("Bearer tok-2".to_string()),
            None
        ]
    );
}

#[tokio::test]
async fn selection_scopes_child_lists() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    session.select(HierarchyLevel::Mtk, Some(1)).await.unwrap();
    let complexes = session
        .list(ResourceKind::ComplexList, &ListFilter::new().with_search("river"))
        .await
        .unwrap();
    assert!(matches!(complexes, ResourceData::Complexes(ref page) if page.total == 1));

    session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();

    let complex_req = &server.requests_to("GET", "/api/complexes/")[0];
    assert_eq!(complex_req.query("mtk_id"), Some("1"));
    assert_eq!(complex_req.query("search"), Some("river"));
    let mtk_req = &server.requests_to("GET", "/api/mtk/")[0];
    assert_eq!(mtk_req.query("mtk_id"), None);
}

#[tokio::test]
async fn changing_selection_changes_the_cache_key() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;
    let filter = ListFilter::new();

    session
        .list(ResourceKind::ComplexList, &filter)
        .await
        .unwrap();
    session.select(HierarchyLevel::Mtk, Some(1)).await.unwrap();
    session
        .list(ResourceKind::ComplexList, &filter)
        .await
        .unwrap();
    session.select(HierarchyLevel::Mtk, None).await.unwrap();
    session
        .list(ResourceKind::ComplexList, &filter)
        .await
        .unwrap();

    // Unscoped, scoped, then unscoped again from cache.
    assert_eq!(server.requests_to("GET", "/api/complexes/").len(), 2);
}

#[tokio::test]
async fn failed_list_notifies_with_retry() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    let err = session
        .list(ResourceKind::BuildingList, &ListFilter::new())
        .await
        .unwrap_err();
    match err {
        ClientError::Query(QueryError::Fetch(FetchError::Http { status, message })) => {
            assert_eq!(status, 500);
            assert!(message.contains("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let latest = session.notifications().latest().unwrap();
    assert_eq!(
        latest.action,
        Some(NotificationAction::Retry(ResourceKind::BuildingList))
    );
    assert_eq!(session.query().errors().len(), 1);
}

#[tokio::test]
async fn forbidden_section_makes_no_request() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let grants = r#"
[[access.grants]]
role = "dispatcher"
section = "blocks"
actions = "READ"
"#;
    let mut session =
        Session::new(config(&server.base_url(), dir.path(), "dispatcher", grants)).unwrap();

    let err = session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Nav(NavError::Forbidden {
            role: Role::Dispatcher,
            section: Section::Mtk
        })
    ));
    assert!(session.delete(ResourceKind::BlockList, 7).await.is_err());
    assert_eq!(server.count(), 0);

    session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    assert_eq!(server.count(), 1);
}

#[tokio::test]
async fn delete_patches_cached_pages() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    let pages = session.delete(ResourceKind::BlockList, 7).await.unwrap();
    assert_eq!(pages, 1);

    let data = session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    assert_eq!(data.ids(), vec![8]);
    assert_eq!(data.total(), 1);
    assert_eq!(server.requests_to("GET", "/api/blocks/").len(), 1);
    assert_eq!(server.requests_to("DELETE", "/api/blocks/7/").len(), 1);
}

#[tokio::test]
async fn create_invalidates_every_page_of_the_resource() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;
    let page_two = ListFilter::new().with_page(Pagination::new(2, 20).unwrap());

    session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    session
        .list(ResourceKind::BlockList, &page_two)
        .await
        .unwrap();

    let created: serde_json::Value = session
        .mutations()
        .create(ResourceKind::BlockList, &json!({ "building_id": 3, "name": "C" }))
        .await
        .unwrap();
    assert_eq!(created["id"], json!(9));
    let post = &server.requests_to("POST", "/api/blocks/")[0];
    assert_eq!(post.json()["name"], json!("C"));
    assert!(session.query().keys().is_empty());

    session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    assert_eq!(server.requests_to("GET", "/api/blocks/").len(), 3);
}

#[tokio::test]
async fn update_and_replace_hit_the_entity_path() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;
    let mutations = session.mutations();

    session
        .list(ResourceKind::BlockList, &ListFilter::new())
        .await
        .unwrap();
    let updated: domus_core::Block = mutations
        .update(ResourceKind::BlockList, 8, &json!({ "name": "B2" }))
        .await
        .unwrap();
    assert_eq!(updated.name, "B2");
    assert!(session.query().keys().is_empty());

    let _: serde_json::Value = mutations
        .replace(
            ResourceKind::BlockList,
            8,
            &json!({ "building_id": 3, "name": "B2" }),
        )
        .await
        .unwrap();
    let patch = &server.requests_to("PATCH", "/api/blocks/8/")[0];
    assert_eq!(patch.json(), json!({ "name": "B2" }));
    assert_eq!(patch.header("authorization"), Some("Bearer tok-1"));
    assert_eq!(server.requests_to("PUT", "/api/blocks/8/").len(), 1);
}

#[tokio::test]
async fn prefetch_deduplicates_and_skips_unreadable() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let session = admin_session(&server, &dir).await;

    let results = session
        .prefetch(
            &[
                ResourceKind::MtkList,
                ResourceKind::MtkList,
                ResourceKind::BlockList,
            ],
            &ListFilter::new(),
        )
        .await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(server.requests_to("GET", "/api/mtk/").len(), 1);
    assert_eq!(session.query().stats().deduplicated, 1);
}

#[tokio::test]
async fn persist_and_restore_selection() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();

    let mut first = admin_session(&server, &dir).await;
    first.select(HierarchyLevel::Mtk, Some(1)).await.unwrap();
    first.select(HierarchyLevel::Complex, Some(2)).await.unwrap();
    first.navigator_mut().go(Section::Complexes).unwrap();
    first.persist().unwrap();

    let mut second = admin_session(&server, &dir).await;
    assert_eq!(second.restore().await.unwrap(), 2);
    assert_eq!(
        second.selection().selected_ids(),
        vec![(HierarchyLevel::Mtk, 1), (HierarchyLevel::Complex, 2)]
    );
    assert_eq!(second.navigator().active(), Section::Complexes);
}

#[tokio::test]
async fn restore_stops_at_missing_entity() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    let state = PersistedState {
        active_section: Section::Buildings,
        selections: vec![
            PersistedSelection {
                level: HierarchyLevel::Complex,
                id: 99,
            },
            PersistedSelection {
                level: HierarchyLevel::Mtk,
                id: 1,
            },
        ],
    };
    persistence::save(&session.config().persistence_path, &state).unwrap();

    let err = session.restore().await.unwrap_err();
    match err {
        ClientError::Selection(SelectionError::Load { level, id, source }) => {
            assert_eq!(level, HierarchyLevel::Complex);
            assert_eq!(id, 99);
            assert!(source.is_not_found());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.selection().selected_id(HierarchyLevel::Mtk), Some(1));
    assert_eq!(session.selection().selected_id(HierarchyLevel::Complex), None);
    assert_eq!(
        session.notifications().latest().unwrap().action,
        Some(NotificationAction::Reselect {
            level: HierarchyLevel::Complex,
            id: 99
        })
    );
}

#[tokio::test]
async fn restore_without_saved_state_is_noop() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;
    assert_eq!(session.restore().await.unwrap(), 0);
    assert_eq!(server.count(), 0);
}

#[tokio::test]
async fn teardown_clears_everything() {
    let server = StubServer::start(api).await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = admin_session(&server, &dir).await;

    session.select(HierarchyLevel::Mtk, Some(1)).await.unwrap();
    session
        .list(ResourceKind::ComplexList, &ListFilter::new())
        .await
        .unwrap();
    let _ = session
        .list(ResourceKind::BuildingList, &ListFilter::new())
        .await;

    session.teardown();
    assert!(session.query().keys().is_empty());
    assert!(session.selection().selected_ids().is_empty());
    assert!(session.notifications().is_empty());
    assert!(session.cookies().is_empty());

    session
        .list(ResourceKind::MtkList, &ListFilter::new())
        .await
        .unwrap();
    let last = server.requests().pop().unwrap();
    assert_eq!(last.header("authorization"), None);
}
