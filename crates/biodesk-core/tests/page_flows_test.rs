#![allow(clippy::unwrap_used)]
// End-to-end page flows against a mock backend.

use std::future::Future;
use std::time::Duration;

use serde_json::json;
use strum::IntoEnumIterator;
use tokio::sync::{mpsc, watch};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use biodesk_core::model::{Patient, Trial};
use biodesk_core::{
    Backend, BackendConfig, CoreError, Dashboard, DetailPage, EntityKind, ListPage, Remote, Route,
    SectionState, StatusView, TableView, with_entity,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn backend(server: &MockServer) -> Backend {
    let url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    Backend::new(BackendConfig::new(url)).unwrap()
}

async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out waiting for the backend")
}

async fn wait_for<T>(
    rx: &mut watch::Receiver<Remote<T>>,
    pred: impl FnMut(&Remote<T>) -> bool,
) -> Remote<T> {
    within(rx.wait_for(pred)).await.unwrap().clone()
}

async fn mount_get(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_missing(server: &MockServer, route: &str, detail: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": detail })))
        .mount(server)
        .await;
}

// ── Local preconditions ─────────────────────────────────────────────

#[tokio::test]
async fn blank_keys_fail_locally_for_every_kind() {
    let server = MockServer::start().await;
    let backend = backend(&server);

    for kind in EntityKind::iter() {
        for key in ["", "  "] {
            let err = with_entity!(kind, E => backend.get::<E>(key).await.err());
            assert!(
                matches!(err, Some(CoreError::InvalidArgument { .. })),
                "{kind:?} accepted {key:?}: {err:?}"
            );
        }
    }

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "blank keys must not reach the backend");
}

// ── List ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_renders_rows_and_activation_routes_to_detail() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([{ "id": "P1", "nhc": "N1" }])).await;

    let mut page = ListPage::<Patient>::new(&backend(&server));
    let mut states = page.binding().subscribe();
    assert!(states.borrow().is_loading());
    assert_eq!(page.status(), Some(StatusView::Loading));

    wait_for(&mut states, Remote::is_ready).await;
    assert!(page.sync());
    assert_eq!(page.status(), None);
    assert_eq!(page.table().page_keys(), vec!["N1"]);

    let route = page.activate_selected().unwrap();
    assert_eq!(route, Route::detail(EntityKind::Patient, "N1"));
    assert_eq!(page.table().selected_key(), Some("N1"));
}

#[tokio::test]
async fn empty_list_shows_empty_state() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([])).await;

    let page = ListPage::<Patient>::new(&backend(&server));
    let mut states = page.binding().subscribe();
    wait_for(&mut states, Remote::is_ready).await;

    assert_eq!(page.status(), Some(StatusView::empty()));
}

#[tokio::test]
async fn create_posts_once_and_reloads_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "nhc": "N1" }])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "/api/patients", json!([{ "nhc": "N1" }, { "nhc": "N2" }])).await;

    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .and(body_json(json!({ "nhc": "N2", "sex": "F", "birth_date": null })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "nhc": "N2", "sex": "F" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = ListPage::<Patient>::new(&backend(&server));
    let mut states = page.binding().subscribe();
    wait_for(&mut states, Remote::is_ready).await;
    page.sync();
    assert_eq!(page.table().total_len(), 1);

    let mut form = page.new_form();
    form.set_value("nhc", "N2");
    form.set_value("sex", "F");
    assert!(form.can_submit());

    let created = page.create(&form.payload().unwrap()).await.unwrap();
    assert_eq!(created.nhc, "N2");

    wait_for(&mut states, |s| s.value().is_some_and(|rows| rows.len() == 2)).await;
    assert!(page.sync());
    assert_eq!(page.table().total_len(), 2);
}

#[tokio::test]
async fn failed_create_leaves_list_untouched() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([{ "nhc": "N1" }])).await;
    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "loc": ["body", "nhc"], "msg": "Field required", "type": "missing" }]
        })))
        .mount(&server)
        .await;

    let mut page = ListPage::<Patient>::new(&backend(&server));
    let mut states = page.binding().subscribe();
    wait_for(&mut states, Remote::is_ready).await;
    page.sync();

    let err = page.create(&serde_json::Map::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: 422, .. }));
    assert_eq!(page.table().total_len(), 1);
}

// ── Detail ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_record_fails_and_retry_refetches() {
    let server = MockServer::start().await;
    mount_missing(&server, "/api/patients/NOPE", "Patient not found").await;
    mount_get(&server, "/api/tumors", json!([])).await;

    let page = DetailPage::<Patient>::new(&backend(&server), "NOPE");
    let mut states = page.binding().subscribe();

    wait_for(&mut states, |s| s.error().is_some()).await;
    let status = page.status().unwrap();
    assert!(status.is_retryable());
    assert_eq!(status.message(), Some("Not found: Patient not found"));

    page.retry();
    within(states.changed()).await.unwrap();
    wait_for(&mut states, |s| s.error().is_some()).await;

    let hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/patients/NOPE")
        .count();
    assert_eq!(hits, 2);
}

#[tokio::test]
async fn related_collection_is_filtered_by_foreign_key() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1", "sex": "M" })).await;
    mount_get(
        &server,
        "/api/tumors",
        json!([
            { "biobank_code": "BB-01", "patient_nhc": "N1" },
            { "biobank_code": "BB-02", "patient_nhc": "N2" },
            { "biobank_code": "BB-03", "patient_nhc": "N1" },
        ]),
    )
    .await;

    let mut page = DetailPage::<Patient>::new(&backend(&server), "N1");
    let (tx, mut rx) = mpsc::unbounded_channel();
    page.watch_changes(&tx);

    within(async {
        loop {
            page.sync();
            if page.related()[0].table().total_len() > 0 && page.record().is_some() {
                break;
            }
            rx.recv().await;
        }
    })
    .await;

    let tumors = &mut page.related_mut()[0];
    assert_eq!(tumors.label(), "Tumors");
    assert_eq!(tumors.table().page_keys(), vec!["BB-01", "BB-03"]);
    assert_eq!(
        tumors.activate(),
        Some(Route::detail(EntityKind::Tumor, "BB-01"))
    );

    assert_eq!(page.title(), "Patient N1");
    assert!(page.fields().contains(&("Sex".to_owned(), "M".to_owned())));
    assert_eq!(page.parent_route(), None);
}

#[tokio::test]
async fn trial_sections_treat_404_as_absent() {
    let server = MockServer::start().await;
    let id = "5f0c6b8e-0000-4000-8000-000000000001";
    mount_get(&server, &format!("/api/trials/{id}"), json!({ "id": id, "success": true })).await;
    mount_get(
        &server,
        &format!("/api/pdx-trials/{id}"),
        json!({ "id": id, "ffpe": true, "latency_weeks": 6 }),
    )
    .await;
    mount_missing(&server, &format!("/api/pdo-trials/{id}"), "PDO trial not found").await;
    mount_missing(&server, &format!("/api/lc-trials/{id}"), "LC trial not found").await;

    let page = DetailPage::<Trial>::new(&backend(&server), id);
    let (tx, mut rx) = mpsc::unbounded_channel();
    page.watch_changes(&tx);

    within(async {
        while page
            .sections()
            .iter()
            .any(|s| s.state() == SectionState::Loading)
        {
            rx.recv().await;
        }
    })
    .await;

    let states: Vec<_> = page.sections().iter().map(|s| (s.kind(), s.state())).collect();
    let SectionState::Present(fields) = &states[0].1 else {
        panic!("expected PDX section, got {:?}", states[0]);
    };
    assert_eq!(states[0].0, EntityKind::PdxTrial);
    assert!(fields.contains(&("FFPE".to_owned(), "✓".to_owned())));
    assert!(fields.contains(&("Latency (weeks)".to_owned(), "6".to_owned())));
    assert_eq!(states[1], (EntityKind::PdoTrial, SectionState::Absent));
    assert_eq!(states[2], (EntityKind::LcTrial, SectionState::Absent));
}

#[tokio::test]
async fn delete_sends_one_request_and_routes_to_list() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1" })).await;
    mount_get(&server, "/api/tumors", json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/patients/N1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let page = DetailPage::<Patient>::new(&backend(&server), "N1");
    let route = page.delete().await.unwrap();

    assert_eq!(route, Route::List(EntityKind::Patient));
}

#[tokio::test]
async fn unacknowledged_delete_is_rejected() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1" })).await;
    mount_get(&server, "/api/tumors", json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/patients/N1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": false })))
        .mount(&server)
        .await;

    let page = DetailPage::<Patient>::new(&backend(&server), "N1");
    let err = page.delete().await.unwrap_err();

    assert!(matches!(err, CoreError::Rejected { .. }));
}

#[tokio::test]
async fn update_patches_and_reloads_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients/N1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nhc": "N1", "sex": null })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1", "sex": "F" })).await;
    mount_get(&server, "/api/tumors", json!([])).await;
    Mock::given(method("PATCH"))
        .and(path("/api/patients/N1"))
        .and(body_json(json!({ "sex": "F", "birth_date": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nhc": "N1", "sex": "F" })))
        .expect(1)
        .mount(&server)
        .await;

    let page = DetailPage::<Patient>::new(&backend(&server), "N1");
    let mut states = page.binding().subscribe();
    wait_for(&mut states, Remote::is_ready).await;

    let mut form = page.edit_form().unwrap();
    assert!(!form.set_value("nhc", "N9"));
    form.set_value("sex", "F");
    page.update(&form.payload().unwrap()).await.unwrap();

    let state = wait_for(&mut states, |s| {
        s.value().is_some_and(|p| p.sex.as_deref() == Some("F"))
    })
    .await;
    assert!(state.is_ready());
}

// ── Dashboard ───────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_cards_settle_independently() {
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([{ "nhc": "N1" }, { "nhc": "N2" }])).await;
    // Every other collection is unmatched and answers 404.

    let dashboard = Dashboard::new(&backend(&server));
    let (tx, mut rx) = mpsc::unbounded_channel();
    dashboard.watch_changes(&tx);

    within(async {
        while dashboard.cards().iter().any(|c| c.count().is_loading()) {
            rx.recv().await;
        }
    })
    .await;

    let cards = dashboard.cards();
    assert_eq!(cards.len(), 6);
    assert_eq!(cards[0].title(), "Patients");
    assert_eq!(cards[0].count().value().map(|n| **n), Some(2));
    assert!(cards[1].count().error().is_some());
    assert_eq!(cards[5].route(), Route::List(EntityKind::Trial));
}
