use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use rit_links_in::{
    AppConfig, AppState, InMemoryRepository, MockIdentityBackend, MockStorageService,
    create_router,
    identity::IdentityBackendState,
    portal::{SESSION_HEADER, spawn_eviction, waiting_response},
    repository::RepositoryState,
    storage::StorageState,
};
use std::{sync::Arc, time::Duration};
use tower::util::ServiceExt;
use uuid::Uuid;

fn test_state() -> AppState {
    AppState::new(
        Arc::new(MockIdentityBackend::new()) as IdentityBackendState,
        Arc::new(InMemoryRepository::new()) as RepositoryState,
        Arc::new(MockStorageService::new()) as StorageState,
        AppConfig::default(),
    )
}

fn session_id(response: &axum::response::Response) -> Option<Uuid> {
    response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = create_router(test_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(session_id(&response).is_none());
}

#[tokio::test]
async fn test_static_routes_open_no_sessions() {
    let state = test_state();
    let sessions = state.sessions.clone();
    let app = create_router(state);

    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    for uri in ["/", "/assistant", "/register", "/definitely/not/here", "/api-docs/openapi.json"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(session_id(&response).is_none(), "{}", uri);
    }

    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_known_session_is_reused_and_unknown_is_replaced() {
    let state = test_state();
    let sessions = state.sessions.clone();
    let app = create_router(state);

    let first = app
        .clone()
        .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = session_id(&first).expect("no session id");
    assert!(sessions.get(id).await.is_some());

    let second = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/login")
                .header(SESSION_HEADER, id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(session_id(&second), Some(id));
    assert_eq!(sessions.len().await, 1);

    let stale = Uuid::new_v4();
    let third = app
        .oneshot(
            Request::builder()
                .uri("/login")
                .header(SESSION_HEADER, stale.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let replaced = session_id(&third).expect("no session id");
    assert_ne!(replaced, stale);
    assert_eq!(sessions.len().await, 2);
}

#[tokio::test]
async fn test_guarded_screens_open_a_session() {
    let state = test_state();
    let sessions = state.sessions.clone();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/student/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The guard and the echoed header see the same session.
    let id = session_id(&response).expect("no session id");
    assert!(sessions.get(id).await.is_some());
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn test_idle_sessions_are_evicted() {
    let sessions = test_state().sessions;
    let stale = sessions.resolve(None).await;
    let fresh = sessions.resolve(None).await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    // Naming a session again counts as using it.
    sessions.resolve(Some(fresh.id)).await;

    let evicted = sessions.evict_idle(Duration::from_millis(40)).await;
    assert_eq!(evicted, 1);
    assert!(sessions.get(stale.id).await.is_none());
    assert!(sessions.get(fresh.id).await.is_some());

    assert_eq!(sessions.evict_idle(Duration::ZERO).await, 1);
    assert!(sessions.is_empty().await);
}

#[tokio::test]
async fn test_eviction_task_sweeps_the_registry() {
    let sessions = test_state().sessions;
    sessions.resolve(None).await;

    let sweeper = spawn_eviction(&sessions, Duration::from_millis(20));
    for _ in 0..50 {
        if sessions.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(sessions.is_empty().await);

    // The task ends once the registry is gone.
    drop(sessions);
    tokio::time::timeout(Duration::from_secs(1), sweeper)
        .await
        .expect("eviction task outlived its registry")
        .unwrap();
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/faculty/requests/{id}/accept"].is_object());
    assert!(doc["paths"]["/login"]["post"].is_object());
}

#[test]
fn test_waiting_response_asks_client_to_retry() {
    let response = waiting_response();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response.headers().get(header::RETRY_AFTER).map(|v| v.as_bytes()),
        Some(&b"1"[..])
    );
}
