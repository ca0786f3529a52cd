//! Service regression tests.
//!
//! Drives the real router and store end-to-end: register clients over
//! HTTP, toggle algorithm flags, and check that the reconciler issues
//! the matching orchestrator calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use algoplane_api::build_router;
use algoplane_kube::{WorkloadController, WorkloadResult};
use algoplane_state::StateStore;
use algoplane_sync::Reconciler;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Create { name: String, image: String },
    Delete { name: String },
}

/// Records orchestrator calls instead of touching a cluster.
#[derive(Default)]
struct RecordingController {
    calls: Mutex<Vec<Call>>,
}

impl RecordingController {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadController for RecordingController {
    async fn create_workload(&self, name: &str, image: &str) -> WorkloadResult<()> {
        self.calls.lock().unwrap().push(Call::Create {
            name: name.to_string(),
            image: image.to_string(),
        });
        Ok(())
    }

    async fn delete_workload(&self, name: &str) -> WorkloadResult<()> {
        self.calls.lock().unwrap().push(Call::Delete {
            name: name.to_string(),
        });
        Ok(())
    }

    async fn list_workloads(&self) -> WorkloadResult<Vec<String>> {
        Ok(Vec::new())
    }
}

fn test_store() -> StateStore {
    StateStore::open_in_memory().unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn new_client_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "version": 1,
        "image": "algo/base:1.0",
        "cpu": "500m",
        "memory": "256Mi",
        "priority": 1.0,
    })
}

#[tokio::test]
async fn api_index_responds() {
    let router = build_router(test_store());

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_unknown_route_is_not_found() {
    let router = build_router(test_store());

    let req = Request::builder()
        .uri("/api/nope")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_register_and_list_clients() {
    let store = test_store();
    let router = build_router(store.clone());

    let resp = router
        .clone()
        .oneshot(json_request("POST", "/api/client/add", new_client_body("acme")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/api/client")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let clients = store.list_clients().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "acme");
}

#[tokio::test]
async fn api_rejects_unknown_patch_field() {
    let store = test_store();
    let router = build_router(store.clone());

    router
        .clone()
        .oneshot(json_request("POST", "/api/client/add", new_client_body("acme")))
        .await
        .unwrap();

    let resp = router
        .oneshot(json_request(
            "PATCH",
            "/api/client/1",
            serde_json::json!({"not_a_column": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggled_flags_drive_the_reconciler() {
    let store = test_store();
    let router = build_router(store.clone());

    // Register a client; its paired status record gets the same id 1.
    router
        .clone()
        .oneshot(json_request("POST", "/api/client/add", new_client_body("acme")))
        .await
        .unwrap();

    // Enable vwap and hft over the API.
    let resp = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/client/algorithm/1",
            serde_json::json!({"vwap": true, "hft": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Next tick converges toward the new desired state.
    let controller = Arc::new(RecordingController::default());
    let reconciler = Reconciler::new(store.clone(), controller.clone(), Duration::from_secs(1));
    let stats = reconciler.run_once().await.unwrap();

    assert_eq!(stats.clients, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(
        controller.calls(),
        vec![
            Call::Create {
                name: "vwap-1".to_string(),
                image: "algo/base:1.0".to_string(),
            },
            Call::Delete {
                name: "twap-1".to_string(),
            },
            Call::Create {
                name: "hft-1".to_string(),
                image: "algo/base:1.0".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn deleted_client_disappears_from_the_next_tick() {
    let store = test_store();
    let router = build_router(store.clone());

    router
        .clone()
        .oneshot(json_request("POST", "/api/client/add", new_client_body("acme")))
        .await
        .unwrap();

    let resp = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/client/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The reconciler no longer sees the client; no calls are issued for
    // it (its workloads, if any, are orphaned by design).
    let controller = Arc::new(RecordingController::default());
    let reconciler = Reconciler::new(store, controller.clone(), Duration::from_secs(1));
    let stats = reconciler.run_once().await.unwrap();

    assert_eq!(stats.clients, 0);
    assert!(controller.calls().is_empty());
}

#[tokio::test]
async fn updated_image_is_used_on_the_next_tick() {
    let store = test_store();
    let router = build_router(store.clone());

    router
        .clone()
        .oneshot(json_request("POST", "/api/client/add", new_client_body("acme")))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/client/algorithm/1",
            serde_json::json!({"twap": true}),
        ))
        .await
        .unwrap();
    router
        .oneshot(json_request(
            "PATCH",
            "/api/client/1",
            serde_json::json!({"image": "algo/base:2.0"}),
        ))
        .await
        .unwrap();

    let controller = Arc::new(RecordingController::default());
    let reconciler = Reconciler::new(store, controller.clone(), Duration::from_secs(1));
    reconciler.run_once().await.unwrap();

    assert!(controller.calls().contains(&Call::Create {
        name: "twap-1".to_string(),
        image: "algo/base:2.0".to_string(),
    }));
}
