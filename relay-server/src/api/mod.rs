//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod dispatch;
pub mod document;
pub mod error;
pub mod extract;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use relay_client::Orchestrator;
use relay_core::domain::poll::PollConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::repository::RouteCache;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn RouteCache>,
    pub orchestrator: Orchestrator,
    /// Polling parameters used when a dispatch request does not set its own
    pub poll_defaults: PollConfig,
    /// Cancelled on shutdown; every dispatch polls under a child token
    pub shutdown: CancellationToken,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Document endpoints
        .route("/documents", post(document::ingest_document))
        .route("/documents/{id}", get(document::get_document))
        .route("/documents/{id}/route", get(document::get_route))
        .route("/documents/{id}/dispatch", post(dispatch::dispatch_route))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryCache;
    use axum::{
        Json,
        body::Body,
        extract::Path,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use relay_client::JobServiceClient;
    use serde_json::{Value as JsonValue, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const PETSTORE: &str = r##"{
        "openapi": "3.0.0",
        "info": { "title": "Petstore", "version": "1.0.0" },
        "components": { "schemas": { "Pet": { "type": "object" } } },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "responses": { "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } } } }
                },
                "post": { "operationId": "createPet" }
            }
        }
    }"##;

    fn state(job_service_url: &str) -> AppState {
        AppState {
            cache: Arc::new(MemoryCache::new()),
            orchestrator: Orchestrator::from_client(JobServiceClient::new(job_service_url)),
            poll_defaults: PollConfig::new(10, 2_000),
            shutdown: CancellationToken::new(),
        }
    }

    async fn body_json(response: axum::response::Response) -> JsonValue {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn ingest(router: &Router, content_type: &str, body: &str) -> axum::response::Response {
        router
            .clone()
            .oneshot(
                Request::post("/documents")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn dispatch_request(id: &str, body: JsonValue) -> Request<Body> {
        Request::post(format!("/documents/{}/dispatch", id))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Job service whose runs are DONE on the first status read and echo the
    /// route input back in their payload
    async fn spawn_job_service(launches: Arc<AtomicUsize>) -> String {
        let router = Router::new()
            .route(
                "/v1/work-items/{id}/runs",
                post(move |Json(body): Json<JsonValue>| async move {
                    let n = launches.fetch_add(1, Ordering::SeqCst);
                    let route = body["inputs"][0]["value"].as_str().unwrap_or_default().to_string();
                    Json(json!({ "run_id": format!("run-{}", n), "route": route }))
                }),
            )
            .route(
                "/v1/runs/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(json!({ "run_id": id, "state": "DONE", "output": { "ok": true } }))
                }),
            );

        serve(router).await
    }

    /// Job service whose runs never leave RUNNING
    async fn spawn_stuck_job_service(status_reads: Arc<AtomicUsize>) -> String {
        let router = Router::new()
            .route(
                "/v1/work-items/{id}/runs",
                post(|| async { Json(json!({ "run_id": "run-stuck" })) }),
            )
            .route(
                "/v1/runs/{id}",
                get(move |Path(id): Path<String>| async move {
                    status_reads.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "run_id": id, "state": "RUNNING" }))
                }),
            );

        serve(router).await
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(state("http://127.0.0.1:1"));
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ingest_and_read_route() {
        let router = create_router(state("http://127.0.0.1:1"));

        let response = ingest(&router, "application/json", PETSTORE).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let summary = body_json(response).await;
        assert_eq!(summary["title"], "Petstore");
        assert_eq!(summary["routes"].as_array().unwrap().len(), 2);
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/documents/{}/route?method=get&path=/pets", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let route = body_json(response).await;
        assert_eq!(route["method"], "GET");
        assert_eq!(
            route["operation"]["responses"]["200"]["content"]["application/json"]["schema"],
            json!({ "type": "object" })
        );

        let response = router
            .oneshot(
                Request::get(format!("/documents/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ingest_yaml() {
        let router = create_router(state("http://127.0.0.1:1"));
        let yaml = "info:\n  title: Orders\npaths:\n  /orders:\n    post:\n      operationId: createOrder\n";

        let response = ingest(&router, "application/yaml", yaml).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let summary = body_json(response).await;
        assert_eq!(summary["routes"][0]["operation_id"], "createOrder");
    }

    #[tokio::test]
    async fn test_ingest_rejects_bad_input() {
        let router = create_router(state("http://127.0.0.1:1"));

        let response = ingest(&router, "text/html", "<html/>").await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = ingest(&router, "application/json", "{ not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert_eq!(error["kind"], "bad_request");
    }

    #[tokio::test]
    async fn test_unknown_document_is_404() {
        let router = create_router(state("http://127.0.0.1:1"));
        let response = router
            .oneshot(
                Request::get(format!("/documents/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_runs_cached_route() {
        let launches = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_job_service(launches.clone()).await;
        let router = create_router(state(&base_url));

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(
                Request::post(format!("/documents/{}/dispatch", id))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::from(
                        json!({
                            "method": "GET",
                            "path": "/pets",
                            "user_id": "u-1",
                            "work_item_id": "w-1"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result = body_json(response).await;
        assert_eq!(result["start_details"]["run_id"], "run-0");
        assert_eq!(result["final_result"]["state"], "DONE");
        assert_eq!(result["final_result"]["payload"]["output"]["ok"], true);

        let forwarded: JsonValue =
            serde_json::from_str(result["start_details"]["payload"]["route"].as_str().unwrap())
                .unwrap();
        assert_eq!(forwarded["operation_id"], "listPets");
        assert_eq!(launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_requires_bearer_token() {
        let router = create_router(state("http://127.0.0.1:1"));
        let response = router
            .oneshot(
                Request::post(format!("/documents/{}/dispatch", uuid::Uuid::new_v4()))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "method": "GET",
                            "path": "/pets",
                            "user_id": "u-1",
                            "work_item_id": "w-1"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_route_is_404_without_launch() {
        let launches = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_job_service(launches.clone()).await;
        let router = create_router(state(&base_url));

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(
                Request::post(format!("/documents/{}/dispatch", id))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::from(
                        json!({
                            "method": "DELETE",
                            "path": "/pets",
                            "user_id": "u-1",
                            "work_item_id": "w-1"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_launch_failure_is_bad_gateway() {
        // Nothing listens on the job service port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let router = create_router(state(&format!("http://{}", addr)));

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(
                Request::post(format!("/documents/{}/dispatch", id))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::from(
                        json!({
                            "method": "POST",
                            "path": "/pets",
                            "user_id": "u-1",
                            "work_item_id": "w-1"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["kind"], "launch_failed");
    }

    #[tokio::test]
    async fn test_malformed_dispatch_body_is_400_json() {
        let router = create_router(state("http://127.0.0.1:1"));
        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(dispatch_request(
                &id,
                json!({ "method": "GET", "path": "/pets" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert_eq!(error["kind"], "bad_request");
        assert!(error["error"].as_str().unwrap().contains("user_id"));
    }

    #[tokio::test]
    async fn test_non_uuid_document_id_is_400_json() {
        let router = create_router(state("http://127.0.0.1:1"));

        let response = router
            .clone()
            .oneshot(
                Request::get("/documents/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "bad_request");

        let response = router
            .oneshot(dispatch_request(
                "not-a-uuid",
                json!({ "method": "GET", "path": "/pets", "user_id": "u-1", "work_item_id": "w-1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "bad_request");
    }

    #[tokio::test]
    async fn test_route_lookup_without_query_is_400_json() {
        let router = create_router(state("http://127.0.0.1:1"));
        let response = router
            .oneshot(
                Request::get(format!("/documents/{}/route?method=GET", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "bad_request");
    }

    #[tokio::test]
    async fn test_dispatch_rejects_zero_interval_without_launch() {
        let launches = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_job_service(launches.clone()).await;
        let router = create_router(state(&base_url));

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(dispatch_request(
                &id,
                json!({
                    "method": "GET",
                    "path": "/pets",
                    "user_id": "u-1",
                    "work_item_id": "w-1",
                    "interval_ms": 0
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "bad_request");
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_dispatch_while_polling() {
        let status_reads = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_stuck_job_service(status_reads.clone()).await;
        let state = state(&base_url);
        let shutdown = state.shutdown.clone();
        let router = create_router(state);

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let dispatch = tokio::spawn(router.oneshot(dispatch_request(
            &id,
            json!({
                "method": "GET",
                "path": "/pets",
                "user_id": "u-1",
                "work_item_id": "w-1",
                "interval_ms": 10,
                "timeout_ms": 60_000
            }),
        )));

        while status_reads.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        shutdown.cancel();

        let response = dispatch.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let error = body_json(response).await;
        assert_eq!(error["kind"], "cancelled");
        assert!(error["error"].as_str().unwrap().contains("run-stuck"));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_dispatch_while_launching() {
        let launch_started = Arc::new(tokio::sync::Notify::new());
        let notify = launch_started.clone();
        let base_url = serve(Router::new().route(
            "/v1/work-items/{id}/runs",
            post(move || async move {
                notify.notify_one();
                std::future::pending::<Json<JsonValue>>().await
            }),
        ))
        .await;
        let state = state(&base_url);
        let shutdown = state.shutdown.clone();
        let router = create_router(state);

        let summary = body_json(ingest(&router, "application/json", PETSTORE).await).await;
        let id = summary["document_id"].as_str().unwrap().to_string();

        let dispatch = tokio::spawn(router.oneshot(dispatch_request(
            &id,
            json!({ "method": "GET", "path": "/pets", "user_id": "u-1", "work_item_id": "w-1" }),
        )));

        launch_started.notified().await;
        shutdown.cancel();

        let response = dispatch.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let error = body_json(response).await;
        assert_eq!(error["kind"], "cancelled");
        assert_eq!(error["error"], "orchestration cancelled");
    }
}
