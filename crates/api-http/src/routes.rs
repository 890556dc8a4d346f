//! Route definitions

use crate::handlers;
use crate::logs;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // MIP-003 agent endpoints
        .route("/start_job", post(handlers::start_job))
        .route("/status", get(handlers::job_status))
        .route("/provide_input", post(handlers::provide_input))
        .route("/availability", get(handlers::availability))
        .route("/input_schema", get(handlers::input_schema))
        .route("/health", get(handlers::health))
        // One-click flow
        .route("/startSuper", post(handlers::start_super))
        .route("/superStatus", get(handlers::super_status))
        // Logs
        .route("/logs", get(logs::stream_logs))
        .route("/log-viewer", get(logs::log_viewer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogBuffer, LogBufferLayer, LogEntry};
    use crate::types::DEFAULT_SUPER_IDENTIFIER;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use paygate_core::application::{
        AgentConfig, JobService, PaymentMonitor, SuperJobConfig, SuperJobService,
    };
    use paygate_core::domain::{Amount, JobStatus, PaymentState};
    use paygate_core::port::id_provider::mocks::SequentialIdProvider;
    use paygate_core::port::job_repository::mocks::{MockJobRepository, MockSuperJobRepository};
    use paygate_core::port::payment_gateway::mocks::{MockPaymentGateway, MockPurchaseGateway};
    use paygate_core::port::time_provider::mocks::ManualTimeProvider;
    use paygate_core::port::{JobRepository, SuperJobRepository};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::EnvFilter;

    const MAX_BODY: usize = 1024 * 1024;

    struct TestContext {
        app: Router,
        repo: Arc<MockJobRepository>,
        super_repo: Arc<MockSuperJobRepository>,
        logs: Arc<LogBuffer>,
    }

    fn context_with(purchase: MockPurchaseGateway) -> TestContext {
        let repo = Arc::new(MockJobRepository::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let clock = Arc::new(ManualTimeProvider::new(1_000));
        let (monitor, _events) = PaymentMonitor::new(gateway.clone(), Duration::from_secs(3600));

        let jobs = Arc::new(JobService::new(
            repo.clone(),
            gateway,
            Arc::new(monitor),
            Arc::new(SequentialIdProvider::new("job")),
            clock.clone(),
            AgentConfig {
                agent_identifier: "agent-42".to_string(),
                seller_vkey: "vkey-1".to_string(),
                network: "Preprod".to_string(),
                amounts: vec![Amount::new("10000000", "lovelace")],
            },
        ));
        let super_repo = Arc::new(MockSuperJobRepository::new());
        let super_jobs = SuperJobService::new(
            super_repo.clone(),
            jobs.clone(),
            Arc::new(purchase),
            Arc::new(SequentialIdProvider::new("super")),
            clock,
            SuperJobConfig::default(),
        );
        let logs = Arc::new(LogBuffer::new(100));

        TestContext {
            app: create_router(Arc::new(AppState::new(jobs, super_jobs, logs.clone()))),
            repo,
            super_repo,
            logs,
        }
    }

    fn context() -> TestContext {
        context_with(MockPurchaseGateway::new())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), MAX_BODY).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_start_job_returns_receipt() {
        let ctx = context();
        let (status, body) = send(
            &ctx.app,
            post_json(
                "/start_job",
                json!({"identifier_from_purchaser": "buyer-1", "input_data": {"text": "hello"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["job_id"], "job-1");
        assert_eq!(body["blockchainIdentifier"], "pay-1");
        assert_eq!(body["submitResultTime"], "1700000600000");
        assert_eq!(body["agentIdentifier"], "agent-42");
        assert_eq!(body["sellerVkey"], "vkey-1");
        assert_eq!(body["identifierFromPurchaser"], "buyer-1");
        assert_eq!(body["amounts"][0]["unit"], "lovelace");
        assert_eq!(body["input_hash"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_start_job_validation() {
        let ctx = context();
        let (status, body) = send(
            &ctx.app,
            post_json("/start_job", json!({"identifier_from_purchaser": "buyer-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("input_data"));

        let (status, body) = send(&ctx.app, post_json("/start_job", json!("not an object"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let ctx = context();
        send(
            &ctx.app,
            post_json(
                "/start_job",
                json!({"identifier_from_purchaser": "b", "input_data": "task"}),
            ),
        )
        .await;

        let (status, body) = send(&ctx.app, get("/status?job_id=job-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "awaiting_payment");
        assert_eq!(body["payment_status"], "pending");
        assert!(body["result"].is_null());
        assert!(body.get("error").is_none());

        let id = "job-1".to_string();
        ctx.repo.modify(&id, Box::new(|j| j.start(2_000))).await.unwrap();
        ctx.repo
            .modify(&id, Box::new(|j| j.complete("report", 3_000)))
            .await
            .unwrap();

        let (_, body) = send(&ctx.app, get("/status?job_id=job-1")).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["payment_status"], "completed");
        assert_eq!(body["result"], "report");

        let stored = ctx.repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.payment_status, PaymentState::Completed);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let ctx = context();
        let (status, body) = send(&ctx.app, get("/status?job_id=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Job not found"}));

        let (status, _) = send(&ctx.app, get("/status")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_provide_input() {
        let ctx = context();
        send(
            &ctx.app,
            post_json(
                "/start_job",
                json!({"identifier_from_purchaser": "b", "input_data": "first"}),
            ),
        )
        .await;

        let (status, body) = send(
            &ctx.app,
            post_json("/provide_input", json!({"job_id": "job-1", "input_data": "second"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["job_id"], "job-1");

        ctx.repo
            .modify(&"job-1".to_string(), Box::new(|j| j.start(2_000)))
            .await
            .unwrap();
        let (status, _) = send(
            &ctx.app,
            post_json("/provide_input", json!({"job_id": "job-1", "input_data": "third"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_static_endpoints() {
        let ctx = context();

        let (status, body) = send(&ctx.app, get("/availability")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "available",
                "agentIdentifier": "agent-42",
                "message": "The server is running smoothly."
            })
        );

        let (_, body) = send(&ctx.app, get("/input_schema")).await;
        assert_eq!(body["input_data"][0]["id"], "text");
        assert_eq!(body["input_data"][0]["type"], "string");
        assert!(body["input_data"][0]["data"]["placeholder"].is_string());

        let (_, body) = send(&ctx.app, get("/health")).await;
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_super_job_endpoints() {
        let ctx = context();
        let (status, body) =
            send(&ctx.app, post_json("/startSuper", json!({"identifier": "buyer"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job_id"], "super-1");
        assert_eq!(body["status"], "started");

        let (status, body) = send(&ctx.app, get("/superStatus?job_id=super-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job_id"], "super-1");
        assert!(body["elapsed_seconds"].is_number());

        let (status, body) = send(&ctx.app, get("/superStatus?job_id=missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Super job not found");
    }

    #[tokio::test]
    async fn test_start_super_defaults_identifier() {
        let ctx = context();
        let (status, body) = send(&ctx.app, post_json("/startSuper", json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        let super_job = ctx
            .super_repo
            .find_by_id(&body["job_id"].as_str().unwrap().to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(super_job.identifier, DEFAULT_SUPER_IDENTIFIER);

        let (status, body) =
            send(&ctx.app, post_json("/startSuper", json!({"identifier": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("identifier"));
    }

    #[tokio::test]
    async fn test_requests_are_logged_at_info() {
        let ctx = context();
        let captured = Arc::new(LogBuffer::new(100));
        let subscriber = tracing_subscriber::registry()
            .with(LogBufferLayer::new(captured.clone()))
            .with(EnvFilter::new("paygate=info,tower_http=info"));
        let _guard = tracing::subscriber::set_default(subscriber);

        let (status, _) = send(&ctx.app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);

        let entries = captured.recent(100);
        let finished = entries
            .iter()
            .find(|e| e.logger.starts_with("tower_http"))
            .expect("no tower_http entry captured");
        assert_eq!(finished.level, "INFO");
        assert!(finished.message.contains("finished processing request"));
        assert!(finished.message.contains("status=200"));
    }

    #[tokio::test]
    async fn test_start_super_without_token_is_401() {
        let ctx = context_with(MockPurchaseGateway::without_credentials());
        let (status, body) =
            send(&ctx.app, post_json("/startSuper", json!({"identifier": "buyer"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["detail"].as_str().unwrap().starts_with("Missing API key"));
    }

    #[tokio::test]
    async fn test_log_viewer_and_stream() {
        let ctx = context();
        ctx.logs.push(LogEntry {
            timestamp: 1.0,
            level: "INFO".to_string(),
            message: "buffered entry".to_string(),
            logger: "paygate".to_string(),
        });

        let response = ctx.app.clone().oneshot(get("/log-viewer")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), MAX_BODY).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("EventSource('/logs')"));

        let response = ctx.app.clone().oneshot(get("/logs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        // Stream never ends: read the first frame only
        let mut body = response.into_body().into_data_stream();
        let first = futures::StreamExt::next(&mut body).await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).contains("buffered entry"));
    }
}
