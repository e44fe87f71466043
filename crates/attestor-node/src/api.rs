//! SignatureIngress: the aggregator's HTTP surface.
//!
//! Operators POST partial signatures here. The contract is deliberately
//! blunt: `200` with body `"true"` on acceptance, `500` with body `"false"`
//! on any failure — malformed payload, unknown task, duplicate signer.

use attestor_aggregation::SchedulerHandle;
use attestor_types::SignatureSubmission;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    scheduler: SchedulerHandle,
}

pub fn routes(scheduler: SchedulerHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signature", post(submit_signature))
        .with_state(Arc::new(AppState { scheduler }))
}

pub fn start_api_server(scheduler: SchedulerHandle, host: String, port: u16) -> JoinHandle<()> {
    let app = routes(scheduler);
    let addr = format!("{}:{}", host, port);
    info!("Starting signature ingress on {}", addr);

    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind signature ingress");
        axum::serve(listener, app)
            .await
            .expect("Signature ingress failed");
    })
}

async fn health() -> &'static str {
    "OK"
}

async fn submit_signature(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignatureSubmission>, JsonRejection>,
) -> (StatusCode, &'static str) {
    let Ok(Json(submission)) = payload else {
        warn!("Rejected signature submission with unparseable body");
        return (StatusCode::INTERNAL_SERVER_ERROR, "false");
    };

    // Full field validation happens before the scheduler sees anything.
    let partial = match submission.to_partial_signature() {
        Ok(partial) => partial,
        Err(e) => {
            warn!(error = %e, "Rejected malformed signature submission");
            return (StatusCode::INTERNAL_SERVER_ERROR, "false");
        }
    };

    match state
        .scheduler
        .submit_partial_signature(
            partial.task_index,
            partial.operator_id,
            partial.point,
            submission.metadata_url.clone(),
        )
        .await
    {
        Ok(()) => (StatusCode::OK, "true"),
        Err(e) => {
            warn!(
                task_index = partial.task_index,
                operator_id = %partial.operator_id,
                error = %e,
                "Signature submission failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "false")
        }
    }
}
