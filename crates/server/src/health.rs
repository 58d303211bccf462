use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::relay::MailRelay;

#[derive(Clone)]
pub struct HealthState {
    relay: Arc<dyn MailRelay>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub relay: HealthCheck,
    pub checked_at: String,
}

pub fn router(relay: Arc<dyn MailRelay>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { relay })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let relay = match state.relay.readiness().await {
        Ok(detail) => HealthCheck { status: "ready", detail },
        Err(detail) => HealthCheck { status: "degraded", detail },
    };
    let ready = relay.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("clearaway-server using {} relay", state.relay.name()),
        },
        relay,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
