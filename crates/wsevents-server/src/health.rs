//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

use crate::errors::HubError;
use crate::hub::Hub;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`; an unhealthy server answers 503 instead.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Live connections in the hub.
    pub connections: usize,
}

/// Ask the hub for its live count and build a health response.
///
/// Fails when the hub control loop is gone.
pub async fn health_check(start_time: Instant, hub: &Hub) -> Result<HealthResponse, HubError> {
    let connections = hub.connection_count().await?;
    Ok(HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
    })
}
