//! Shared application state for HTTP handlers.

use std::sync::Arc;

use hark_db::DbPool;
use hark_jobs::Orchestrator;
use hark_notify::WebhookNotifier;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ServerConfig;

/// State shared across all request handlers.
///
/// Cloned per request by axum, so everything here is either a handle or
/// behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Server configuration, fixed at startup.
    pub config: Arc<ServerConfig>,
    /// Job lifecycle coordinator shared with the worker pool.
    pub orchestrator: Arc<Orchestrator>,
    /// Webhook delivery client, also used by the webhook test endpoint.
    pub notifier: Arc<WebhookNotifier>,
    /// Render handle for the Prometheus exposition endpoint.
    pub metrics: PrometheusHandle,
}
