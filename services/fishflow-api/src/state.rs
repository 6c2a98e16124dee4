//! Application state for the FishFlow API.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;
use tracing::info;

use scenario_data::ScenarioDataService;
use storage::StorageBackend;

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Query service; replaced wholesale when the catalog is reloaded.
    service: RwLock<Arc<ScenarioDataService>>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Prometheus exporter, absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Scan the backend and build the initial catalog.
    pub async fn new(backend: Arc<dyn StorageBackend>, config: ServiceConfig) -> Self {
        let service = ScenarioDataService::load(backend).await;
        Self::from_service(service, config)
    }

    pub fn from_service(service: ScenarioDataService, config: ServiceConfig) -> Self {
        Self {
            service: RwLock::new(Arc::new(service)),
            config,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Snapshot of the current service. Requests keep their snapshot even if
    /// a reload swaps in a new one meanwhile.
    pub async fn service(&self) -> Arc<ScenarioDataService> {
        Arc::clone(&*self.service.read().await)
    }

    /// Re-scan the backend and swap in the new catalog.
    ///
    /// The scan runs without holding the lock; only the swap takes it.
    pub async fn reload(&self) -> Arc<ScenarioDataService> {
        let backend = Arc::clone(self.service().await.backend());
        let reloaded = Arc::new(ScenarioDataService::load(backend).await);

        *self.service.write().await = Arc::clone(&reloaded);

        info!(
            movement = reloaded.list_movement_scenarios().len(),
            depth = reloaded.list_depth_scenarios().len(),
            "Scenario catalog reloaded"
        );
        reloaded
    }
}
