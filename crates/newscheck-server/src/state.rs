use metrics_exporter_prometheus::PrometheusHandle;
use newscheck_classifiers::Detector;
use std::sync::Arc;

/// Shared application state
#[derive(Clone, Default)]
pub struct AppState {
    /// Absent when no model loaded and the fallback could not be built
    pub detector: Option<Arc<Detector>>,

    /// Prometheus handle for rendering `/metrics`
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(detector: Option<Detector>) -> Self {
        Self {
            detector: detector.map(Arc::new),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.is_some()
    }
}
