//! newscheck Server
//!
//! HTTP API over the fake news [`Detector`](newscheck_classifiers::Detector).
//!
//! Endpoints, each served at the root and under `/api`:
//! - `GET /` service banner
//! - `GET /health` liveness and whether a model is loaded
//! - `GET /model/info` metadata of the active model
//! - `POST /predict` classify one text
//! - `POST /batch-predict` classify several texts, preserving order
//!
//! plus `GET /metrics` in Prometheus text format.

pub mod app;
pub mod commands;
pub mod config;
pub mod routes;
pub mod state;

pub use app::build_router;
pub use config::{CorsConfig, MetricsConfig, ServerConfig};
pub use routes::AppError;
pub use state::AppState;
