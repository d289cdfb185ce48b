//! pumpguard: Predictive Maintenance Dashboard for Pump/Valve Systems
//!
//! Replays a historical sensor dataset as if it were live and serves model
//! inference and reliability statistics over HTTP.
//!
//! ## Architecture
//!
//! - **Data**: CSV/synthetic history behind an atomically published window
//! - **Models**: JSON scaler, regressor and classifier artifacts behind traits
//! - **Forecast**: lag features, per-channel dispatch, inverse scaling
//! - **Analytics**: reliability KPIs, SPC, health scores, anomalies
//! - **Simulation**: replay clock advancing the history cursor
//! - **API**: Axum router over an explicit `DashboardState`

pub mod analytics;
pub mod api;
pub mod config;
pub mod data;
pub mod forecast;
pub mod models;
pub mod simulation;
pub mod types;

pub use api::{create_app, DashboardState};
pub use config::DashboardConfig;
pub use data::{HistoryStore, HistoryWindow};
pub use models::ModelStore;
pub use simulation::{SimulationController, SimulationPhase, SimulationStatus};
pub use types::{Equipment, ObservationRow, CHANNELS, FAULT_COLUMNS};
