//! Reliability KPI endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::DashboardState;
use crate::analytics::{kpi_report, KpiReport};

#[derive(Debug, Deserialize)]
pub struct KpiParams {
    pub equipment: Option<String>,
}

/// GET /api/kpis?equipment=sp|tk|vp|all
pub async fn get_kpis(State(state): State<DashboardState>, Query(params): Query<KpiParams>) -> Json<KpiReport> {
    let window = state.history.snapshot();
    Json(kpi_report(window.rows(), params.equipment.as_deref()))
}
