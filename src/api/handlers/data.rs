//! Historical data endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

use super::DashboardState;
use crate::api::error::ApiError;
use crate::types::{channel_values, Equipment, CHANNELS};

/// One column of the history: sensor readings or 0/1 fault flags.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Series {
    Readings(Vec<f64>),
    Flags(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct CurrentDataResponse {
    pub timestamps: Vec<String>,
    pub parameters: BTreeMap<&'static str, Series>,
}

/// GET /api/current-data - Every visible row, column-oriented
pub async fn get_current_data(
    State(state): State<DashboardState>,
) -> Result<Json<CurrentDataResponse>, ApiError> {
    let window = state.history.snapshot();
    let rows = window.rows();
    if rows.is_empty() {
        return Err(ApiError::NotFound("No data available".to_string()));
    }

    let mut parameters = BTreeMap::new();
    for (c, name) in CHANNELS.iter().enumerate() {
        parameters.insert(*name, Series::Readings(channel_values(rows, c)));
    }
    for eq in Equipment::ALL {
        let flags = rows.iter().map(|r| r.faults[eq.index()]).collect();
        parameters.insert(eq.fault_column(), Series::Flags(flags));
    }

    Ok(Json(CurrentDataResponse {
        timestamps: rows.iter().map(|r| r.formatted_timestamp()).collect(),
        parameters,
    }))
}
