//! Simulation clock endpoints

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::DashboardState;
use crate::simulation::{SimulationPhase, SimulationStatus};

#[derive(Debug, Serialize)]
pub struct SimulationAck {
    pub status: &'static str,
    pub phase: SimulationPhase,
}

/// POST /api/simulation/start
pub async fn start_simulation(State(state): State<DashboardState>) -> Json<SimulationAck> {
    let phase = state.simulation.start();
    Json(SimulationAck {
        status: "Simulation started",
        phase,
    })
}

/// POST /api/simulation/stop
pub async fn stop_simulation(State(state): State<DashboardState>) -> Json<SimulationAck> {
    let phase = state.simulation.stop();
    Json(SimulationAck {
        status: "Simulation stopped",
        phase,
    })
}

/// GET /api/simulation/status
pub async fn get_simulation_status(State(state): State<DashboardState>) -> Json<SimulationStatus> {
    Json(state.simulation.status())
}
