//! Dashboard Configuration Module
//!
//! Deployment settings loaded from TOML, with every field defaulted.
//!
//! ## Loading Order
//!
//! 1. `PUMPGUARD_CONFIG` environment variable (path to TOML file)
//! 2. `pumpguard.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded config is carried inside `DashboardState`; there is no global.

mod dashboard_config;
pub mod defaults;

pub use dashboard_config::*;
