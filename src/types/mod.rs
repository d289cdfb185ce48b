//! Shared data structures for the pump/valve predictive maintenance dashboard
//!
//! - `channel`: the 12 sensor channels, 3 fault indicators and equipment keys
//! - `observation`: a single timestamped row of sensor readings

mod channel;
mod observation;

pub use channel::*;
pub use observation::*;
