//! Synthetic pump/valve history for demos and tests.
//!
//! Channels follow their nominal operating points with Gaussian noise. Fault
//! episodes start at random, last a few rows and push the channels tied to
//! the faulty equipment away from nominal.

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::loader::assign_timestamps;
use crate::types::{Equipment, ObservationRow, NUM_CHANNELS, NUM_FAULTS};

/// Nominal value and noise sigma per channel, in channel order.
const NOMINAL: [(f64, f64); NUM_CHANNELS] = [
    (152.0, 3.0),  // 310A_FI_4303
    (1.32, 0.02),  // 310A_DI_3302
    (4.1, 0.08),   // 310A_PI_0316
    (3.9, 0.08),   // 310A_PI_0325
    (12.5, 0.2),   // 310A_PI_0578
    (12.1, 0.2),   // 310A_PI_0580
    (148.0, 3.0),  // 310A_FI_4301
    (1.30, 0.02),  // 310ASP01DI01SPM
    (98.0, 1.5),   // 310ASP01SI01SPM
    (61.0, 0.8),   // 310A_TI_5303_D
    (59.5, 0.8),   // 310A_TI_5304_D
    (0.42, 0.03),  // 310A_PDI_0308
];

/// Probability per row that an idle equipment enters a fault episode.
const FAULT_ONSET_PROBABILITY: f64 = 0.01;

/// Fault episode length range in rows.
const FAULT_DURATION: std::ops::RangeInclusive<usize> = 3..=8;

/// Channels disturbed by each equipment fault, with the shift in sigmas.
fn affected_channels(equipment: Equipment) -> &'static [(usize, f64)] {
    match equipment {
        Equipment::Sp => &[(7, 6.0), (8, -5.0)],
        Equipment::Tk => &[(9, 7.0), (10, 6.0)],
        Equipment::Vp => &[(2, -5.0), (3, -5.0), (11, 8.0)],
    }
}

#[derive(Debug)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` rows stamped the same way as loaded CSV rows.
    pub fn generate(&mut self, count: usize, now: NaiveDateTime) -> Vec<ObservationRow> {
        let mut remaining = [0usize; NUM_FAULTS];

        assign_timestamps(count, now)
            .into_iter()
            .map(|timestamp| {
                let mut channels = [0.0; NUM_CHANNELS];
                for (value, (nominal, sigma)) in channels.iter_mut().zip(NOMINAL) {
                    let z: f64 = self.rng.sample(StandardNormal);
                    *value = nominal + sigma * z;
                }

                let mut faults = [0u8; NUM_FAULTS];
                for eq in Equipment::ALL {
                    let i = eq.index();
                    if remaining[i] == 0 && self.rng.gen_bool(FAULT_ONSET_PROBABILITY) {
                        remaining[i] = self.rng.gen_range(FAULT_DURATION);
                    }
                    if remaining[i] > 0 {
                        remaining[i] -= 1;
                        faults[i] = 1;
                        for &(c, shift) in affected_channels(eq) {
                            channels[c] += shift * NOMINAL[c].1;
                        }
                    }
                }

                ObservationRow {
                    timestamp,
                    channels,
                    faults,
                }
            })
            .collect()
    }
}
