//! Sensor channels, fault indicators and equipment keys

use serde::{Deserialize, Serialize};

/// Number of continuous sensor channels per observation.
pub const NUM_CHANNELS: usize = 12;

/// Number of binary fault indicators per observation.
pub const NUM_FAULTS: usize = 3;

/// Sensor channel names in fit/training order.
///
/// Scalers and forecast regressors were fit on columns in exactly this order,
/// so every feature matrix built by the crate uses it as the column order.
pub const CHANNELS: [&str; NUM_CHANNELS] = [
    "310A_FI_4303",
    "310A_DI_3302",
    "310A_PI_0316",
    "310A_PI_0325",
    "310A_PI_0578",
    "310A_PI_0580",
    "310A_FI_4301",
    "310ASP01DI01SPM",
    "310ASP01SI01SPM",
    "310A_TI_5303_D",
    "310A_TI_5304_D",
    "310A_PDI_0308",
];

/// Fault indicator column names, indexed by [`Equipment::index`].
pub const FAULT_COLUMNS: [&str; NUM_FAULTS] = ["faulty_SP", "faulty_TK", "faulty_VP"];

/// Position of a channel in [`CHANNELS`].
pub fn channel_index(name: &str) -> Option<usize> {
    CHANNELS.iter().position(|c| *c == name)
}

/// Monitored equipment subsystem, one per fault indicator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    Sp,
    Tk,
    Vp,
}

impl Equipment {
    /// All equipment keys in fault-column order.
    pub const ALL: [Equipment; NUM_FAULTS] = [Equipment::Sp, Equipment::Tk, Equipment::Vp];

    /// Parse an equipment key (`sp`, `tk`, `vp`), case-insensitive.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "sp" => Some(Equipment::Sp),
            "tk" => Some(Equipment::Tk),
            "vp" => Some(Equipment::Vp),
            _ => None,
        }
    }

    /// Lowercase key used in API payloads.
    pub fn key(self) -> &'static str {
        match self {
            Equipment::Sp => "sp",
            Equipment::Tk => "tk",
            Equipment::Vp => "vp",
        }
    }

    /// Index into an observation's fault array.
    pub fn index(self) -> usize {
        match self {
            Equipment::Sp => 0,
            Equipment::Tk => 1,
            Equipment::Vp => 2,
        }
    }

    /// Name of the fault indicator column for this equipment.
    pub fn fault_column(self) -> &'static str {
        FAULT_COLUMNS[self.index()]
    }
}

impl std::fmt::Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_parse_is_case_insensitive() {
        assert_eq!(Equipment::parse("SP"), Some(Equipment::Sp));
        assert_eq!(Equipment::parse(" tk "), Some(Equipment::Tk));
        assert_eq!(Equipment::parse("vp"), Some(Equipment::Vp));
        assert_eq!(Equipment::parse("xyz"), None);
        assert_eq!(Equipment::parse("all"), None);
    }

    #[test]
    fn test_fault_columns_follow_equipment_order() {
        for eq in Equipment::ALL {
            assert_eq!(FAULT_COLUMNS[eq.index()], eq.fault_column());
        }
        assert_eq!(Equipment::Tk.fault_column(), "faulty_TK");
    }

    #[test]
    fn test_channel_index() {
        assert_eq!(channel_index("310A_FI_4303"), Some(0));
        assert_eq!(channel_index("310A_PDI_0308"), Some(11));
        assert_eq!(channel_index("faulty_SP"), None);
    }
}
