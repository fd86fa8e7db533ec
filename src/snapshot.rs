use crate::classify::MeasurementBands;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

// Fault codes carried on the wire
pub const FAULT_CODE_NONE: u8 = 0;
pub const FAULT_CODE_OVERCURRENT: u8 = 1;
pub const FAULT_CODE_DIFFERENTIAL: u8 = 2;
pub const FAULT_CODE_DISTANCE: u8 = 3;
/// Out-of-range on purpose so `Unknown` survives an encode/decode cycle.
pub const FAULT_CODE_UNKNOWN: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FaultKind {
    #[default]
    None,
    Overcurrent,
    Differential,
    Distance,
    Unknown,
}

impl FaultKind {
    /// Any code outside 0..=3 degrades to `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => FaultKind::None,
            1 => FaultKind::Overcurrent,
            2 => FaultKind::Differential,
            3 => FaultKind::Distance,
            _ => FaultKind::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            FaultKind::None => FAULT_CODE_NONE,
            FaultKind::Overcurrent => FAULT_CODE_OVERCURRENT,
            FaultKind::Differential => FAULT_CODE_DIFFERENTIAL,
            FaultKind::Distance => FAULT_CODE_DISTANCE,
            FaultKind::Unknown => FAULT_CODE_UNKNOWN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FaultKind::None => "No Fault",
            FaultKind::Overcurrent => "Overcurrent",
            FaultKind::Differential => "Differential",
            FaultKind::Distance => "Distance",
            FaultKind::Unknown => "Unknown",
        }
    }

    pub fn is_fault(self) -> bool {
        !matches!(self, FaultKind::None)
    }
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// One instant of protection state as exchanged between relay and breaker.
///
/// Measurements are raw values with no enforced range: out-of-band values are
/// classified, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub trip: bool,
    pub close: bool,
    pub fault_type: FaultKind,
    pub protection_element: i32,
    pub current: f64,
    pub voltage: f64,
    pub frequency: f64,
}

assert_impl_all!(Snapshot: Copy, Send, Sync);

impl Snapshot {
    pub fn bands(&self) -> MeasurementBands {
        MeasurementBands::of(self.current, self.voltage, self.frequency)
    }

    /// Quiescent means neither trip nor close is asserted.
    pub fn is_quiescent(&self) -> bool {
        !self.trip && !self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back_to_kinds() {
        for kind in [
            FaultKind::None,
            FaultKind::Overcurrent,
            FaultKind::Differential,
            FaultKind::Distance,
            FaultKind::Unknown,
        ] {
            assert_eq!(FaultKind::from_code(i64::from(kind.code())), kind);
        }
    }

    #[test]
    fn out_of_range_codes_are_unknown() {
        assert_eq!(FaultKind::from_code(4), FaultKind::Unknown);
        assert_eq!(FaultKind::from_code(-1), FaultKind::Unknown);
        assert_eq!(FaultKind::from_code(9), FaultKind::Unknown);
    }
}
