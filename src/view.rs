use crate::breaker::BreakerState;
use crate::classify::MeasurementBands;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Local};
use serde::Serialize;

pub const NEVER_UPDATED: &str = "Never";
pub const COMMAND_ACTIVE: &str = "ACTIVE";
pub const COMMAND_INACTIVE: &str = "INACTIVE";

/// Display-ready breaker monitor state, recomputed from each decoded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerView {
    pub trip_status: String,
    pub close_status: String,
    pub fault_type: String,
    pub protection_element: String,
    pub current: String,
    pub voltage: String,
    pub frequency: String,
    pub breaker: BreakerState,
    pub last_update: String,
    pub bands: Option<MeasurementBands>,
}

impl BreakerView {
    /// Monitor defaults before any snapshot has been observed.
    pub fn never_updated(breaker: BreakerState) -> Self {
        Self {
            trip_status: COMMAND_INACTIVE.to_string(),
            close_status: COMMAND_INACTIVE.to_string(),
            fault_type: "Unknown".to_string(),
            protection_element: "--".to_string(),
            current: format_current(0.0),
            voltage: format_voltage(0.0),
            frequency: format_frequency(0.0),
            breaker,
            last_update: NEVER_UPDATED.to_string(),
            bands: None,
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot, breaker: BreakerState, observed_at: DateTime<Local>) -> Self {
        Self {
            trip_status: command_status(snapshot.trip).to_string(),
            close_status: command_status(snapshot.close).to_string(),
            fault_type: snapshot.fault_type.label().to_string(),
            protection_element: snapshot.protection_element.to_string(),
            current: format_current(snapshot.current),
            voltage: format_voltage(snapshot.voltage),
            frequency: format_frequency(snapshot.frequency),
            breaker,
            last_update: format_observed_at(Some(observed_at)),
            bands: Some(snapshot.bands()),
        }
    }
}

fn command_status(active: bool) -> &'static str {
    if active {
        COMMAND_ACTIVE
    } else {
        COMMAND_INACTIVE
    }
}

pub fn format_current(amps: f64) -> String {
    format!("{:.1} A", amps)
}

pub fn format_voltage(volts: f64) -> String {
    format!("{:.0} V", volts)
}

pub fn format_frequency(hertz: f64) -> String {
    format!("{:.1} Hz", hertz)
}

pub fn format_observed_at(observed_at: Option<DateTime<Local>>) -> String {
    match observed_at {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None => NEVER_UPDATED.to_string(),
    }
}
