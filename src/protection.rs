//! Relay-side protection functions.
//!
//! Derives trip intent, fault type and the asserting element from the
//! measurements before a snapshot is published. Later checks override
//! earlier ones, and a manually selected fault overrides them all.

use crate::snapshot::{FaultKind, Snapshot};
use serde::{Deserialize, Serialize};

// Pickup levels. Strict comparisons, unlike the display bands.
pub const OVERCURRENT_PICKUP_A: f64 = 3500.0;
pub const UNDERVOLTAGE_PICKUP_V: f64 = 8000.0;
pub const OVERVOLTAGE_PICKUP_V: f64 = 14000.0;
pub const UNDERFREQUENCY_PICKUP_HZ: f64 = 49.0;
pub const OVERFREQUENCY_PICKUP_HZ: f64 = 51.0;

// ANSI device numbers
pub const ELEMENT_OVERCURRENT: i32 = 50;
pub const ELEMENT_UNDERVOLTAGE: i32 = 27;
pub const ELEMENT_OVERVOLTAGE: i32 = 59;
pub const ELEMENT_FREQUENCY: i32 = 81;
pub const ELEMENT_DIFFERENTIAL: i32 = 87;
pub const ELEMENT_DISTANCE: i32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionFunction {
    Overcurrent,
    Undervoltage,
    Overvoltage,
    Frequency,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionDecision {
    pub function: ProtectionFunction,
    pub fault_type: FaultKind,
    pub protection_element: i32,
}

impl ProtectionDecision {
    /// Force a trip carrying this decision's fault information.
    pub fn apply_to(self, snapshot: Snapshot) -> Snapshot {
        Snapshot {
            trip: true,
            fault_type: self.fault_type,
            protection_element: self.protection_element,
            ..snapshot
        }
    }
}

/// Evaluate all protection functions against a snapshot. `None` means
/// nothing picked up and the operator's own trip flag stands.
pub fn evaluate(snapshot: &Snapshot) -> Option<ProtectionDecision> {
    let mut decision = None;
    // Element reported for a manual overcurrent fault
    let mut element = ELEMENT_OVERCURRENT;

    if snapshot.current > OVERCURRENT_PICKUP_A {
        decision = Some(ProtectionDecision {
            function: ProtectionFunction::Overcurrent,
            fault_type: FaultKind::Overcurrent,
            protection_element: ELEMENT_OVERCURRENT,
        });
    }

    let undervoltage = snapshot.voltage < UNDERVOLTAGE_PICKUP_V;
    let overvoltage = snapshot.voltage > OVERVOLTAGE_PICKUP_V;
    if undervoltage || overvoltage {
        let (function, protection_element) = if undervoltage {
            (ProtectionFunction::Undervoltage, ELEMENT_UNDERVOLTAGE)
        } else {
            (ProtectionFunction::Overvoltage, ELEMENT_OVERVOLTAGE)
        };
        decision = Some(ProtectionDecision {
            function,
            fault_type: FaultKind::Differential,
            protection_element,
        });
    }

    let underfrequency = snapshot.frequency < UNDERFREQUENCY_PICKUP_HZ;
    let overfrequency = snapshot.frequency > OVERFREQUENCY_PICKUP_HZ;
    if underfrequency || overfrequency {
        decision = Some(ProtectionDecision {
            function: ProtectionFunction::Frequency,
            fault_type: FaultKind::Distance,
            protection_element: ELEMENT_FREQUENCY,
        });
    }

    if let Some(d) = decision {
        element = d.protection_element;
    }

    if snapshot.fault_type.is_fault() {
        let protection_element = match snapshot.fault_type {
            FaultKind::Differential => ELEMENT_DIFFERENTIAL,
            FaultKind::Distance => ELEMENT_DISTANCE,
            _ => element,
        };
        decision = Some(ProtectionDecision {
            function: ProtectionFunction::Manual,
            fault_type: snapshot.fault_type,
            protection_element,
        });
    }

    decision
}

/// Snapshot as it leaves the relay after protection functions have run.
pub fn protect(snapshot: Snapshot) -> Snapshot {
    match evaluate(&snapshot) {
        Some(decision) => decision.apply_to(snapshot),
        None => snapshot,
    }
}
