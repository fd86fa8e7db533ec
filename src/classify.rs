//! Measurement classification into normal / abnormal / fault bands.
//!
//! Every real value maps to exactly one band per quantity. Non-finite input
//! (`NaN`, ±∞) always classifies as [`Band::Fault`].

use serde::{Deserialize, Serialize};

// Current thresholds (A)
pub const CURRENT_ABNORMAL_A: f64 = 2000.0;
pub const CURRENT_FAULT_A: f64 = 3500.0;

// Voltage thresholds (V)
pub const VOLTAGE_NORMAL_LOW_V: f64 = 10000.0;
pub const VOLTAGE_NORMAL_HIGH_V: f64 = 12000.0;
pub const VOLTAGE_ABNORMAL_LOW_V: f64 = 8000.0;
pub const VOLTAGE_ABNORMAL_HIGH_V: f64 = 14000.0;

// Frequency thresholds (Hz)
pub const FREQUENCY_NORMAL_LOW_HZ: f64 = 49.5;
pub const FREQUENCY_NORMAL_HIGH_HZ: f64 = 50.5;
pub const FREQUENCY_ABNORMAL_LOW_HZ: f64 = 49.0;
pub const FREQUENCY_ABNORMAL_HIGH_HZ: f64 = 51.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    Normal,
    Abnormal,
    Fault,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::Normal => "Normal",
            Band::Abnormal => "Abnormal",
            Band::Fault => "Fault",
        }
    }

    /// Indicator colour used by the relay panel.
    pub fn colour(self) -> &'static str {
        match self {
            Band::Normal => "green",
            Band::Abnormal => "yellow",
            Band::Fault => "red",
        }
    }
}

impl core::fmt::Display for Band {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Current,
    Voltage,
    Frequency,
}

impl Quantity {
    pub fn unit(self) -> &'static str {
        match self {
            Quantity::Current => "A",
            Quantity::Voltage => "V",
            Quantity::Frequency => "Hz",
        }
    }
}

pub fn classify(quantity: Quantity, value: f64) -> Band {
    if !value.is_finite() {
        return Band::Fault;
    }

    match quantity {
        Quantity::Current => classify_current(value),
        Quantity::Voltage => classify_voltage(value),
        Quantity::Frequency => classify_frequency(value),
    }
}

fn classify_current(amps: f64) -> Band {
    if amps < CURRENT_ABNORMAL_A {
        Band::Normal
    } else if amps < CURRENT_FAULT_A {
        Band::Abnormal
    } else {
        Band::Fault
    }
}

fn classify_voltage(volts: f64) -> Band {
    classify_window(
        volts,
        (VOLTAGE_NORMAL_LOW_V, VOLTAGE_NORMAL_HIGH_V),
        (VOLTAGE_ABNORMAL_LOW_V, VOLTAGE_ABNORMAL_HIGH_V),
    )
}

fn classify_frequency(hertz: f64) -> Band {
    classify_window(
        hertz,
        (FREQUENCY_NORMAL_LOW_HZ, FREQUENCY_NORMAL_HIGH_HZ),
        (FREQUENCY_ABNORMAL_LOW_HZ, FREQUENCY_ABNORMAL_HIGH_HZ),
    )
}

// Normal window closed on both ends, abnormal shoulders closed on the outer end.
fn classify_window(value: f64, normal: (f64, f64), abnormal: (f64, f64)) -> Band {
    if (normal.0..=normal.1).contains(&value) {
        Band::Normal
    } else if (abnormal.0..=abnormal.1).contains(&value) {
        Band::Abnormal
    } else {
        Band::Fault
    }
}

/// Bands for the three measurements of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementBands {
    pub current: Band,
    pub voltage: Band,
    pub frequency: Band,
}

impl MeasurementBands {
    pub fn of(current: f64, voltage: f64, frequency: f64) -> Self {
        Self {
            current: classify(Quantity::Current, current),
            voltage: classify(Quantity::Voltage, voltage),
            frequency: classify(Quantity::Frequency, frequency),
        }
    }

    pub fn worst(self) -> Band {
        self.current.max(self.voltage).max(self.frequency)
    }

    pub fn get(self, quantity: Quantity) -> Band {
        match quantity {
            Quantity::Current => self.current,
            Quantity::Voltage => self.voltage,
            Quantity::Frequency => self.frequency,
        }
    }
}

impl Default for MeasurementBands {
    fn default() -> Self {
        Self {
            current: Band::Normal,
            voltage: Band::Normal,
            frequency: Band::Normal,
        }
    }
}
