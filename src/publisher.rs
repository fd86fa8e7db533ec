use crate::channel::{ChannelError, ExchangeChannel};
use crate::classify::MeasurementBands;
use crate::command::{validate_command, CommandError, OperatorCommand};
use crate::protection;
use crate::protocol::{ProtocolError, SnapshotCodec};
use crate::snapshot::{FaultKind, Snapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// Relay panel start-up values
const DEFAULT_PROTECTION_ELEMENT: i32 = 50;
const DEFAULT_CURRENT_A: f64 = 1250.5;
const DEFAULT_VOLTAGE_V: f64 = 10500.0;
const DEFAULT_FREQUENCY_HZ: f64 = 49.8;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("encode failed: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("write failed: {0}")]
    Channel(#[from] ChannelError),
}

/// Operator-controlled relay state, owned by the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionIntent {
    pub trip: bool,
    pub close: bool,
    pub fault_type: FaultKind,
    pub protection_element: i32,
    pub current: f64,
    pub voltage: f64,
    pub frequency: f64,
}

impl Default for ProtectionIntent {
    fn default() -> Self {
        Self {
            trip: false,
            close: false,
            fault_type: FaultKind::None,
            protection_element: DEFAULT_PROTECTION_ELEMENT,
            current: DEFAULT_CURRENT_A,
            voltage: DEFAULT_VOLTAGE_V,
            frequency: DEFAULT_FREQUENCY_HZ,
        }
    }
}

impl ProtectionIntent {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            trip: self.trip,
            close: self.close,
            fault_type: self.fault_type,
            protection_element: self.protection_element,
            current: self.current,
            voltage: self.voltage,
            frequency: self.frequency,
        }
    }

    pub fn bands(&self) -> MeasurementBands {
        MeasurementBands::of(self.current, self.voltage, self.frequency)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherStats {
    pub ticks: u64,
    pub records_written: u64,
    pub write_failures: u64,
    /// Bumped whenever the published snapshot differs from the previous one.
    pub st_num: u32,
    /// Re-publications since the last state change.
    pub sq_num: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishReport {
    pub snapshot: Snapshot,
    pub bands: MeasurementBands,
    pub written: bool,
    pub state_changed: bool,
}

pub struct Publisher<C: ExchangeChannel> {
    channel: C,
    codec: SnapshotCodec,
    intent: ProtectionIntent,
    protection_logic: bool,
    last_published: Option<Snapshot>,
    bands: MeasurementBands,
    stats: PublisherStats,
}

impl<C: ExchangeChannel> Publisher<C> {
    pub fn new(channel: C) -> Self {
        Self::with_intent(channel, ProtectionIntent::default())
    }

    pub fn with_intent(channel: C, intent: ProtectionIntent) -> Self {
        Self {
            channel,
            codec: SnapshotCodec::new(),
            bands: intent.bands(),
            intent,
            protection_logic: false,
            last_published: None,
            stats: PublisherStats::default(),
        }
    }

    pub fn set_protection_logic(&mut self, enabled: bool) {
        if self.protection_logic != enabled {
            info!("Protection logic {}", if enabled { "enabled" } else { "disabled" });
        }
        self.protection_logic = enabled;
    }

    pub fn protection_logic(&self) -> bool {
        self.protection_logic
    }

    /// Snapshot for the current intent, after protection functions when enabled.
    pub fn build_snapshot(&self) -> Snapshot {
        let snapshot = self.intent.to_snapshot();
        if self.protection_logic {
            protection::protect(snapshot)
        } else {
            snapshot
        }
    }

    /// One publisher cycle. Never fails: write errors are logged and the next
    /// tick tries again.
    pub fn tick(&mut self) -> PublishReport {
        self.stats.ticks = self.stats.ticks.saturating_add(1);

        let snapshot = self.build_snapshot();
        let state_changed = self.advance_sequence(&snapshot);

        let written = match self.write_snapshot(&snapshot) {
            Ok(()) => {
                self.stats.records_written = self.stats.records_written.saturating_add(1);
                true
            }
            Err(e) => {
                self.stats.write_failures = self.stats.write_failures.saturating_add(1);
                warn!("Failed to publish snapshot to {}: {}", self.channel.describe(), e);
                self.stats.last_error = Some(e.to_string());
                false
            }
        };

        // Display only, does not feed back into the record
        self.bands = self.intent.bands();

        PublishReport {
            snapshot,
            bands: self.bands,
            written,
            state_changed,
        }
    }

    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), PublishError> {
        let record = self.codec.encode(snapshot)?;
        self.channel.write_atomic(record.as_bytes())?;
        Ok(())
    }

    fn advance_sequence(&mut self, snapshot: &Snapshot) -> bool {
        let changed = self.last_published != Some(*snapshot);

        if changed {
            self.stats.st_num = self.stats.st_num.wrapping_add(1);
            self.stats.sq_num = 0;
            debug!(
                "State change stNum={} trip={} close={} fault={}",
                self.stats.st_num, snapshot.trip, snapshot.close, snapshot.fault_type
            );
        } else {
            self.stats.sq_num = self.stats.sq_num.wrapping_add(1);
        }

        self.last_published = Some(*snapshot);
        changed
    }

    pub fn execute_command(&mut self, command: OperatorCommand) -> Result<(), CommandError> {
        validate_command(&command)?;
        debug!("Operator command: {:?}", command);

        match command {
            OperatorCommand::SetTrip { active } => self.intent.trip = active,
            OperatorCommand::SetClose { active } => self.intent.close = active,
            OperatorCommand::SetFaultType { code } => {
                self.intent.fault_type = FaultKind::from_code(i64::from(code));
            }
            OperatorCommand::SetProtectionElement { element } => {
                self.intent.protection_element = element;
            }
            OperatorCommand::SetCurrent { amps } => self.intent.current = amps,
            OperatorCommand::SetVoltage { volts } => self.intent.voltage = volts,
            OperatorCommand::SetFrequency { hertz } => self.intent.frequency = hertz,
            OperatorCommand::SetProtectionLogic { enabled } => self.set_protection_logic(enabled),
            OperatorCommand::Reset => self.intent = ProtectionIntent::default(),
        }

        self.bands = self.intent.bands();
        Ok(())
    }

    pub fn intent(&self) -> &ProtectionIntent {
        &self.intent
    }

    pub fn intent_mut(&mut self) -> &mut ProtectionIntent {
        &mut self.intent
    }

    pub fn bands(&self) -> MeasurementBands {
        self.bands
    }

    pub fn last_published(&self) -> Option<&Snapshot> {
        self.last_published.as_ref()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn get_stats(&self) -> &PublisherStats {
        &self.stats
    }
}
