use crate::breaker::{BreakerState, BreakerStateMachine, BreakerStats, Transition};
use crate::channel::ExchangeChannel;
use crate::classify::MeasurementBands;
use crate::protocol::{ProtocolError, SnapshotCodec};
use crate::snapshot::Snapshot;
use crate::view::BreakerView;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Nothing published yet.
    Absent,
    /// Record was structurally invalid and dropped.
    Discarded(ProtocolError),
    ReadFailed,
    Updated {
        breaker: BreakerState,
        transition: Option<Transition>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberStats {
    pub polls: u64,
    pub updates: u64,
    pub absent_polls: u64,
    pub discarded_records: u64,
    pub read_failures: u64,
    pub last_error: Option<String>,
}

/// Breaker controller side of the exchange.
///
/// Derived state (breaker position, last snapshot, observation time) only
/// moves on a successful decode. Absence, read errors and short records all
/// leave it untouched.
pub struct Subscriber<C: ExchangeChannel> {
    channel: C,
    codec: SnapshotCodec,
    breaker: BreakerStateMachine,
    last: Option<Snapshot>,
    observed_at: Option<DateTime<Local>>,
    stats: SubscriberStats,
}

impl<C: ExchangeChannel> Subscriber<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            codec: SnapshotCodec::new(),
            breaker: BreakerStateMachine::new(),
            last: None,
            observed_at: None,
            stats: SubscriberStats::default(),
        }
    }

    pub fn poll(&mut self) -> PollOutcome {
        self.poll_at(Local::now())
    }

    pub fn poll_at(&mut self, now: DateTime<Local>) -> PollOutcome {
        self.stats.polls = self.stats.polls.saturating_add(1);

        let record = match self.channel.read_latest() {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.stats.absent_polls = self.stats.absent_polls.saturating_add(1);
                return PollOutcome::Absent;
            }
            Err(e) => {
                self.stats.read_failures = self.stats.read_failures.saturating_add(1);
                warn!("Failed to read {}: {}", self.channel.describe(), e);
                self.stats.last_error = Some(e.to_string());
                return PollOutcome::ReadFailed;
            }
        };

        let snapshot = match self.codec.decode(&record) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.discarded_records = self.stats.discarded_records.saturating_add(1);
                debug!("Discarding record: {}", e);
                self.stats.last_error = Some(e.to_string());
                return PollOutcome::Discarded(e);
            }
        };

        let transition = self.breaker.apply(snapshot.trip, snapshot.close);
        if let Some(t) = transition {
            info!("Breaker {} -> {} (fault: {}, element: {})", t.from, t.to, snapshot.fault_type, snapshot.protection_element);
        }

        self.last = Some(snapshot);
        self.observed_at = Some(now);
        self.stats.updates = self.stats.updates.saturating_add(1);

        PollOutcome::Updated {
            breaker: self.breaker.state(),
            transition,
        }
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Last decoded snapshot, or the defaults if nothing was ever decoded.
    pub fn last_snapshot(&self) -> Snapshot {
        self.last.unwrap_or_default()
    }

    pub fn observed_at(&self) -> Option<DateTime<Local>> {
        self.observed_at
    }

    pub fn has_updated(&self) -> bool {
        self.last.is_some()
    }

    pub fn bands(&self) -> Option<MeasurementBands> {
        self.last.as_ref().map(Snapshot::bands)
    }

    pub fn view(&self) -> BreakerView {
        match (self.last.as_ref(), self.observed_at) {
            (Some(snapshot), Some(at)) => BreakerView::from_snapshot(snapshot, self.breaker.state(), at),
            _ => BreakerView::never_updated(self.breaker.state()),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn get_stats(&self) -> &SubscriberStats {
        &self.stats
    }

    pub fn get_breaker_stats(&self) -> &BreakerStats {
        self.breaker.get_stats()
    }
}
