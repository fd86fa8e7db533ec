use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BreakerState {
    #[default]
    Open,
    Closed,
}

impl BreakerState {
    pub fn label(self) -> &'static str {
        match self {
            BreakerState::Open => "OPEN",
            BreakerState::Closed => "CLOSED",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, BreakerState::Closed)
    }
}

impl core::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Next breaker position for a `(trip, close)` pair.
///
/// Trip dominates close, and with neither asserted the breaker holds.
pub fn next_state(current: BreakerState, trip: bool, close: bool) -> BreakerState {
    if trip {
        BreakerState::Open
    } else if close {
        BreakerState::Closed
    } else {
        current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: BreakerState,
    pub to: BreakerState,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BreakerStats {
    pub inputs_applied: u32,
    pub trip_operations: u32,
    pub close_operations: u32,
}

#[derive(Debug, Clone, Default)]
pub struct BreakerStateMachine {
    state: BreakerState,
    stats: BreakerStats,
}

impl BreakerStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: BreakerState) -> Self {
        Self {
            state,
            stats: BreakerStats::default(),
        }
    }

    /// Apply one decoded `(trip, close)` pair. Returns the transition if the
    /// position changed.
    pub fn apply(&mut self, trip: bool, close: bool) -> Option<Transition> {
        self.stats.inputs_applied = self.stats.inputs_applied.saturating_add(1);

        let from = self.state;
        let to = next_state(from, trip, close);
        if from == to {
            return None;
        }

        self.state = to;
        match to {
            BreakerState::Open => {
                self.stats.trip_operations = self.stats.trip_operations.saturating_add(1);
            }
            BreakerState::Closed => {
                self.stats.close_operations = self.stats.close_operations.saturating_add(1);
            }
        }

        Some(Transition { from, to })
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn get_stats(&self) -> &BreakerStats {
        &self.stats
    }
}
