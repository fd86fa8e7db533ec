//! # Protection / Breaker Signaling Core
//!
//! Models the exchange between a protection relay (publisher of trip/close
//! intent and measurements) and a breaker controller (subscriber that reacts
//! to that intent and reports breaker position), in the spirit of an
//! IEC 61850 GOOSE link.
//!
//! ## Features
//!
//! - **Snapshot model**: one immutable record of protection intent and measurements
//! - **Classification**: normal / abnormal / fault bands for current, voltage and frequency
//! - **Breaker state machine**: trip-dominant OPEN/CLOSED transitions
//! - **Exchange channel**: last-value-wins transport with atomic replace (memory or file)
//! - **Protection logic**: optional relay-side overcurrent, voltage and frequency pickup
//! - **Independent loops**: publisher and subscriber ticks never rendezvous
//!
//! ## Quick Start
//!
//! ```rust
//! use goosebus::{MemoryChannel, Publisher, Subscriber, BreakerState};
//!
//! let channel = MemoryChannel::new();
//! let mut publisher = Publisher::new(channel.clone());
//! let mut subscriber = Subscriber::new(channel);
//!
//! publisher.intent_mut().close = true;
//! publisher.tick();
//! subscriber.poll();
//!
//! assert_eq!(subscriber.breaker_state(), BreakerState::Closed);
//! ```
//!
//! ## Architecture
//!
//! - [`snapshot`] - Snapshot and fault type model
//! - [`classify`] - Measurement band classification
//! - [`breaker`] - Breaker state machine
//! - [`protocol`] - 7-field record codec
//! - [`channel`] - Exchange channel trait and backings
//! - [`protection`] - Relay-side protection functions
//! - [`publisher`] / [`subscriber`] - Per-tick relay and breaker logic
//! - [`runtime`] - Timed loops and shutdown handling

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

pub mod breaker;
pub mod channel;
pub mod classify;
pub mod command;
pub mod config;
pub mod protection;
pub mod protocol;
pub mod publisher;
pub mod runtime;
pub mod snapshot;
pub mod subscriber;
pub mod view;

// Re-export main public types for convenience
pub use breaker::{BreakerState, BreakerStateMachine};
pub use channel::{ChannelGuard, ExchangeChannel, FileChannel, MemoryChannel};
pub use classify::{classify, Band, MeasurementBands, Quantity};
pub use config::LinkConfig;
pub use publisher::{ProtectionIntent, Publisher};
pub use snapshot::{FaultKind, Snapshot};
pub use subscriber::{PollOutcome, Subscriber};
pub use view::BreakerView;
