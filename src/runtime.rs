//! Timed loops for the relay and breaker sides.
//!
//! Each loop runs on its own interval and owns its state outright. They share
//! nothing but the exchange channel, and both hand their state back when the
//! shutdown signal fires.

use crate::channel::ExchangeChannel;
use crate::command::OperatorCommand;
use crate::publisher::Publisher;
use crate::subscriber::{PollOutcome, Subscriber};
use crate::view::BreakerView;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const OPERATOR_COMMAND_BUFFER_SIZE: usize = 32;

pub async fn run_publisher<C: ExchangeChannel>(
    mut publisher: Publisher<C>,
    period: Duration,
    mut commands: mpsc::Receiver<OperatorCommand>,
    mut shutdown: watch::Receiver<bool>,
) -> Publisher<C> {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    info!("Publishing to {} every {:?}", publisher.channel().describe(), period);

    loop {
        let stopping = *shutdown.borrow();
        if stopping {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                let report = publisher.tick();
                if report.state_changed {
                    debug!("Published {:?}", report.snapshot);
                }
            }
            command = commands.recv(), if commands_open => match command {
                Some(command) => {
                    if let Err(e) = publisher.execute_command(command) {
                        warn!("Rejected operator command: {}", e);
                    }
                }
                None => commands_open = false,
            },
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(
        "Publisher stopped after {} ticks ({} write failures)",
        publisher.get_stats().ticks,
        publisher.get_stats().write_failures
    );
    publisher
}

pub async fn run_subscriber<C: ExchangeChannel>(
    mut subscriber: Subscriber<C>,
    period: Duration,
    views: watch::Sender<BreakerView>,
    mut shutdown: watch::Receiver<bool>,
) -> Subscriber<C> {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Monitoring {} every {:?}", subscriber.channel().describe(), period);

    loop {
        let stopping = *shutdown.borrow();
        if stopping {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                if let PollOutcome::Updated { .. } = subscriber.poll() {
                    let view = subscriber.view();
                    views.send_if_modified(|current| {
                        if *current == view {
                            false
                        } else {
                            *current = view;
                            true
                        }
                    });
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(
        "Subscriber stopped after {} polls ({} updates)",
        subscriber.get_stats().polls,
        subscriber.get_stats().updates
    );
    // Watchers see the view stream end
    drop(views);
    subscriber
}

/// Resolves on SIGINT, or SIGTERM where supported.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
                    _ = terminate.recv() => info!("SIGTERM received, shutting down"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("SIGINT received, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down");
    }
}
