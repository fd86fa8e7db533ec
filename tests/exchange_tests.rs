use goosebus::*;
use goosebus::command::{parse_command, CommandError, OperatorCommand};
use goosebus::protection::*;
use goosebus::protocol::ProtocolError;
use goosebus::view::NEVER_UPDATED;
use chrono::{Local, TimeZone};

fn linked() -> (Publisher<MemoryChannel>, Subscriber<MemoryChannel>, MemoryChannel) {
    let channel = MemoryChannel::new();
    (
        Publisher::new(channel.clone()),
        Subscriber::new(channel.clone()),
        channel,
    )
}

#[test]
fn test_subscriber_on_empty_channel() {
    let (_, mut subscriber, _) = linked();

    assert_eq!(subscriber.poll(), PollOutcome::Absent);
    assert_eq!(subscriber.breaker_state(), BreakerState::Open);
    assert!(!subscriber.has_updated());
    assert!(subscriber.observed_at().is_none());
    assert_eq!(subscriber.view().last_update, NEVER_UPDATED);
    assert_eq!(subscriber.last_snapshot(), Snapshot::default());
    assert_eq!(subscriber.get_stats().absent_polls, 1);
}

#[test]
fn test_subscriber_on_missing_file() {
    let path = std::env::temp_dir().join(format!("goosebus-never-written-{}.txt", std::process::id()));
    let mut subscriber = Subscriber::new(FileChannel::new(&path));

    for _ in 0..3 {
        assert_eq!(subscriber.poll(), PollOutcome::Absent);
    }
    assert_eq!(subscriber.breaker_state(), BreakerState::Open);
    assert_eq!(subscriber.view().last_update, "Never");
}

#[test]
fn test_close_then_trip_flow() {
    let (mut publisher, mut subscriber, _) = linked();

    publisher.intent_mut().close = true;
    assert!(publisher.tick().written);
    let outcome = subscriber.poll();
    assert!(matches!(outcome, PollOutcome::Updated { breaker: BreakerState::Closed, transition: Some(_) }));

    // Operator releases close, breaker holds
    publisher.intent_mut().close = false;
    publisher.tick();
    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);

    // Simultaneous trip and close opens
    publisher.intent_mut().trip = true;
    publisher.intent_mut().close = true;
    publisher.tick();
    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Open);
    assert!(subscriber.last_snapshot().trip);
}

#[test]
fn test_structural_failure_keeps_prior_state() {
    let (mut publisher, mut subscriber, channel) = linked();
    let first_seen = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap();

    publisher.intent_mut().close = true;
    publisher.intent_mut().current = 2100.0;
    publisher.tick();
    subscriber.poll_at(first_seen);
    let before = subscriber.last_snapshot();

    channel.write_atomic(b"1,0,2\n").unwrap();
    let outcome = subscriber.poll();

    assert!(matches!(outcome, PollOutcome::Discarded(ProtocolError::MissingFields { found: 3, .. })));
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);
    assert_eq!(subscriber.last_snapshot(), before);
    assert_eq!(subscriber.observed_at(), Some(first_seen));
    assert_eq!(subscriber.view().last_update, "12:30:15");
    assert_eq!(subscriber.get_stats().discarded_records, 1);
}

#[test]
fn test_degraded_fields_still_drive_breaker() {
    let (_, mut subscriber, channel) = linked();

    channel.write_atomic(b"1,0,9,50,abc,10500,49.8\n").unwrap();
    assert!(matches!(subscriber.poll(), PollOutcome::Updated { .. }));

    let snapshot = subscriber.last_snapshot();
    assert_eq!(snapshot.fault_type, FaultKind::Unknown);
    assert_eq!(snapshot.current, 0.0);

    let view = subscriber.view();
    assert_eq!(view.trip_status, "ACTIVE");
    assert_eq!(view.fault_type, "Unknown");
    assert_eq!(view.current, "0.0 A");
    assert_eq!(view.voltage, "10500 V");
    assert_eq!(view.frequency, "49.8 Hz");
    assert_eq!(view.breaker, BreakerState::Open);
}

#[test]
fn test_never_updated_view_defaults() {
    let view = BreakerView::never_updated(BreakerState::Open);
    assert_eq!(view.trip_status, "INACTIVE");
    assert_eq!(view.close_status, "INACTIVE");
    assert_eq!(view.fault_type, "Unknown");
    assert_eq!(view.protection_element, "--");
    assert_eq!(view.current, "0.0 A");
    assert_eq!(view.voltage, "0 V");
    assert_eq!(view.frequency, "0.0 Hz");
    assert_eq!(view.last_update, "Never");
    assert!(view.bands.is_none());
}

#[test]
fn test_view_after_update() {
    let (mut publisher, mut subscriber, _) = linked();
    let at = Local.with_ymd_and_hms(2024, 5, 1, 8, 5, 9).unwrap();

    publisher.intent_mut().fault_type = FaultKind::Differential;
    publisher.intent_mut().protection_element = 87;
    publisher.intent_mut().voltage = 13000.0;
    publisher.tick();
    subscriber.poll_at(at);

    let view = subscriber.view();
    assert_eq!(view.fault_type, "Differential");
    assert_eq!(view.protection_element, "87");
    assert_eq!(view.current, "1250.5 A");
    assert_eq!(view.voltage, "13000 V");
    assert_eq!(view.last_update, "08:05:09");
    let bands = view.bands.unwrap();
    assert_eq!(bands.voltage, Band::Abnormal);
    assert_eq!(bands.current, Band::Normal);
}

#[test]
fn test_publisher_defaults_match_relay_panel() {
    let (publisher, _, _) = linked();
    let snapshot = publisher.build_snapshot();

    assert!(!snapshot.trip);
    assert!(!snapshot.close);
    assert_eq!(snapshot.fault_type, FaultKind::None);
    assert_eq!(snapshot.protection_element, 50);
    assert_eq!(snapshot.current, 1250.5);
    assert_eq!(snapshot.voltage, 10500.0);
    assert_eq!(snapshot.frequency, 49.8);
    assert_eq!(publisher.bands().worst(), Band::Normal);
}

#[test]
fn test_sequence_numbers() {
    let (mut publisher, _, _) = linked();

    assert!(publisher.tick().state_changed);
    assert_eq!(publisher.get_stats().st_num, 1);
    assert_eq!(publisher.get_stats().sq_num, 0);

    publisher.tick();
    publisher.tick();
    assert_eq!(publisher.get_stats().st_num, 1);
    assert_eq!(publisher.get_stats().sq_num, 2);

    publisher.intent_mut().trip = true;
    assert!(publisher.tick().state_changed);
    assert_eq!(publisher.get_stats().st_num, 2);
    assert_eq!(publisher.get_stats().sq_num, 0);
    assert_eq!(publisher.get_stats().ticks, 4);
}

#[test]
fn test_write_failure_is_not_fatal() {
    let path = std::env::temp_dir()
        .join(format!("goosebus-no-such-dir-{}", std::process::id()))
        .join("goose_data.txt");
    let mut publisher = Publisher::new(FileChannel::new(&path));

    for _ in 0..3 {
        let report = publisher.tick();
        assert!(!report.written);
    }

    let stats = publisher.get_stats();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.write_failures, 3);
    assert_eq!(stats.records_written, 0);
    assert!(stats.last_error.is_some());
}

#[test]
fn test_file_backed_exchange() {
    let path = std::env::temp_dir().join(format!("goosebus-exchange-{}.txt", std::process::id()));
    let channel = FileChannel::new(&path);
    let mut publisher = Publisher::new(channel.clone());
    let mut subscriber = Subscriber::new(channel.clone());

    publisher.intent_mut().close = true;
    publisher.tick();
    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);
    assert_eq!(subscriber.last_snapshot(), publisher.build_snapshot());

    channel.release().unwrap();
    assert_eq!(subscriber.poll(), PollOutcome::Absent);
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);
}

#[test]
fn test_operator_commands() {
    let (mut publisher, mut subscriber, _) = linked();

    let command = parse_command(r#"{"SetClose":{"active":true}}"#).unwrap();
    publisher.execute_command(command).unwrap();
    publisher.execute_command(OperatorCommand::SetCurrent { amps: 2600.0 }).unwrap();
    publisher.execute_command(OperatorCommand::SetFaultType { code: 1 }).unwrap();
    assert_eq!(publisher.bands().current, Band::Abnormal);

    publisher.tick();
    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);
    assert_eq!(subscriber.last_snapshot().fault_type, FaultKind::Overcurrent);

    publisher.execute_command(parse_command(r#""Reset""#).unwrap()).unwrap();
    assert_eq!(*publisher.intent(), ProtectionIntent::default());
}

#[test]
fn test_invalid_operator_commands() {
    assert!(matches!(parse_command("{not json"), Err(CommandError::InvalidJson(_))));
    assert!(matches!(
        parse_command(r#"{"SetFaultType":{"code":7}}"#),
        Err(CommandError::InvalidParameter(_))
    ));

    let (mut publisher, _, _) = linked();
    let result = publisher.execute_command(OperatorCommand::SetFaultType { code: 4 });
    assert!(result.is_err());
    assert_eq!(publisher.intent().fault_type, FaultKind::None);
}

#[test]
fn test_protection_logic_overcurrent_trip() {
    let (mut publisher, mut subscriber, _) = linked();
    publisher.intent_mut().close = true;
    publisher.tick();
    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Closed);

    publisher.execute_command(OperatorCommand::SetProtectionLogic { enabled: true }).unwrap();
    publisher.intent_mut().current = 3600.0;
    let report = publisher.tick();

    assert!(report.snapshot.trip);
    assert_eq!(report.snapshot.fault_type, FaultKind::Overcurrent);
    assert_eq!(report.snapshot.protection_element, ELEMENT_OVERCURRENT);
    // Intent itself is untouched
    assert!(!publisher.intent().trip);

    subscriber.poll();
    assert_eq!(subscriber.breaker_state(), BreakerState::Open);
}

#[test]
fn test_protection_logic_disabled_by_default() {
    let (mut publisher, _, _) = linked();
    publisher.intent_mut().current = 5000.0;
    assert!(!publisher.protection_logic());
    assert!(!publisher.tick().snapshot.trip);
}

#[test]
fn test_protection_function_precedence() {
    let base = Snapshot {
        protection_element: 50,
        current: 1250.5,
        voltage: 10500.0,
        frequency: 49.8,
        ..Snapshot::default()
    };

    let under = evaluate(&Snapshot { voltage: 7000.0, ..base }).unwrap();
    assert_eq!(under.function, ProtectionFunction::Undervoltage);
    assert_eq!(under.fault_type, FaultKind::Differential);
    assert_eq!(under.protection_element, ELEMENT_UNDERVOLTAGE);

    let over = evaluate(&Snapshot { voltage: 15000.0, ..base }).unwrap();
    assert_eq!(over.protection_element, ELEMENT_OVERVOLTAGE);

    // Frequency overrides voltage and current
    let freq = evaluate(&Snapshot { current: 4000.0, voltage: 7000.0, frequency: 52.0, ..base }).unwrap();
    assert_eq!(freq.function, ProtectionFunction::Frequency);
    assert_eq!(freq.fault_type, FaultKind::Distance);
    assert_eq!(freq.protection_element, ELEMENT_FREQUENCY);

    // Manual fault overrides everything
    let manual = evaluate(&Snapshot { fault_type: FaultKind::Distance, frequency: 52.0, ..base }).unwrap();
    assert_eq!(manual.function, ProtectionFunction::Manual);
    assert_eq!(manual.protection_element, ELEMENT_DISTANCE);

    let differential = evaluate(&Snapshot { fault_type: FaultKind::Differential, ..base }).unwrap();
    assert_eq!(differential.protection_element, ELEMENT_DIFFERENTIAL);

    // Manual overcurrent reports the element of whichever function picked up
    let manual_oc = evaluate(&Snapshot { fault_type: FaultKind::Overcurrent, voltage: 15000.0, ..base }).unwrap();
    assert_eq!(manual_oc.fault_type, FaultKind::Overcurrent);
    assert_eq!(manual_oc.protection_element, ELEMENT_OVERVOLTAGE);

    let tripped = protect(Snapshot { current: 3600.0, ..base });
    assert!(tripped.trip);
    assert_eq!(tripped.current, 3600.0);
}
