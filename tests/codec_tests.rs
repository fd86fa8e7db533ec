use goosebus::*;
use goosebus::protocol::*;

fn relay_defaults() -> Snapshot {
    Snapshot {
        trip: false,
        close: false,
        fault_type: FaultKind::None,
        protection_element: 50,
        current: 1250.5,
        voltage: 10500.0,
        frequency: 49.8,
    }
}

#[test]
fn test_encode_field_order() {
    let snapshot = Snapshot {
        trip: true,
        close: false,
        fault_type: FaultKind::Differential,
        protection_element: 87,
        current: 3600.0,
        voltage: 10500.0,
        frequency: 49.8,
    };

    let record = encode(&snapshot).unwrap();
    assert_eq!(record.as_str(), "1,0,2,87,3600.0,10500.0,49.8\n");
}

#[test]
fn test_record_is_newline_terminated() {
    let record = encode(&relay_defaults()).unwrap();
    assert!(record.ends_with(RECORD_TERMINATOR));
    assert_eq!(record.trim_end().split(FIELD_SEPARATOR).count(), FIELD_COUNT);
}

#[test]
fn test_round_trip() {
    let snapshots = [
        relay_defaults(),
        Snapshot {
            trip: true,
            close: true,
            fault_type: FaultKind::Distance,
            protection_element: 21,
            current: 0.1,
            voltage: 14000.000001,
            frequency: 51.05,
        },
        Snapshot {
            fault_type: FaultKind::Unknown,
            protection_element: -7,
            current: 1e300,
            voltage: -2.5e-12,
            frequency: f64::MAX,
            ..relay_defaults()
        },
    ];

    for snapshot in snapshots {
        let record = encode(&snapshot).unwrap();
        assert_eq!(decode(&record).unwrap(), snapshot, "record {:?}", record);
    }
}

#[test]
fn test_encode_decode_encode_is_stable() {
    let decoded = decode("1,1,3,21,4000.25,7000,48.5").unwrap();
    let first = encode(&decoded).unwrap();
    let second = encode(&decode(&first).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_graceful_field_degradation() {
    let snapshot = decode("1,0,9,50,abc,10500,49.8").unwrap();

    assert!(snapshot.trip);
    assert!(!snapshot.close);
    assert_eq!(snapshot.fault_type, FaultKind::Unknown);
    assert_eq!(snapshot.protection_element, 50);
    assert_eq!(snapshot.current, 0.0);
    assert_eq!(snapshot.voltage, 10500.0);
    assert_eq!(snapshot.frequency, 49.8);
}

#[test]
fn test_short_record_is_rejected() {
    let result = decode("1,0,2");
    assert_eq!(
        result,
        Err(ProtocolError::MissingFields {
            found: 3,
            expected: FIELD_COUNT,
        })
    );

    assert!(matches!(decode(""), Err(ProtocolError::MissingFields { found: 0, .. })));
    assert!(matches!(decode("\n"), Err(ProtocolError::MissingFields { .. })));
}

#[test]
fn test_extra_fields_are_ignored() {
    let snapshot = decode("0,1,0,50,1250.5,10500.0,49.8,17,extra\n").unwrap();
    assert!(snapshot.close);
    assert_eq!(snapshot.frequency, 49.8);
}

#[test]
fn test_subscriber_side_formatting_is_accepted() {
    // Fixed-precision writer output and surrounding whitespace
    let snapshot = decode(" 0,1,1,50,1250.5,10500,49.8 \r\n").unwrap();
    assert!(snapshot.close);
    assert_eq!(snapshot.fault_type, FaultKind::Overcurrent);
    assert_eq!(snapshot.voltage, 10500.0);
}

#[test]
fn test_non_numeric_element_and_flags() {
    let snapshot = decode("yes,maybe,x,ANSI50,1,2,3").unwrap();
    assert!(!snapshot.trip);
    assert!(!snapshot.close);
    assert_eq!(snapshot.fault_type, FaultKind::Unknown);
    assert_eq!(snapshot.protection_element, 0);
    assert_eq!(snapshot.current, 1.0);
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let mut codec = SnapshotCodec::new();
    let result = codec.decode(&[0x31, 0x2c, 0xff, 0xfe]);
    assert_eq!(result, Err(ProtocolError::InvalidEncoding));
    assert_eq!(codec.get_stats().records_rejected, 1);
}

#[test]
fn test_oversized_record_is_rejected() {
    let oversized = "1,".repeat(MAX_RECORD_SIZE);
    let mut codec = SnapshotCodec::new();
    assert_eq!(codec.decode(oversized.as_bytes()), Err(ProtocolError::MessageTooLarge));
}

#[test]
fn test_codec_reuses_buffer() {
    let mut codec = SnapshotCodec::new();
    let first = codec.encode(&relay_defaults()).unwrap().to_string();
    let tripped = Snapshot {
        trip: true,
        ..relay_defaults()
    };
    let second = codec.encode(&tripped).unwrap().to_string();

    assert!(first.starts_with("0,"));
    assert!(second.starts_with("1,"));
    assert_eq!(codec.get_stats().records_encoded, 2);
}
