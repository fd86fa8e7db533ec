use crate::snapshot::{FaultKind, Snapshot, FAULT_CODE_UNKNOWN};
use arrayvec::ArrayString;
use core::fmt::Write;
use heapless::Vec;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

pub const FIELD_COUNT: usize = 7;
pub const FIELD_SEPARATOR: char = ',';
pub const RECORD_TERMINATOR: char = '\n';
pub const MAX_RECORD_SIZE: usize = 256;

// Flags + fault code + i32 element + three f64 in shortest exponent form,
// separators and terminator.
const WORST_CASE_RECORD_LEN: usize = 1 + 1 + 3 + 11 + 3 * 24 + (FIELD_COUNT - 1) + 1;
const_assert!(WORST_CASE_RECORD_LEN <= MAX_RECORD_SIZE);

pub type RecordBuffer = ArrayString<MAX_RECORD_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("record has {found} fields, expected at least {expected}")]
    MissingFields { found: usize, expected: usize },
    #[error("record is not valid UTF-8")]
    InvalidEncoding,
    #[error("record exceeds buffer size")]
    MessageTooLarge,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CodecStats {
    pub records_encoded: u32,
    pub records_decoded: u32,
    pub records_rejected: u32,
    pub fields_coerced: u32,
}

/// Encodes and decodes the 7-field snapshot record.
///
/// Encoding reuses a preallocated buffer; decoding tolerates bad individual
/// fields and only rejects records that are structurally short.
#[derive(Debug, Default)]
pub struct SnapshotCodec {
    record_buffer: RecordBuffer,
    stats: CodecStats,
}

impl SnapshotCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, snapshot: &Snapshot) -> Result<&str, ProtocolError> {
        self.record_buffer.clear();
        write_record(&mut self.record_buffer, snapshot)?;
        self.stats.records_encoded = self.stats.records_encoded.saturating_add(1);
        Ok(&self.record_buffer)
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Result<Snapshot, ProtocolError> {
        match decode_fields(bytes) {
            Ok(decoded) => {
                self.stats.records_decoded = self.stats.records_decoded.saturating_add(1);
                self.stats.fields_coerced = self
                    .stats
                    .fields_coerced
                    .saturating_add(u32::from(decoded.coerced_fields));
                Ok(decoded.snapshot)
            }
            Err(e) => {
                self.stats.records_rejected = self.stats.records_rejected.saturating_add(1);
                Err(e)
            }
        }
    }

    pub fn get_stats(&self) -> &CodecStats {
        &self.stats
    }
}

pub fn encode(snapshot: &Snapshot) -> Result<RecordBuffer, ProtocolError> {
    let mut buffer = RecordBuffer::new();
    write_record(&mut buffer, snapshot)?;
    Ok(buffer)
}

pub fn decode(record: &str) -> Result<Snapshot, ProtocolError> {
    decode_fields(record.as_bytes()).map(|decoded| decoded.snapshot)
}

fn write_record(buffer: &mut RecordBuffer, snapshot: &Snapshot) -> Result<(), ProtocolError> {
    // `{:?}` gives the shortest representation that parses back to the same
    // f64 and switches to exponent form for very large or small values.
    write!(
        buffer,
        "{}{sep}{}{sep}{}{sep}{}{sep}{:?}{sep}{:?}{sep}{:?}{term}",
        u8::from(snapshot.trip),
        u8::from(snapshot.close),
        snapshot.fault_type.code(),
        snapshot.protection_element,
        snapshot.current,
        snapshot.voltage,
        snapshot.frequency,
        sep = FIELD_SEPARATOR,
        term = RECORD_TERMINATOR,
    )
    .map_err(|_| ProtocolError::MessageTooLarge)
}

struct Decoded {
    snapshot: Snapshot,
    coerced_fields: u8,
}

fn decode_fields(bytes: &[u8]) -> Result<Decoded, ProtocolError> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(ProtocolError::MessageTooLarge);
    }

    let record = core::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidEncoding)?;
    let record = record.trim();
    if record.is_empty() {
        return Err(ProtocolError::MissingFields {
            found: 0,
            expected: FIELD_COUNT,
        });
    }

    // Fields past the seventh are ignored
    let mut fields: Vec<&str, FIELD_COUNT> = Vec::new();
    for field in record.split(FIELD_SEPARATOR).take(FIELD_COUNT) {
        let _ = fields.push(field.trim());
    }

    if fields.len() < FIELD_COUNT {
        return Err(ProtocolError::MissingFields {
            found: fields.len(),
            expected: FIELD_COUNT,
        });
    }

    let mut coerced_fields = 0u8;
    let mut note = |ok: bool| {
        if !ok {
            coerced_fields += 1;
        }
    };

    let (trip, ok) = parse_flag(fields[0]);
    note(ok);
    let (close, ok) = parse_flag(fields[1]);
    note(ok);
    let (fault_type, ok) = parse_fault(fields[2]);
    note(ok);
    let (protection_element, ok) = parse_element(fields[3]);
    note(ok);
    let (current, ok) = parse_measurement(fields[4]);
    note(ok);
    let (voltage, ok) = parse_measurement(fields[5]);
    note(ok);
    let (frequency, ok) = parse_measurement(fields[6]);
    note(ok);

    Ok(Decoded {
        snapshot: Snapshot {
            trip,
            close,
            fault_type,
            protection_element,
            current,
            voltage,
            frequency,
        },
        coerced_fields,
    })
}

// Each parser returns the value and whether the field was well-formed.

fn parse_flag(field: &str) -> (bool, bool) {
    match field {
        "1" => (true, true),
        "0" => (false, true),
        _ => (false, false),
    }
}

fn parse_fault(field: &str) -> (FaultKind, bool) {
    match field.parse::<i64>() {
        Ok(code) => {
            let kind = FaultKind::from_code(code);
            let well_formed = kind != FaultKind::Unknown || code == i64::from(FAULT_CODE_UNKNOWN);
            (kind, well_formed)
        }
        Err(_) => (FaultKind::Unknown, false),
    }
}

fn parse_element(field: &str) -> (i32, bool) {
    match field.parse::<i32>() {
        Ok(element) => (element, true),
        Err(_) => (0, false),
    }
}

fn parse_measurement(field: &str) -> (f64, bool) {
    match field.parse::<f64>() {
        Ok(value) => (value, true),
        Err(_) => (0.0, false),
    }
}
