use crate::snapshot::FAULT_CODE_DISTANCE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_COMMAND_SIZE: usize = 512;

/// Operator input for the relay, one JSON object per line.
///
/// `{"SetTrip":{"active":true}}`, `{"SetCurrent":{"amps":3600.0}}`, `"Reset"`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperatorCommand {
    SetTrip { active: bool },
    SetClose { active: bool },
    SetFaultType { code: u8 },
    SetProtectionElement { element: i32 },
    SetCurrent { amps: f64 },
    SetVoltage { volts: f64 },
    SetFrequency { hertz: f64 },
    SetProtectionLogic { enabled: bool },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid command format: {0}")]
    InvalidJson(String),
    #[error("command exceeds maximum size")]
    MessageTooLarge,
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

pub fn parse_command(line: &str) -> Result<OperatorCommand, CommandError> {
    if line.len() > MAX_COMMAND_SIZE {
        return Err(CommandError::MessageTooLarge);
    }

    let command = serde_json::from_str::<OperatorCommand>(line.trim())
        .map_err(|e| CommandError::InvalidJson(e.to_string()))?;
    validate_command(&command)?;
    Ok(command)
}

pub fn validate_command(command: &OperatorCommand) -> Result<(), CommandError> {
    match command {
        // Operators pick from the four defined codes only
        OperatorCommand::SetFaultType { code } if *code > FAULT_CODE_DISTANCE => {
            Err(CommandError::InvalidParameter("fault type must be 0-3"))
        }
        OperatorCommand::SetCurrent { amps } if amps.is_nan() => {
            Err(CommandError::InvalidParameter("current must be a number"))
        }
        OperatorCommand::SetVoltage { volts } if volts.is_nan() => {
            Err(CommandError::InvalidParameter("voltage must be a number"))
        }
        OperatorCommand::SetFrequency { hertz } if hertz.is_nan() => {
            Err(CommandError::InvalidParameter("frequency must be a number"))
        }
        _ => Ok(()),
    }
}
