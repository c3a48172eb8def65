//! Wire codec for the motion server
//!
//! Requests are ASCII: a two-character command id, then fixed-width numeric
//! fields, each followed by a single space, then the `#` sentinel:
//!
//! ```text
//! 01 0 +00010.0 +00000.0 +00000.0 +1.00000 +0.00000 +0.00000 +0.00000 #
//! ```
//!
//! Replies are whitespace separated: the echoed command id, a status flag,
//! then the payload.

use crate::commands::CommandId;
use crate::error::{RmsError, RmsResult};
use crate::types::CommandStatus;

/// Message terminator
pub const SENTINEL: char = '#';

/// Status token the controller uses for success
pub const STATUS_OK: &str = "1";

/// A numeric request field. The variant fixes width, precision and sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    /// Length, one decimal, signed (`+08.1`)
    Linear(f64),
    /// Angle, two decimals, signed (`+08.2`)
    Angle(f64),
    /// Quaternion component, five decimals, signed (`+08.5`)
    Quaternion(f64),
    /// Zone tolerance, offset or scale, four decimals, signed (`+08.4`)
    Precise(f64),
    /// Length, one decimal, unsigned (`08.1`)
    BareLinear(f64),
    /// Quaternion component, five decimals, unsigned (`08.5`)
    BareQuaternion(f64),
    /// Angle, two decimals, no padding
    BareAngle(f64),
    Integer(i64),
}

impl Field {
    pub fn render(&self) -> String {
        match *self {
            Field::Linear(v) => format!("{:+08.1}", v),
            Field::Angle(v) => format!("{:+08.2}", v),
            Field::Quaternion(v) => format!("{:+08.5}", v),
            Field::Precise(v) => format!("{:+08.4}", v),
            Field::BareLinear(v) => format!("{:08.1}", v),
            Field::BareQuaternion(v) => format!("{:08.5}", v),
            Field::BareAngle(v) => format!("{:.2}", v),
            Field::Integer(v) => v.to_string(),
        }
    }
}

/// Render a request
pub fn encode(id: CommandId, fields: &[Field]) -> String {
    let mut message = id.token();
    message.push(' ');
    for field in fields {
        message.push_str(&field.render());
        message.push(' ');
    }
    message.push(SENTINEL);
    message
}

/// Decoded reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Echoed command id token
    pub command: String,
    pub status: CommandStatus,
    pub payload: Vec<String>,
}

impl Reply {
    /// The echoed id, if it is one we know
    pub fn command_id(&self) -> Option<CommandId> {
        self.command.parse::<i8>().ok().and_then(CommandId::from_code)
    }

    /// Parse the whole payload as numbers
    pub fn numbers(&self) -> RmsResult<Vec<f64>> {
        self.payload
            .iter()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    RmsError::decode(format!(
                        "non-numeric payload token '{}' in reply to {}",
                        token, self.command
                    ))
                })
            })
            .collect()
    }

    /// The first `count` payload numbers; fewer is a decode error
    pub fn leading_numbers(&self, count: usize) -> RmsResult<Vec<f64>> {
        let mut values = self.numbers()?;
        if values.len() < count {
            return Err(RmsError::decode(format!(
                "reply to {} carries {} values, expected {}",
                self.command,
                values.len(),
                count
            )));
        }
        values.truncate(count);
        Ok(values)
    }

    /// Payload rejoined as text
    pub fn text(&self) -> String {
        self.payload.join(" ")
    }
}

/// Split a raw reply into its positional parts
pub fn decode(raw: &str) -> RmsResult<Reply> {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.last() == Some(&"#") {
        tokens.pop();
    }
    if tokens.len() < 2 {
        return Err(RmsError::decode(format!("short reply '{}'", raw.trim())));
    }
    let status = if tokens[1] == STATUS_OK {
        CommandStatus::Success
    } else {
        CommandStatus::Failure
    };
    Ok(Reply {
        command: tokens[0].to_string(),
        status,
        payload: tokens[2..].iter().map(|t| t.to_string()).collect(),
    })
}
