//! Type definitions shared between the real and simulated backends

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{RmsError, RmsResult};

/// Unit quaternion `[q0, q1, q2, q3]`, scalar first
pub type Quaternion = [f64; 4];

/// Cartesian position `[x, y, z]`
pub type Position = [f64; 3];

/// Identity orientation
pub const IDENTITY_QUATERNION: Quaternion = [1.0, 0.0, 0.0, 0.0];

/// Tool placement: position plus orientation
///
/// Poses are plain values. Everything that stores one (tool cache, buffer
/// entries, the motion trace) holds its own copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub position: Position,
    pub orientation: Quaternion,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Origin with identity orientation
    pub const IDENTITY: Pose = Pose {
        position: [0.0, 0.0, 0.0],
        orientation: IDENTITY_QUATERNION,
    };

    pub fn new(position: Position, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }

    /// Build a pose from separate position and orientation slices
    pub fn from_parts(position: &[f64], orientation: &[f64]) -> RmsResult<Self> {
        match (<Position>::try_from(position), <Quaternion>::try_from(orientation)) {
            (Ok(position), Ok(orientation)) => Ok(Self { position, orientation }),
            _ => {
                warn!(
                    "Received malformed coordinate: position {:?}, orientation {:?}",
                    position, orientation
                );
                Err(RmsError::malformed(format!(
                    "expected 3 position and 4 orientation components, got {} and {}",
                    position.len(),
                    orientation.len()
                )))
            }
        }
    }

    /// Build a pose from the flattened `[x, y, z, q0, q1, q2, q3]` form
    pub fn from_flat(values: &[f64]) -> RmsResult<Self> {
        if values.len() != 7 {
            warn!("Received malformed coordinate: {:?}", values);
            return Err(RmsError::malformed(format!(
                "expected 7 flat components, got {}",
                values.len()
            )));
        }
        Self::from_parts(&values[0..3], &values[3..7])
    }

    /// Normalize any accepted coordinate shape into a pose
    pub fn normalize(input: &Coordinates) -> RmsResult<Self> {
        match input {
            Coordinates::Split(position, orientation) => Self::from_parts(position, orientation),
            Coordinates::Flat(values) => Self::from_flat(values),
        }
    }

    pub fn flatten(&self) -> [f64; 7] {
        let [x, y, z] = self.position;
        let [q0, q1, q2, q3] = self.orientation;
        [x, y, z, q0, q1, q2, q3]
    }

    /// Same orientation, position moved by `offset`
    pub fn translated(&self, offset: Position) -> Self {
        let mut pose = *self;
        for (axis, delta) in pose.position.iter_mut().zip(offset) {
            *axis += delta;
        }
        pose
    }
}

/// Coordinate input as callers provide it: `[[x, y, z], [q0, q1, q2, q3]]`
/// or `[x, y, z, q0, q1, q2, q3]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Coordinates {
    Split(Vec<f64>, Vec<f64>),
    Flat(Vec<f64>),
}

impl From<Pose> for Coordinates {
    fn from(pose: Pose) -> Self {
        Coordinates::Split(pose.position.to_vec(), pose.orientation.to_vec())
    }
}

impl TryFrom<&Coordinates> for Pose {
    type Error = RmsError;

    fn try_from(input: &Coordinates) -> RmsResult<Self> {
        Pose::normalize(input)
    }
}

/// Entry appended to the remote buffer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum BufferTarget {
    /// Full pose
    Pose(Pose),
    /// Position only; the controller applies the orientation set with
    /// `buffer_set_orientation`
    Position(Position),
}

impl From<Pose> for BufferTarget {
    fn from(pose: Pose) -> Self {
        BufferTarget::Pose(pose)
    }
}

/// Caller-side length unit
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinearUnit {
    #[default]
    Millimeters,
    Meters,
    Inches,
}

impl LinearUnit {
    /// Millimeters per unit
    pub fn factor(&self) -> f64 {
        match self {
            LinearUnit::Millimeters => 1.0,
            LinearUnit::Meters => 1000.0,
            LinearUnit::Inches => 25.4,
        }
    }
}

/// Caller-side angle unit
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AngularUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngularUnit {
    /// Degrees per unit
    pub fn factor(&self) -> f64 {
        match self {
            AngularUnit::Degrees => 1.0,
            AngularUnit::Radians => 57.2957795,
        }
    }
}

/// Conversion between caller units and controller units (mm, degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    linear: f64,
    angular: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self { linear: 1.0, angular: 1.0 }
    }
}

impl UnitScale {
    /// Both factors must be strictly positive
    pub fn new(linear: f64, angular: f64) -> RmsResult<Self> {
        if !(linear > 0.0 && angular > 0.0) || !linear.is_finite() || !angular.is_finite() {
            return Err(RmsError::InvalidArgument(format!(
                "unit scale factors must be positive, got linear {} angular {}",
                linear, angular
            )));
        }
        Ok(Self { linear, angular })
    }

    pub fn from_units(linear: LinearUnit, angular: AngularUnit) -> Self {
        Self {
            linear: linear.factor(),
            angular: angular.factor(),
        }
    }

    pub fn linear(&self) -> f64 {
        self.linear
    }

    pub fn angular(&self) -> f64 {
        self.angular
    }

    pub fn length_out(&self, value: f64) -> f64 {
        value * self.linear
    }

    pub fn length_in(&self, value: f64) -> f64 {
        value / self.linear
    }

    pub fn angle_out(&self, value: f64) -> f64 {
        value * self.angular
    }

    pub fn angle_in(&self, value: f64) -> f64 {
        value / self.angular
    }
}

/// Behaviour of `reset_position`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResetMode {
    /// Disable extrusion, stay still
    DisableHold,
    /// Disable extrusion, return to zero
    DisableReset,
    /// Enable extrusion, return to zero
    EnableReset,
    /// Enable extrusion, stay still
    EnableHold,
}

impl ResetMode {
    pub fn to_i32(&self) -> i32 {
        match self {
            ResetMode::DisableHold => -1,
            ResetMode::DisableReset => 0,
            ResetMode::EnableReset => 1,
            ResetMode::EnableHold => 2,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(ResetMode::DisableHold),
            0 => Some(ResetMode::DisableReset),
            1 => Some(ResetMode::EnableReset),
            2 => Some(ResetMode::EnableHold),
            _ => None,
        }
    }

    pub fn extrusion_enabled(&self) -> bool {
        matches!(self, ResetMode::EnableReset | ResetMode::EnableHold)
    }

    pub fn returns_to_zero(&self) -> bool {
        matches!(self, ResetMode::DisableReset | ResetMode::EnableReset)
    }
}

impl TryFrom<i32> for ResetMode {
    type Error = RmsError;

    fn try_from(value: i32) -> RmsResult<Self> {
        ResetMode::from_i32(value)
            .ok_or_else(|| RmsError::InvalidArgument(format!("unrecognised reset mode {}", value)))
    }
}

/// Status flag reported by the controller for a delivered command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Success)
    }
}

/// Why a command was not sent
#[derive(Debug, Clone, PartialEq)]
pub enum Refusal {
    /// Array argument has the wrong number of elements
    WrongLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Zone key not in the preset table and no usable manual zone
    UnknownZone(String),
    /// Operation needs a populated buffer
    EmptyBuffer,
    /// Operation needs a buffer of an exact length
    BufferLength { expected: usize, actual: usize },
    /// Nothing was ever saved in this slot
    EmptySlot(u32),
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::WrongLength { what, expected, actual } => {
                write!(f, "{} needs {} values, got {}", what, expected, actual)
            }
            Refusal::UnknownZone(key) => write!(f, "unknown zone '{}'", key),
            Refusal::EmptyBuffer => write!(f, "buffer is empty"),
            Refusal::BufferLength { expected, actual } => {
                write!(f, "buffer needs {} entries, holds {}", expected, actual)
            }
            Refusal::EmptySlot(slot) => write!(f, "buffer slot {} is empty", slot),
        }
    }
}

/// Result of a command that can be refused locally
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Delivered; carries the controller status
    Done(CommandStatus),
    /// Rejected before anything was sent
    Refused(Refusal),
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome::Done(CommandStatus::Success)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Done(CommandStatus::Success))
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, Outcome::Refused(_))
    }

    pub fn refusal(&self) -> Option<&Refusal> {
        match self {
            Outcome::Refused(refusal) => Some(refusal),
            Outcome::Done(_) => None,
        }
    }
}

impl From<Refusal> for Outcome {
    fn from(refusal: Refusal) -> Self {
        Outcome::Refused(refusal)
    }
}

/// Check an array argument's length before anything is sent
pub fn fixed_values<const N: usize>(what: &'static str, values: &[f64]) -> Result<[f64; N], Refusal> {
    <[f64; N]>::try_from(values).map_err(|_| Refusal::WrongLength {
        what,
        expected: N,
        actual: values.len(),
    })
}
