//! Command definitions for the motion server
//!
//! Command ids are fixed by the controller program and must not change.

use serde::{Deserialize, Serialize};

use crate::codec::{self, Field};
use crate::types::{BufferTarget, Pose, Position, Quaternion, ResetMode, UnitScale};
use crate::zone::ZoneTolerance;

/// Command identifiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CommandId {
    MoveCartesian,
    MoveJoints,
    GetCartesian,
    GetJoints,
    GetExternalAxis,
    SetTool,
    SetWorkObject,
    SetSpeed,
    SetZone,
    RotateZ,
    CheckJ6,
    BufferSetOrientation,
    BufferAdd,
    BufferClear,
    BufferLength,
    BufferExecute,
    SetExternalAxis,
    CircularVia,
    CircularEnd,
    BufferExecuteCircular,
    CheckPosition,
    BufferSave,
    BufferLoad,
    BufferReadValue,
    BufferOffset,
    BufferSpeedScale,
    SetGroupOutput,
    SetDigitalOutput,
    GetRobotInfo,
    Disconnect,
    ResetPosition,
}

impl CommandId {
    pub const ALL: [CommandId; 31] = [
        CommandId::MoveCartesian,
        CommandId::MoveJoints,
        CommandId::GetCartesian,
        CommandId::GetJoints,
        CommandId::GetExternalAxis,
        CommandId::SetTool,
        CommandId::SetWorkObject,
        CommandId::SetSpeed,
        CommandId::SetZone,
        CommandId::RotateZ,
        CommandId::CheckJ6,
        CommandId::BufferSetOrientation,
        CommandId::BufferAdd,
        CommandId::BufferClear,
        CommandId::BufferLength,
        CommandId::BufferExecute,
        CommandId::SetExternalAxis,
        CommandId::CircularVia,
        CommandId::CircularEnd,
        CommandId::BufferExecuteCircular,
        CommandId::CheckPosition,
        CommandId::BufferSave,
        CommandId::BufferLoad,
        CommandId::BufferReadValue,
        CommandId::BufferOffset,
        CommandId::BufferSpeedScale,
        CommandId::SetGroupOutput,
        CommandId::SetDigitalOutput,
        CommandId::GetRobotInfo,
        CommandId::Disconnect,
        CommandId::ResetPosition,
    ];

    pub fn code(&self) -> i8 {
        match self {
            CommandId::MoveCartesian => 1,
            CommandId::MoveJoints => 2,
            CommandId::GetCartesian => 3,
            CommandId::GetJoints => 4,
            CommandId::GetExternalAxis => 5,
            CommandId::SetTool => 6,
            CommandId::SetWorkObject => 7,
            CommandId::SetSpeed => 8,
            CommandId::SetZone => 9,
            CommandId::RotateZ => 10,
            CommandId::CheckJ6 => 11,
            CommandId::BufferSetOrientation => 29,
            CommandId::BufferAdd => 30,
            CommandId::BufferClear => 31,
            CommandId::BufferLength => 32,
            CommandId::BufferExecute => 33,
            CommandId::SetExternalAxis => 34,
            CommandId::CircularVia => 35,
            CommandId::CircularEnd => 36,
            CommandId::BufferExecuteCircular => 37,
            CommandId::CheckPosition => 40,
            CommandId::BufferSave => 50,
            CommandId::BufferLoad => 51,
            CommandId::BufferReadValue => 52,
            CommandId::BufferOffset => 53,
            CommandId::BufferSpeedScale => 54,
            CommandId::SetGroupOutput => 96,
            CommandId::SetDigitalOutput => 97,
            CommandId::GetRobotInfo => 98,
            CommandId::Disconnect => 99,
            CommandId::ResetPosition => -1,
        }
    }

    pub fn from_code(value: i8) -> Option<Self> {
        CommandId::ALL.into_iter().find(|id| id.code() == value)
    }

    /// Zero-padded two character form used on the wire
    pub fn token(&self) -> String {
        format!("{:02}", self.code())
    }
}

/// A request with its arguments in caller units
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveCartesian { pose: Pose, fine: bool },
    MoveJoints([f64; 6]),
    GetCartesian,
    GetJoints,
    GetExternalAxis,
    SetTool(Pose),
    SetWorkObject(Pose),
    /// `[tcp linear, tcp angular, external linear, external angular]`
    SetSpeed([f64; 4]),
    /// Already in controller units
    SetZone(ZoneTolerance),
    RotateZ(f64),
    CheckJ6,
    BufferSetOrientation(Quaternion),
    BufferAdd(BufferTarget),
    BufferClear,
    BufferLength,
    BufferExecute { extrude: bool },
    SetExternalAxis([f64; 2]),
    CircularVia(Pose),
    CircularEnd(Pose),
    BufferExecuteCircular,
    CheckPosition(Pose),
    BufferSave(u32),
    BufferLoad(u32),
    BufferReadValue(i32),
    BufferOffset(Position),
    BufferSpeedScale(f64),
    SetGroupOutput(i64),
    SetDigitalOutput(bool),
    GetRobotInfo,
    Disconnect,
    ResetPosition(ResetMode),
}

fn pose_fields(pose: &Pose, scale: &UnitScale) -> Vec<Field> {
    pose.position
        .iter()
        .map(|v| Field::Linear(scale.length_out(*v)))
        .chain(pose.orientation.iter().map(|q| Field::Quaternion(*q)))
        .collect()
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Command::MoveCartesian { .. } => CommandId::MoveCartesian,
            Command::MoveJoints(_) => CommandId::MoveJoints,
            Command::GetCartesian => CommandId::GetCartesian,
            Command::GetJoints => CommandId::GetJoints,
            Command::GetExternalAxis => CommandId::GetExternalAxis,
            Command::SetTool(_) => CommandId::SetTool,
            Command::SetWorkObject(_) => CommandId::SetWorkObject,
            Command::SetSpeed(_) => CommandId::SetSpeed,
            Command::SetZone(_) => CommandId::SetZone,
            Command::RotateZ(_) => CommandId::RotateZ,
            Command::CheckJ6 => CommandId::CheckJ6,
            Command::BufferSetOrientation(_) => CommandId::BufferSetOrientation,
            Command::BufferAdd(_) => CommandId::BufferAdd,
            Command::BufferClear => CommandId::BufferClear,
            Command::BufferLength => CommandId::BufferLength,
            Command::BufferExecute { .. } => CommandId::BufferExecute,
            Command::SetExternalAxis(_) => CommandId::SetExternalAxis,
            Command::CircularVia(_) => CommandId::CircularVia,
            Command::CircularEnd(_) => CommandId::CircularEnd,
            Command::BufferExecuteCircular => CommandId::BufferExecuteCircular,
            Command::CheckPosition(_) => CommandId::CheckPosition,
            Command::BufferSave(_) => CommandId::BufferSave,
            Command::BufferLoad(_) => CommandId::BufferLoad,
            Command::BufferReadValue(_) => CommandId::BufferReadValue,
            Command::BufferOffset(_) => CommandId::BufferOffset,
            Command::BufferSpeedScale(_) => CommandId::BufferSpeedScale,
            Command::SetGroupOutput(_) => CommandId::SetGroupOutput,
            Command::SetDigitalOutput(_) => CommandId::SetDigitalOutput,
            Command::GetRobotInfo => CommandId::GetRobotInfo,
            Command::Disconnect => CommandId::Disconnect,
            Command::ResetPosition(_) => CommandId::ResetPosition,
        }
    }

    /// Numeric fields in controller units
    pub fn fields(&self, scale: &UnitScale) -> Vec<Field> {
        match self {
            Command::MoveCartesian { pose, fine } => {
                let mut fields = vec![Field::Integer(i64::from(*fine))];
                fields.extend(pose_fields(pose, scale));
                fields
            }
            Command::MoveJoints(joints) => joints
                .iter()
                .map(|j| Field::Angle(scale.angle_out(*j)))
                .collect(),
            Command::SetTool(pose)
            | Command::SetWorkObject(pose)
            | Command::CircularVia(pose)
            | Command::CircularEnd(pose)
            | Command::CheckPosition(pose) => pose_fields(pose, scale),
            Command::SetSpeed([tcp_lin, tcp_ang, ext_lin, ext_ang]) => vec![
                Field::Linear(scale.length_out(*tcp_lin)),
                Field::Angle(scale.angle_out(*tcp_ang)),
                Field::Linear(scale.length_out(*ext_lin)),
                Field::Angle(scale.angle_out(*ext_ang)),
            ],
            Command::SetZone(zone) => {
                let mut fields = vec![Field::Integer(i64::from(zone.exact))];
                fields.extend(zone.values.iter().map(|v| Field::Precise(*v)));
                fields
            }
            Command::RotateZ(angle) => vec![Field::BareAngle(scale.angle_out(*angle))],
            Command::BufferSetOrientation(q) => {
                q.iter().map(|v| Field::BareQuaternion(*v)).collect()
            }
            Command::BufferAdd(BufferTarget::Pose(pose)) => pose_fields(pose, scale),
            Command::BufferAdd(BufferTarget::Position(position)) => position
                .iter()
                .map(|v| Field::BareLinear(scale.length_out(*v)))
                .collect(),
            Command::BufferExecute { extrude: true } => vec![Field::Integer(1)],
            Command::SetExternalAxis(axes) => axes
                .iter()
                .map(|a| Field::Angle(scale.angle_out(*a)))
                .collect(),
            Command::BufferSave(slot) | Command::BufferLoad(slot) => {
                vec![Field::Integer(i64::from(*slot))]
            }
            Command::BufferReadValue(index) => vec![Field::Integer(i64::from(*index))],
            Command::BufferOffset(offset) => offset
                .iter()
                .map(|v| Field::Precise(scale.length_out(*v)))
                .collect(),
            Command::BufferSpeedScale(factor) => vec![Field::Precise(*factor)],
            Command::SetGroupOutput(value) => vec![Field::Integer(*value)],
            Command::SetDigitalOutput(value) => vec![Field::Integer(i64::from(*value))],
            Command::ResetPosition(mode) => vec![Field::Integer(i64::from(mode.to_i32()))],
            Command::GetCartesian
            | Command::GetJoints
            | Command::GetExternalAxis
            | Command::CheckJ6
            | Command::BufferClear
            | Command::BufferLength
            | Command::BufferExecute { extrude: false }
            | Command::BufferExecuteCircular
            | Command::GetRobotInfo
            | Command::Disconnect => Vec::new(),
        }
    }

    /// Render the full wire message
    pub fn encode(&self, scale: &UnitScale) -> String {
        codec::encode(self.id(), &self.fields(scale))
    }
}
