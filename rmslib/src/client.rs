//! Real robot backend
//!
//! [`RobotClient`] turns each [`Robot`] call into one request/reply exchange
//! on a [`Connection`]:
//!
//! 1. encode the command with the current unit scale
//! 2. write it
//! 3. wait the settle delay (a timing requirement of the controller)
//! 4. block on the reply and decode it
//!
//! The client owns its connection exclusively and is released on drop.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rmsproto::{
    codec, fixed_values, BufferTarget, Command, CommandStatus, Outcome, Pose, Position,
    Quaternion, Reply, ResetMode, RmsError, RmsResult, Robot, UnitScale, ZoneRequest,
    DEFAULT_SPEED, EXTERNAL_AXES,
};

use crate::config::ClientConfig;
use crate::connection::{Connection, TcpConnection};

/// Client for a robot controller running the motion server
pub struct RobotClient {
    connection: Box<dyn Connection>,
    scale: UnitScale,
    settle_delay: Duration,
    tool: Pose,
    closed: bool,
}

impl RobotClient {
    /// Connect to the controller named in `config` and apply the default
    /// tool, work object, speed and zone
    pub fn connect(config: &ClientConfig) -> RmsResult<Self> {
        let connection = TcpConnection::connect(config.motion_addr()?, config.connect_timeout())?;
        let mut client = Self::with_connection(Box::new(connection), config);
        client.initialize()?;
        Ok(client)
    }

    /// Wrap an already open connection. Nothing is sent.
    pub fn with_connection(connection: Box<dyn Connection>, config: &ClientConfig) -> Self {
        Self {
            connection,
            scale: config.units(),
            settle_delay: config.settle_delay(),
            tool: Pose::IDENTITY,
            closed: false,
        }
    }

    /// Put the controller in a known configuration
    pub fn initialize(&mut self) -> RmsResult<()> {
        self.set_tool(&Pose::IDENTITY)?;
        self.set_workobject(&Pose::IDENTITY)?;
        self.set_speed(&DEFAULT_SPEED)?;
        self.set_zone(&ZoneRequest::default())?;
        Ok(())
    }

    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send a command and wait for its reply
    fn exchange(&mut self, command: &Command) -> RmsResult<Reply> {
        if self.closed {
            return Err(RmsError::Connection("client is closed".to_string()));
        }
        let message = command.encode(&self.scale);
        debug!("{:<22} sending: {}", format!("{:?}", command.id()), message);
        self.connection.send(&message)?;
        thread::sleep(self.settle_delay);
        let raw = self.connection.receive()?;
        debug!("{:<22} received: {}", format!("{:?}", command.id()), raw.trim_end());
        codec::decode(&raw)
    }

    /// Send a command that has no reply
    fn post(&mut self, command: &Command) -> RmsResult<()> {
        let message = command.encode(&self.scale);
        debug!("{:<22} sending: {}", format!("{:?}", command.id()), message);
        self.connection.send(&message)?;
        thread::sleep(self.settle_delay);
        Ok(())
    }

    fn run(&mut self, command: Command) -> RmsResult<Outcome> {
        let reply = self.exchange(&command)?;
        Ok(Outcome::Done(reply.status))
    }

    /// Pose from seven controller-unit values
    fn pose_in(&self, values: &[f64]) -> RmsResult<Pose> {
        let mut pose = Pose::from_flat(values)?;
        for axis in pose.position.iter_mut() {
            *axis = self.scale.length_in(*axis);
        }
        Ok(pose)
    }
}

impl Robot for RobotClient {
    fn set_units(&mut self, scale: UnitScale) {
        self.scale = scale;
    }

    fn units(&self) -> UnitScale {
        self.scale
    }

    fn set_cartesian(&mut self, pose: &Pose, fine: bool) -> RmsResult<Outcome> {
        self.run(Command::MoveCartesian { pose: *pose, fine })
    }

    fn set_joints(&mut self, joints: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<6>("joints", joints) {
            Ok(joints) => self.run(Command::MoveJoints(joints)),
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn get_cartesian(&mut self) -> RmsResult<Pose> {
        let values = self.exchange(&Command::GetCartesian)?.leading_numbers(7)?;
        self.pose_in(&values)
    }

    fn get_joints(&mut self) -> RmsResult<[f64; 6]> {
        let values = self.exchange(&Command::GetJoints)?.leading_numbers(6)?;
        let mut joints = [0.0; 6];
        for (joint, value) in joints.iter_mut().zip(values) {
            *joint = self.scale.angle_in(value);
        }
        Ok(joints)
    }

    fn get_external_axis(&mut self) -> RmsResult<[f64; EXTERNAL_AXES]> {
        let values = self
            .exchange(&Command::GetExternalAxis)?
            .leading_numbers(EXTERNAL_AXES)?;
        let mut axes = [0.0; EXTERNAL_AXES];
        for (axis, value) in axes.iter_mut().zip(values) {
            *axis = self.scale.angle_in(value);
        }
        Ok(axes)
    }

    fn get_robot_info(&mut self) -> RmsResult<Vec<String>> {
        let reply = self.exchange(&Command::GetRobotInfo)?;
        let info: Vec<String> = reply
            .text()
            .split('*')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();
        debug!("get_robot_info result: {:?}", info);
        Ok(info)
    }

    fn set_tool(&mut self, tool: &Pose) -> RmsResult<Outcome> {
        let outcome = self.run(Command::SetTool(*tool))?;
        if outcome.is_ok() {
            self.tool = *tool;
        }
        Ok(outcome)
    }

    fn tool(&self) -> Pose {
        self.tool
    }

    fn set_workobject(&mut self, workobject: &Pose) -> RmsResult<Outcome> {
        self.run(Command::SetWorkObject(*workobject))
    }

    fn set_speed(&mut self, speed: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<4>("speed", speed) {
            Ok(speed) => self.run(Command::SetSpeed(speed)),
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn set_zone(&mut self, zone: &ZoneRequest) -> RmsResult<Outcome> {
        match zone.resolve(&self.scale) {
            Ok(tolerance) => self.run(Command::SetZone(tolerance)),
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn rotate_z(&mut self, angle: f64) -> RmsResult<Outcome> {
        self.run(Command::RotateZ(angle))
    }

    fn check_j6(&mut self) -> RmsResult<Outcome> {
        self.run(Command::CheckJ6)
    }

    fn check_position(&mut self, pose: &Pose) -> RmsResult<bool> {
        let reply = self.exchange(&Command::CheckPosition(*pose))?;
        Ok(reply.status.is_success())
    }

    fn set_dio(&mut self, value: bool, line: u8) -> RmsResult<Outcome> {
        debug!("set_dio line {} -> {}", line, value);
        self.run(Command::SetDigitalOutput(value))
    }

    fn set_go(&mut self, value: i64) -> RmsResult<Outcome> {
        self.run(Command::SetGroupOutput(value))
    }

    fn set_external_axis(&mut self, axes: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<2>("external axis", axes) {
            Ok(axes) => self.run(Command::SetExternalAxis(axes)),
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn move_circular(&mut self, via: &Pose, end: &Pose) -> RmsResult<Outcome> {
        let first = self.exchange(&Command::CircularVia(*via))?;
        if !first.status.is_success() {
            warn!("move_circular: controller rejected the via point, end point not sent");
            return Ok(Outcome::Done(CommandStatus::Failure));
        }
        self.run(Command::CircularEnd(*end))
    }

    fn reset_position(&mut self, mode: i32) -> RmsResult<Outcome> {
        let mode = ResetMode::try_from(mode)?;
        self.run(Command::ResetPosition(mode))
    }

    fn buffer_set_orientation(&mut self, orientation: &Quaternion) -> RmsResult<Outcome> {
        self.run(Command::BufferSetOrientation(*orientation))
    }

    fn buffer_add(&mut self, target: &BufferTarget) -> RmsResult<Outcome> {
        self.run(Command::BufferAdd(*target))
    }

    fn buffer_set(&mut self, targets: &[BufferTarget]) -> RmsResult<()> {
        self.clear_buffer()?;
        for target in targets {
            self.buffer_add(target)?;
        }
        let actual = self.buffer_len()?;
        if actual != targets.len() {
            warn!(
                "Failed to add poses to remote buffer: sent {}, controller holds {}",
                targets.len(),
                actual
            );
            self.clear_buffer()?;
            return Err(RmsError::BufferConsistency {
                expected: targets.len(),
                actual,
            });
        }
        debug!("Successfully added {} poses to remote buffer", actual);
        Ok(())
    }

    fn clear_buffer(&mut self) -> RmsResult<()> {
        self.exchange(&Command::BufferClear)?;
        let remaining = self.buffer_len()?;
        if remaining != 0 {
            warn!("clear_buffer failed, buffer_len: {}", remaining);
            return Err(RmsError::BufferConsistency {
                expected: 0,
                actual: remaining,
            });
        }
        Ok(())
    }

    fn buffer_len(&mut self) -> RmsResult<usize> {
        let value = self.exchange(&Command::BufferLength)?.leading_numbers(1)?[0];
        if !(value >= 0.0) {
            return Err(RmsError::decode(format!("invalid buffer length {}", value)));
        }
        Ok(value as usize)
    }

    fn buffer_execute(&mut self, extrude: bool) -> RmsResult<Outcome> {
        self.run(Command::BufferExecute { extrude })
    }

    fn buffer_execute_circular(&mut self) -> RmsResult<Outcome> {
        self.run(Command::BufferExecuteCircular)
    }

    fn buffer_save(&mut self, slot: u32) -> RmsResult<Outcome> {
        self.run(Command::BufferSave(slot))
    }

    fn buffer_load(&mut self, slot: u32) -> RmsResult<Outcome> {
        self.run(Command::BufferLoad(slot))
    }

    fn buffer_read_value(&mut self, index: i32) -> RmsResult<Pose> {
        let values = self
            .exchange(&Command::BufferReadValue(index))?
            .leading_numbers(7)?;
        self.pose_in(&values)
    }

    fn buffer_offset(&mut self, offset: &Position) -> RmsResult<Outcome> {
        self.run(Command::BufferOffset(*offset))
    }

    fn buffer_modify_speed(&mut self, factor: f64) -> RmsResult<Outcome> {
        self.run(Command::BufferSpeedScale(factor))
    }

    fn close(&mut self) -> RmsResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let sent = self.post(&Command::Disconnect);
        let shut = self.connection.close();
        info!("Disconnected from robot");
        sent.and(shut)
    }
}

impl Drop for RobotClient {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing robot connection: {}", e);
        }
    }
}
