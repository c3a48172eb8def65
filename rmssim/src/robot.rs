//! Simulated robot backend
//!
//! [`SimulatedRobot`] keeps the controller's state in memory and records a
//! [`MotionTrace`]. State is held in controller units (millimetres and
//! degrees) so that changing units behaves the same as on a real controller.
//!
//! Array lengths and zone keys are checked exactly as the real backend checks
//! them. Buffer operations additionally follow the buffer state machine: an
//! empty buffer cannot be executed, offset or rescaled.

use std::collections::BTreeMap;

use log::{debug, info};
use rmsproto::{
    fixed_values, BufferTarget, Outcome, Pose, Position, Quaternion, Refusal, ResetMode,
    RmsError, RmsResult, Robot, UnitScale, ZoneRequest, ZoneTolerance, DEFAULT_SPEED,
    EXTERNAL_AXES, IDENTITY_QUATERNION,
};

use crate::trace::MotionTrace;

/// Digital output line that drives the extruder
pub const EXTRUSION_LINE: u8 = 0;

/// In-memory stand-in for a robot controller
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    scale: UnitScale,
    position: Pose,
    joints: [f64; 6],
    external_axis: [f64; EXTERNAL_AXES],
    tool: Pose,
    workobject: Pose,
    speed: [f64; 4],
    zone: Option<ZoneTolerance>,
    outputs: BTreeMap<u8, bool>,
    group_output: i64,
    reset_mode: Option<ResetMode>,
    buffer: Vec<Pose>,
    buffer_orientation: Quaternion,
    speed_factor: f64,
    slots: BTreeMap<u32, Vec<Pose>>,
    trace: MotionTrace,
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self {
            scale: UnitScale::default(),
            position: Pose::IDENTITY,
            joints: [0.0; 6],
            external_axis: [0.0; EXTERNAL_AXES],
            tool: Pose::IDENTITY,
            workobject: Pose::IDENTITY,
            speed: DEFAULT_SPEED,
            zone: None,
            outputs: BTreeMap::new(),
            group_output: 0,
            reset_mode: None,
            buffer: Vec::new(),
            buffer_orientation: IDENTITY_QUATERNION,
            speed_factor: 1.0,
            slots: BTreeMap::new(),
            trace: MotionTrace::new(),
        }
    }
}

impl SimulatedRobot {
    pub fn new() -> Self {
        info!("Simulated robot created");
        Self::default()
    }

    pub fn trace(&self) -> &MotionTrace {
        &self.trace
    }

    /// Hand the recorded trace over, leaving a fresh one behind
    pub fn take_trace(&mut self) -> MotionTrace {
        std::mem::take(&mut self.trace)
    }

    pub fn output(&self, line: u8) -> bool {
        self.outputs.get(&line).copied().unwrap_or(false)
    }

    pub fn group_output(&self) -> i64 {
        self.group_output
    }

    /// Speed in controller units
    pub fn speed(&self) -> [f64; 4] {
        self.speed
    }

    pub fn zone(&self) -> Option<ZoneTolerance> {
        self.zone
    }

    pub fn workobject(&self) -> Pose {
        self.workobject
    }

    /// Product of every `buffer_modify_speed` factor applied so far
    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn reset_mode(&self) -> Option<ResetMode> {
        self.reset_mode
    }

    fn pose_out(&self, pose: &Pose) -> Pose {
        let mut pose = *pose;
        for axis in pose.position.iter_mut() {
            *axis = self.scale.length_out(*axis);
        }
        pose
    }

    fn pose_in(&self, pose: &Pose) -> Pose {
        let mut pose = *pose;
        for axis in pose.position.iter_mut() {
            *axis = self.scale.length_in(*axis);
        }
        pose
    }

    /// Move to a pose already in controller units
    fn travel(&mut self, pose: Pose) {
        self.position = pose;
        self.trace.record(pose);
    }

    fn switch_output(&mut self, line: u8, value: bool) {
        self.outputs.insert(line, value);
        if line == EXTRUSION_LINE {
            self.trace.set_extruding(value, self.group_output, self.position);
        }
    }

    fn populated(&self) -> Result<(), Refusal> {
        if self.buffer.is_empty() {
            Err(Refusal::EmptyBuffer)
        } else {
            Ok(())
        }
    }
}

impl Robot for SimulatedRobot {
    fn set_units(&mut self, scale: UnitScale) {
        self.scale = scale;
    }

    fn units(&self) -> UnitScale {
        self.scale
    }

    fn set_cartesian(&mut self, pose: &Pose, fine: bool) -> RmsResult<Outcome> {
        let pose = self.pose_out(pose);
        debug!("set_cartesian {:?} fine={}", pose, fine);
        self.travel(pose);
        Ok(Outcome::ok())
    }

    fn set_joints(&mut self, joints: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<6>("joints", joints) {
            Ok(joints) => {
                self.joints = joints.map(|j| self.scale.angle_out(j));
                Ok(Outcome::ok())
            }
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn get_cartesian(&mut self) -> RmsResult<Pose> {
        Ok(self.pose_in(&self.position))
    }

    fn get_joints(&mut self) -> RmsResult<[f64; 6]> {
        Ok(self.joints.map(|j| self.scale.angle_in(j)))
    }

    fn get_external_axis(&mut self) -> RmsResult<[f64; EXTERNAL_AXES]> {
        Ok(self.external_axis.map(|a| self.scale.angle_in(a)))
    }

    fn get_robot_info(&mut self) -> RmsResult<Vec<String>> {
        Ok(vec![
            "SIMULATED".to_string(),
            format!("rmssim {}", env!("CARGO_PKG_VERSION")),
            "offline".to_string(),
        ])
    }

    fn set_tool(&mut self, tool: &Pose) -> RmsResult<Outcome> {
        self.tool = *tool;
        Ok(Outcome::ok())
    }

    fn tool(&self) -> Pose {
        self.tool
    }

    fn set_workobject(&mut self, workobject: &Pose) -> RmsResult<Outcome> {
        self.workobject = self.pose_out(workobject);
        Ok(Outcome::ok())
    }

    fn set_speed(&mut self, speed: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<4>("speed", speed) {
            Ok([tcp_lin, tcp_ang, ext_lin, ext_ang]) => {
                self.speed = [
                    self.scale.length_out(tcp_lin),
                    self.scale.angle_out(tcp_ang),
                    self.scale.length_out(ext_lin),
                    self.scale.angle_out(ext_ang),
                ];
                Ok(Outcome::ok())
            }
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn set_zone(&mut self, zone: &ZoneRequest) -> RmsResult<Outcome> {
        match zone.resolve(&self.scale) {
            Ok(tolerance) => {
                self.zone = Some(tolerance);
                Ok(Outcome::ok())
            }
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn rotate_z(&mut self, angle: f64) -> RmsResult<Outcome> {
        debug!("rotate_z {}", self.scale.angle_out(angle));
        Ok(Outcome::ok())
    }

    fn check_j6(&mut self) -> RmsResult<Outcome> {
        Ok(Outcome::ok())
    }

    fn check_position(&mut self, _pose: &Pose) -> RmsResult<bool> {
        Ok(true)
    }

    fn set_dio(&mut self, value: bool, line: u8) -> RmsResult<Outcome> {
        self.switch_output(line, value);
        Ok(Outcome::ok())
    }

    fn set_go(&mut self, value: i64) -> RmsResult<Outcome> {
        self.group_output = value;
        Ok(Outcome::ok())
    }

    fn set_external_axis(&mut self, axes: &[f64]) -> RmsResult<Outcome> {
        match fixed_values::<2>("external axis", axes) {
            Ok(axes) => {
                for (stored, axis) in self.external_axis.iter_mut().zip(axes) {
                    *stored = self.scale.angle_out(axis);
                }
                Ok(Outcome::ok())
            }
            Err(refusal) => Ok(refusal.into()),
        }
    }

    fn move_circular(&mut self, via: &Pose, end: &Pose) -> RmsResult<Outcome> {
        let (via, end) = (self.pose_out(via), self.pose_out(end));
        self.travel(via);
        self.travel(end);
        Ok(Outcome::ok())
    }

    fn reset_position(&mut self, mode: i32) -> RmsResult<Outcome> {
        let mode = ResetMode::try_from(mode)?;
        info!("reset_position {:?}", mode);
        if !mode.extrusion_enabled() {
            self.switch_output(EXTRUSION_LINE, false);
        }
        if mode.returns_to_zero() {
            self.travel(Pose::IDENTITY);
        }
        self.reset_mode = Some(mode);
        Ok(Outcome::ok())
    }

    fn buffer_set_orientation(&mut self, orientation: &Quaternion) -> RmsResult<Outcome> {
        self.buffer_orientation = *orientation;
        Ok(Outcome::ok())
    }

    fn buffer_add(&mut self, target: &BufferTarget) -> RmsResult<Outcome> {
        let pose = match target {
            BufferTarget::Pose(pose) => self.pose_out(pose),
            BufferTarget::Position(position) => {
                self.pose_out(&Pose::new(*position, self.buffer_orientation))
            }
        };
        self.buffer.push(pose);
        Ok(Outcome::ok())
    }

    fn buffer_set(&mut self, targets: &[BufferTarget]) -> RmsResult<()> {
        self.clear_buffer()?;
        for target in targets {
            self.buffer_add(target)?;
        }
        let actual = self.buffer_len()?;
        if actual != targets.len() {
            self.clear_buffer()?;
            return Err(RmsError::BufferConsistency {
                expected: targets.len(),
                actual,
            });
        }
        debug!("Simulated buffer holds {} poses", actual);
        Ok(())
    }

    fn clear_buffer(&mut self) -> RmsResult<()> {
        self.buffer.clear();
        Ok(())
    }

    fn buffer_len(&mut self) -> RmsResult<usize> {
        Ok(self.buffer.len())
    }

    fn buffer_execute(&mut self, extrude: bool) -> RmsResult<Outcome> {
        if let Err(refusal) = self.populated() {
            return Ok(refusal.into());
        }
        let poses = self.buffer.clone();
        if extrude {
            self.travel(poses[0]);
            self.switch_output(EXTRUSION_LINE, true);
        }
        for pose in poses {
            self.travel(pose);
        }
        if extrude {
            self.switch_output(EXTRUSION_LINE, false);
        }
        Ok(Outcome::ok())
    }

    fn buffer_execute_circular(&mut self) -> RmsResult<Outcome> {
        if let [via, end] = self.buffer[..] {
            self.travel(via);
            self.travel(end);
            Ok(Outcome::ok())
        } else {
            Ok(Refusal::BufferLength {
                expected: 2,
                actual: self.buffer.len(),
            }
            .into())
        }
    }

    fn buffer_save(&mut self, slot: u32) -> RmsResult<Outcome> {
        self.slots.insert(slot, self.buffer.clone());
        Ok(Outcome::ok())
    }

    fn buffer_load(&mut self, slot: u32) -> RmsResult<Outcome> {
        match self.slots.get(&slot) {
            Some(poses) => {
                self.buffer = poses.clone();
                Ok(Outcome::ok())
            }
            None => Ok(Refusal::EmptySlot(slot).into()),
        }
    }

    fn buffer_read_value(&mut self, index: i32) -> RmsResult<Pose> {
        let len = self.buffer.len();
        let position = match index {
            -1 => len.checked_sub(1),
            i if i >= 1 && (i as usize) <= len => Some(i as usize - 1),
            _ => None,
        };
        position
            .map(|i| self.pose_in(&self.buffer[i]))
            .ok_or_else(|| {
                RmsError::InvalidArgument(format!(
                    "buffer index {} out of range for {} entries",
                    index, len
                ))
            })
    }

    fn buffer_offset(&mut self, offset: &Position) -> RmsResult<Outcome> {
        if let Err(refusal) = self.populated() {
            return Ok(refusal.into());
        }
        let offset = offset.map(|v| self.scale.length_out(v));
        for pose in self.buffer.iter_mut() {
            *pose = pose.translated(offset);
        }
        Ok(Outcome::ok())
    }

    fn buffer_modify_speed(&mut self, factor: f64) -> RmsResult<Outcome> {
        if let Err(refusal) = self.populated() {
            return Ok(refusal.into());
        }
        self.speed_factor *= factor;
        Ok(Outcome::ok())
    }

    fn close(&mut self) -> RmsResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmsproto::{AngularUnit, LinearUnit};

    fn at(x: f64, y: f64, z: f64) -> Pose {
        Pose::new([x, y, z], IDENTITY_QUATERNION)
    }

    fn targets(poses: &[Pose]) -> Vec<BufferTarget> {
        poses.iter().copied().map(BufferTarget::from).collect()
    }

    #[test]
    fn test_extrusion_scenario() {
        let mut robot = SimulatedRobot::new();
        robot.set_dio(true, EXTRUSION_LINE).unwrap();
        robot.set_cartesian(&at(10.0, 0.0, 0.0), false).unwrap();
        robot.set_dio(false, EXTRUSION_LINE).unwrap();

        let segments = robot.trace().segments();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].extruding);
        assert_eq!(segments[0].poses.last(), Some(&at(10.0, 0.0, 0.0)));
        assert!(!segments[1].extruding);
        assert_eq!(segments[1].poses, [at(10.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_other_lines_do_not_split_trace() {
        let mut robot = SimulatedRobot::new();
        robot.set_cartesian(&at(1.0, 0.0, 0.0), false).unwrap();
        robot.set_dio(true, 3).unwrap();
        assert!(robot.output(3));
        assert!(!robot.output(EXTRUSION_LINE));
        assert_eq!(robot.trace().segments().len(), 1);
    }

    #[test]
    fn test_get_returns_last_set() {
        let mut robot = SimulatedRobot::new();
        let pose = Pose::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0, 0.0]);
        robot.set_cartesian(&pose, true).unwrap();
        assert_eq!(robot.get_cartesian().unwrap(), pose);

        let joints = [0.0, 17.0, 8.0, 0.0, 65.0, 0.0];
        robot.set_joints(&joints).unwrap();
        assert_eq!(robot.get_joints().unwrap(), joints);
    }

    #[test]
    fn test_units_apply_to_stored_state() {
        let mut robot = SimulatedRobot::new();
        robot.set_units(UnitScale::from_units(LinearUnit::Meters, AngularUnit::Degrees));
        robot.set_cartesian(&at(0.5, 0.0, 0.0), false).unwrap();
        assert_eq!(robot.trace().segments()[0].poses, [at(500.0, 0.0, 0.0)]);
        assert_eq!(robot.get_cartesian().unwrap(), at(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_same_refusals_as_real_backend() {
        let mut robot = SimulatedRobot::new();
        assert!(robot.set_speed(&[1.0, 2.0, 3.0]).unwrap().is_refused());
        assert!(robot.set_joints(&[0.0; 5]).unwrap().is_refused());
        assert!(robot.set_external_axis(&[0.0]).unwrap().is_refused());
        assert_eq!(
            robot.set_zone(&ZoneRequest::preset("z3")).unwrap(),
            Outcome::Refused(Refusal::UnknownZone("z3".to_string()))
        );
        assert!(matches!(robot.reset_position(7), Err(RmsError::InvalidArgument(_))));
        assert_eq!(robot.speed(), DEFAULT_SPEED);
        assert_eq!(robot.zone(), None);
    }

    #[test]
    fn test_zone_and_speed_stored() {
        let mut robot = SimulatedRobot::new();
        robot.set_speed(&[50.0, 20.0, 20.0, 20.0]).unwrap();
        robot.set_zone(&ZoneRequest::preset("z5")).unwrap();
        assert_eq!(robot.speed(), [50.0, 20.0, 20.0, 20.0]);
        assert_eq!(robot.zone().unwrap().values, [5.0, 8.0, 0.8]);
    }

    #[test]
    fn test_external_axis_shape() {
        let mut robot = SimulatedRobot::new();
        assert_eq!(robot.get_external_axis().unwrap(), [0.0; EXTERNAL_AXES]);
        robot.set_external_axis(&[15.0, -30.0]).unwrap();
        let axes = robot.get_external_axis().unwrap();
        assert_eq!(axes.len(), EXTERNAL_AXES);
        assert_eq!(axes, [15.0, -30.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_speed_held_in_controller_units() {
        let mut robot = SimulatedRobot::new();
        robot.set_units(UnitScale::from_units(LinearUnit::Meters, AngularUnit::Degrees));
        robot.set_speed(&[0.1, 20.0, 0.05, 10.0]).unwrap();
        assert_eq!(robot.speed(), [100.0, 20.0, 50.0, 10.0]);
    }

    #[test]
    fn test_modify_speed_compounds() {
        let mut robot = SimulatedRobot::new();
        robot.buffer_add(&at(1.0, 0.0, 0.0).into()).unwrap();
        robot.buffer_modify_speed(0.5).unwrap();
        robot.buffer_modify_speed(0.5).unwrap();
        assert_eq!(robot.speed_factor(), 0.25);
        assert_eq!(robot.buffer_len().unwrap(), 1);
    }

    #[test]
    fn test_buffer_set_and_clear() {
        let mut robot = SimulatedRobot::new();
        robot.buffer_set_orientation(&[0.0, 0.0, 1.0, 0.0]).unwrap();
        let input = vec![
            BufferTarget::Pose(at(0.0, 0.0, 0.0)),
            BufferTarget::Position([1.0, 2.0, 3.0]),
        ];
        robot.buffer_set(&input).unwrap();
        assert_eq!(robot.buffer_len().unwrap(), 2);
        assert_eq!(
            robot.buffer_read_value(-1).unwrap(),
            Pose::new([1.0, 2.0, 3.0], [0.0, 0.0, 1.0, 0.0])
        );
        assert_eq!(robot.buffer_read_value(1).unwrap(), at(0.0, 0.0, 0.0));
        assert!(matches!(robot.buffer_read_value(3), Err(RmsError::InvalidArgument(_))));

        robot.clear_buffer().unwrap();
        assert_eq!(robot.buffer_len().unwrap(), 0);
        assert!(matches!(robot.buffer_read_value(-1), Err(RmsError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_buffer_refusals() {
        let mut robot = SimulatedRobot::new();
        assert_eq!(
            robot.buffer_execute(false).unwrap(),
            Outcome::Refused(Refusal::EmptyBuffer)
        );
        assert!(robot.buffer_offset(&[1.0, 0.0, 0.0]).unwrap().is_refused());
        assert!(robot.buffer_modify_speed(0.5).unwrap().is_refused());
        assert_eq!(robot.speed_factor(), 1.0);
        assert!(robot.trace().is_empty());
    }

    #[test]
    fn test_buffer_execute_is_repeatable() {
        let mut robot = SimulatedRobot::new();
        let poses = [at(0.0, 0.0, 0.0), at(10.0, 0.0, 0.0), at(10.0, 10.0, 0.0)];
        robot.buffer_set(&targets(&poses)).unwrap();
        robot.buffer_execute(false).unwrap();
        robot.buffer_execute(false).unwrap();
        assert_eq!(robot.trace().len(), 6);
        assert_eq!(robot.buffer_len().unwrap(), 3);
        assert_eq!(robot.get_cartesian().unwrap(), at(10.0, 10.0, 0.0));
    }

    #[test]
    fn test_buffer_execute_with_extrusion() {
        let mut robot = SimulatedRobot::new();
        robot.set_go(4).unwrap();
        let poses = [at(0.0, 0.0, 0.0), at(10.0, 0.0, 0.0)];
        robot.buffer_set(&targets(&poses)).unwrap();
        robot.buffer_execute(true).unwrap();

        let segments = robot.trace().segments();
        assert_eq!(segments.len(), 3);
        assert!(!segments[0].extruding);
        assert!(segments[1].extruding);
        assert_eq!(segments[1].group_output, 4);
        assert_eq!(segments[1].poses, [poses[0], poses[0], poses[1]]);
        assert!(!segments[2].extruding);
        assert!(!robot.output(EXTRUSION_LINE));
    }

    #[test]
    fn test_execute_circular_needs_two() {
        let mut robot = SimulatedRobot::new();
        robot.set_cartesian(&at(5.0, 5.0, 5.0), false).unwrap();
        robot.buffer_set(&targets(&[at(1.0, 0.0, 0.0)])).unwrap();
        assert_eq!(
            robot.buffer_execute_circular().unwrap(),
            Outcome::Refused(Refusal::BufferLength { expected: 2, actual: 1 })
        );
        assert_eq!(robot.trace().len(), 1);
        assert_eq!(robot.get_cartesian().unwrap(), at(5.0, 5.0, 5.0));

        robot.buffer_add(&at(2.0, 0.0, 0.0).into()).unwrap();
        assert!(robot.buffer_execute_circular().unwrap().is_ok());
        assert_eq!(robot.get_cartesian().unwrap(), at(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_save_and_load() {
        let mut robot = SimulatedRobot::new();
        let poses = [at(1.0, 0.0, 0.0), at(2.0, 0.0, 0.0)];
        robot.buffer_set(&targets(&poses)).unwrap();
        robot.buffer_save(1).unwrap();
        robot.clear_buffer().unwrap();

        assert_eq!(
            robot.buffer_load(2).unwrap(),
            Outcome::Refused(Refusal::EmptySlot(2))
        );
        assert!(robot.buffer_load(1).unwrap().is_ok());
        assert_eq!(robot.buffer_len().unwrap(), poses.len());
        for (index, pose) in poses.iter().enumerate() {
            assert_eq!(robot.buffer_read_value(index as i32 + 1).unwrap(), *pose);
        }

        robot.clear_buffer().unwrap();
        robot.buffer_load(1).unwrap();
        assert_eq!(robot.buffer_read_value(1).unwrap(), poses[0]);
    }

    #[test]
    fn test_offset_round_trip() {
        let mut robot = SimulatedRobot::new();
        let poses = [at(1.0, 2.0, 3.0), at(4.0, 5.0, 6.0)];
        robot.buffer_set(&targets(&poses)).unwrap();
        robot.buffer_offset(&[10.0, -20.0, 0.5]).unwrap();
        assert_eq!(robot.buffer_read_value(1).unwrap().position, [11.0, -18.0, 3.5]);
        robot.buffer_offset(&[-10.0, 20.0, -0.5]).unwrap();
        assert_eq!(robot.buffer_read_value(1).unwrap(), poses[0]);
        assert_eq!(robot.buffer_read_value(2).unwrap(), poses[1]);
    }

    #[test]
    fn test_move_circular_and_reset() {
        let mut robot = SimulatedRobot::new();
        robot.set_dio(true, EXTRUSION_LINE).unwrap();
        robot
            .move_circular(&at(5.0, 5.0, 0.0), &at(10.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(robot.get_cartesian().unwrap(), at(10.0, 0.0, 0.0));

        robot.reset_position(0).unwrap();
        assert!(!robot.output(EXTRUSION_LINE));
        assert_eq!(robot.get_cartesian().unwrap(), Pose::IDENTITY);
        assert_eq!(robot.reset_mode(), Some(ResetMode::DisableReset));

        robot.reset_position(2).unwrap();
        assert_eq!(robot.reset_mode(), Some(ResetMode::EnableHold));
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let mut first = SimulatedRobot::new();
        let mut second = SimulatedRobot::new();
        first.buffer_add(&at(1.0, 0.0, 0.0).into()).unwrap();
        first.set_cartesian(&at(1.0, 0.0, 0.0), false).unwrap();
        assert_eq!(second.buffer_len().unwrap(), 0);
        assert!(second.trace().is_empty());
    }
}
