//! The robot capability set
//!
//! Both backends implement [`Robot`]: `rmslib::RobotClient` talks to a real
//! controller, `rmssim::SimulatedRobot` keeps the same state locally. Callers
//! should depend on the trait, not on either backend.
//!
//! Every call is synchronous. Methods take `&mut self` because the protocol
//! is half-duplex request/response: one caller per connection at a time.
//!
//! # Failure model
//! Inputs that can be checked locally (array lengths, zone keys, buffer state
//! in the simulator) produce `Ok(Outcome::Refused(..))` and nothing is sent.
//! Transport and decode failures are `Err`. Nothing is retried.

use crate::error::RmsResult;
use crate::types::{
    BufferTarget, Outcome, Pose, Position, Quaternion, UnitScale,
};
use crate::zone::ZoneRequest;

/// Speed used until `set_speed` is called
pub const DEFAULT_SPEED: [f64; 4] = [100.0, 50.0, 50.0, 50.0];

/// External axis readings returned by `get_external_axis`
pub const EXTERNAL_AXES: usize = 6;

pub trait Robot {
    /// Select caller units for every following length and angle
    fn set_units(&mut self, scale: UnitScale);

    fn units(&self) -> UnitScale;

    /// Linear move to `pose`; `fine` stops exactly at the target
    fn set_cartesian(&mut self, pose: &Pose, fine: bool) -> RmsResult<Outcome>;

    /// Joint move; needs exactly six angles
    fn set_joints(&mut self, joints: &[f64]) -> RmsResult<Outcome>;

    fn get_cartesian(&mut self) -> RmsResult<Pose>;

    fn get_joints(&mut self) -> RmsResult<[f64; 6]>;

    /// Every external axis reading; only the first two are driven by
    /// `set_external_axis`
    fn get_external_axis(&mut self) -> RmsResult<[f64; EXTERNAL_AXES]>;

    /// Controller identification strings (serial, software, model)
    fn get_robot_info(&mut self) -> RmsResult<Vec<String>>;

    /// Set the tool centre point; the tool is cached on success
    fn set_tool(&mut self, tool: &Pose) -> RmsResult<Outcome>;

    /// Last tool set through this handle. No round trip: changes made to the
    /// controller by anyone else are not seen.
    fn tool(&self) -> Pose;

    fn set_workobject(&mut self, workobject: &Pose) -> RmsResult<Outcome>;

    /// `[tcp linear, tcp angular, external linear, external angular]`
    fn set_speed(&mut self, speed: &[f64]) -> RmsResult<Outcome>;

    fn set_zone(&mut self, zone: &ZoneRequest) -> RmsResult<Outcome>;

    /// Rotate the tool about its local Z axis
    fn rotate_z(&mut self, angle: f64) -> RmsResult<Outcome>;

    /// Correct joint 6 wind-up
    fn check_j6(&mut self) -> RmsResult<Outcome>;

    /// Ask the controller whether `pose` is reachable
    fn check_position(&mut self, pose: &Pose) -> RmsResult<bool>;

    /// Digital output. The controller program decides which physical line
    /// the wire command drives; `line` selects the simulator's output.
    fn set_dio(&mut self, value: bool, line: u8) -> RmsResult<Outcome>;

    /// Group output; not range checked
    fn set_go(&mut self, value: i64) -> RmsResult<Outcome>;

    /// External axis move; needs exactly two values
    fn set_external_axis(&mut self, axes: &[f64]) -> RmsResult<Outcome>;

    /// Circular move through `via` to `end`. The second leg is only sent if
    /// the controller accepted the first.
    fn move_circular(&mut self, via: &Pose, end: &Pose) -> RmsResult<Outcome>;

    /// Reset signals and optionally return to zero; `mode` is -1, 0, 1 or 2
    fn reset_position(&mut self, mode: i32) -> RmsResult<Outcome>;

    /// Orientation for position-only buffer entries
    fn buffer_set_orientation(&mut self, orientation: &Quaternion) -> RmsResult<Outcome>;

    fn buffer_add(&mut self, target: &BufferTarget) -> RmsResult<Outcome>;

    /// Replace the buffer with `targets`. If the resulting length does not
    /// match, the buffer is cleared and `BufferConsistency` is returned.
    fn buffer_set(&mut self, targets: &[BufferTarget]) -> RmsResult<()>;

    /// Empty the buffer; a non-zero length afterwards is `BufferConsistency`
    fn clear_buffer(&mut self) -> RmsResult<()>;

    fn buffer_len(&mut self) -> RmsResult<usize>;

    /// Linear moves through every buffered pose. With `extrude` the digital
    /// output is held high for the batch.
    fn buffer_execute(&mut self, extrude: bool) -> RmsResult<Outcome>;

    /// Circular move through a buffer of exactly two poses
    fn buffer_execute_circular(&mut self) -> RmsResult<Outcome>;

    /// Archive the buffer into a numbered slot
    fn buffer_save(&mut self, slot: u32) -> RmsResult<Outcome>;

    /// Replace the buffer with a slot's contents
    fn buffer_load(&mut self, slot: u32) -> RmsResult<Outcome>;

    /// Buffer entry by 1-based index; -1 is the last entry
    fn buffer_read_value(&mut self, index: i32) -> RmsResult<Pose>;

    /// Translate every buffered position
    fn buffer_offset(&mut self, offset: &Position) -> RmsResult<Outcome>;

    /// Scale the TCP speed used when the buffer executes
    fn buffer_modify_speed(&mut self, factor: f64) -> RmsResult<Outcome>;

    /// Release the backend. Safe to call more than once.
    fn close(&mut self) -> RmsResult<()>;
}
