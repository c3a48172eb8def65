//! Motion trace recorded by the simulator
//!
//! The trace is a list of segments. Each segment holds the poses visited
//! while the extrusion output kept one value. Switching the output starts a
//! new segment whose first pose is the position the switch happened at.

use rmsproto::Pose;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub extruding: bool,
    /// Group output active while extruding; travel segments carry 0
    pub group_output: i64,
    pub poses: Vec<Pose>,
}

impl Segment {
    fn new(extruding: bool, group_output: i64) -> Self {
        Self {
            extruding,
            group_output,
            poses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionTrace {
    segments: Vec<Segment>,
}

impl Default for MotionTrace {
    fn default() -> Self {
        Self {
            segments: vec![Segment::new(false, 0)],
        }
    }
}

impl MotionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn extruding(&self) -> bool {
        self.segments.last().map_or(false, |s| s.extruding)
    }

    /// Append a visited pose to the open segment
    pub fn record(&mut self, pose: Pose) {
        self.current_mut().poses.push(pose);
    }

    /// Switch the extrusion output. A change opens a new segment starting at
    /// `at`; an open segment with no poses is replaced instead of kept.
    pub fn set_extruding(&mut self, extruding: bool, group_output: i64, at: Pose) {
        if extruding == self.extruding() {
            return;
        }
        let mut segment = Segment::new(extruding, if extruding { group_output } else { 0 });
        segment.poses.push(at);
        if self.segments.last().map_or(true, |s| s.poses.is_empty()) {
            *self.current_mut() = segment;
        } else {
            self.segments.push(segment);
        }
    }

    /// Total number of recorded poses
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.poses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current_mut(&mut self) -> &mut Segment {
        if self.segments.is_empty() {
            self.segments.push(Segment::new(false, 0));
        }
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmsproto::IDENTITY_QUATERNION;

    fn at(x: f64) -> Pose {
        Pose::new([x, 0.0, 0.0], IDENTITY_QUATERNION)
    }

    #[test]
    fn test_new_trace() {
        let trace = MotionTrace::new();
        assert_eq!(trace.segments().len(), 1);
        assert!(!trace.extruding());
        assert!(trace.is_empty());
    }

    #[test]
    fn test_switch_replaces_empty_segment() {
        let mut trace = MotionTrace::new();
        trace.set_extruding(true, 3, at(0.0));
        assert_eq!(trace.segments().len(), 1);
        assert!(trace.segments()[0].extruding);
        assert_eq!(trace.segments()[0].group_output, 3);
        assert_eq!(trace.segments()[0].poses, [at(0.0)]);
    }

    #[test]
    fn test_switch_splits_segments() {
        let mut trace = MotionTrace::new();
        trace.record(at(1.0));
        trace.set_extruding(true, 2, at(1.0));
        trace.record(at(2.0));
        trace.set_extruding(true, 2, at(2.0));
        trace.set_extruding(false, 2, at(2.0));

        let segments = trace.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].poses, [at(1.0), at(2.0)]);
        assert!(!segments[2].extruding);
        assert_eq!(segments[2].group_output, 0);
        assert_eq!(trace.len(), 4);
    }

    #[test]
    fn test_trace_serializes() {
        let mut trace = MotionTrace::new();
        trace.record(at(5.0));
        let json = serde_json::to_string(&trace).unwrap();
        let back: MotionTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
        assert!(json.contains("\"extruding\":false"));
    }
}
