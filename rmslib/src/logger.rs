//! Pose logger stream
//!
//! The controller's logger port streams one record per line:
//! `<stamp> <kind> <values...>`. Kind 0 carries a cartesian pose
//! (x y z q0 q1 q2 q3), kind 1 carries joint angles. Records are kept in
//! bounded ring buffers; the oldest entries are dropped first.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use log::{debug, info};
use rmsproto::{Pose, RmsError, RmsResult, UnitScale};

use crate::connection::open_stream;

const KIND_CARTESIAN: i64 = 0;
const KIND_JOINTS: i64 = 1;

/// One parsed logger record
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Cartesian(Pose),
    Joints(Vec<f64>),
    /// Any other kind, kept raw
    Other(i64, Vec<f64>),
}

/// Parse one logger line
pub fn parse_record(line: &str, scale: &UnitScale) -> RmsResult<LogRecord> {
    let values = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| RmsError::decode(format!("non-numeric logger token '{}'", token)))
        })
        .collect::<RmsResult<Vec<f64>>>()?;
    if values.len() < 2 {
        return Err(RmsError::decode(format!("short logger record '{}'", line.trim())));
    }
    let kind = values[1] as i64;
    let payload = &values[2..];
    match kind {
        KIND_CARTESIAN => {
            let mut pose = Pose::from_flat(payload.get(..7).unwrap_or(payload))?;
            for axis in pose.position.iter_mut() {
                *axis = scale.length_in(*axis);
            }
            Ok(LogRecord::Cartesian(pose))
        }
        KIND_JOINTS => Ok(LogRecord::Joints(
            payload.iter().map(|v| scale.angle_in(*v)).collect(),
        )),
        other => Ok(LogRecord::Other(other, payload.to_vec())),
    }
}

/// Reader for the controller's logger port
pub struct PoseLogger {
    reader: BufReader<TcpStream>,
    scale: UnitScale,
    capacity: Option<usize>,
    poses: VecDeque<Pose>,
    joints: VecDeque<Vec<f64>>,
}

impl PoseLogger {
    /// Connect to the logger port. `capacity` bounds each history;
    /// `None` keeps everything.
    pub fn connect(
        remote: SocketAddr,
        timeout: Duration,
        scale: UnitScale,
        capacity: Option<usize>,
    ) -> RmsResult<Self> {
        let stream = open_stream(remote, timeout)?;
        info!("Connected to robot logger at {}", remote);
        Ok(Self::from_stream(stream, scale, capacity))
    }

    pub fn from_stream(stream: TcpStream, scale: UnitScale, capacity: Option<usize>) -> Self {
        Self {
            reader: BufReader::new(stream),
            scale,
            capacity,
            poses: VecDeque::new(),
            joints: VecDeque::new(),
        }
    }

    /// Block for the next record and store it. Returns `None` once the
    /// controller closes the stream.
    pub fn next_record(&mut self) -> RmsResult<Option<LogRecord>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        let record = parse_record(&line, &self.scale)?;
        debug!("logger record: {:?}", record);
        match &record {
            LogRecord::Cartesian(pose) => push_bounded(&mut self.poses, *pose, self.capacity),
            LogRecord::Joints(joints) => {
                push_bounded(&mut self.joints, joints.clone(), self.capacity)
            }
            LogRecord::Other(..) => {}
        }
        Ok(Some(record))
    }

    pub fn poses(&self) -> &VecDeque<Pose> {
        &self.poses
    }

    pub fn joints(&self) -> &VecDeque<Vec<f64>> {
        &self.joints
    }

    pub fn latest_pose(&self) -> Option<&Pose> {
        self.poses.back()
    }

    pub fn close(&mut self) -> RmsResult<()> {
        self.reader.get_ref().shutdown(Shutdown::Both)?;
        Ok(())
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: Option<usize>) {
    if let Some(capacity) = capacity {
        if capacity == 0 {
            return;
        }
        while queue.len() >= capacity {
            queue.pop_front();
        }
    }
    queue.push_back(item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_parse_cartesian() {
        let record = parse_record("1.5 0 100 200 300 1 0 0 0", &UnitScale::default()).unwrap();
        assert_eq!(
            record,
            LogRecord::Cartesian(Pose::new([100.0, 200.0, 300.0], [1.0, 0.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn test_parse_joints_and_errors() {
        let record = parse_record("2 1 10 20 30 40 50 60", &UnitScale::default()).unwrap();
        assert_eq!(record, LogRecord::Joints(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]));

        assert!(matches!(
            parse_record("2 0 1 2", &UnitScale::default()),
            Err(RmsError::MalformedCoordinate(_))
        ));
        assert!(matches!(
            parse_record("2 zero 1", &UnitScale::default()),
            Err(RmsError::ProtocolDecode(_))
        ));
    }

    #[test]
    fn test_bounded_history() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for x in 0..5 {
                writeln!(stream, "0 0 {} 0 0 1 0 0 0", x).unwrap();
            }
            writeln!(stream, "0 1 1 2 3 4 5 6").unwrap();
        });

        let mut logger =
            PoseLogger::connect(addr, Duration::from_secs(1), UnitScale::default(), Some(2))
                .unwrap();
        let mut count = 0;
        while logger.next_record().unwrap().is_some() {
            count += 1;
        }
        server.join().unwrap();

        assert_eq!(count, 6);
        assert_eq!(logger.poses().len(), 2);
        assert_eq!(logger.latest_pose().unwrap().position, [4.0, 0.0, 0.0]);
        assert_eq!(logger.joints().len(), 1);
    }
}
