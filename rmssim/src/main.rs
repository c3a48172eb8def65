//! RMS offline simulator (rmssim)
//!
//! Replays a pose file through the simulated buffer and prints the motion
//! trace as JSON.
//!
//! Usage: `rmssim <poses.json> [--extrude]`
//!
//! The pose file is a JSON list of coordinates, each either
//! `[[x, y, z], [q0, q1, q2, q3]]` or `[x, y, z, q0, q1, q2, q3]`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process;

use log::{error, info};
use rmsproto::{BufferTarget, Coordinates, Pose, RmsError, RmsResult, Robot};
use rmssim::{MotionTrace, SimulatedRobot};

fn load_poses(path: &Path) -> RmsResult<Vec<Pose>> {
    let reader = BufReader::new(File::open(path)?);
    let coordinates: Vec<Coordinates> = serde_json::from_reader(reader)?;
    coordinates.iter().map(Pose::normalize).collect()
}

fn replay(poses: &[Pose], extrude: bool) -> RmsResult<MotionTrace> {
    let mut robot = SimulatedRobot::new();
    let targets: Vec<BufferTarget> = poses.iter().copied().map(BufferTarget::from).collect();
    robot.buffer_set(&targets)?;
    let outcome = robot.buffer_execute(extrude)?;
    if let Some(refusal) = outcome.refusal() {
        return Err(RmsError::InvalidArgument(refusal.to_string()));
    }
    robot.close()?;
    Ok(robot.take_trace())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let extrude = args.iter().any(|a| a == "--extrude");
    let path = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => path.clone(),
        None => {
            eprintln!("Usage: rmssim <poses.json> [--extrude]");
            process::exit(1);
        }
    };

    let poses = match load_poses(Path::new(&path)) {
        Ok(poses) => poses,
        Err(e) => {
            error!("Failed to load {}: {}", path, e);
            eprintln!("Failed to load {}: {}", path, e);
            process::exit(1);
        }
    };
    info!("Replaying {} poses from {}", poses.len(), path);

    let trace = match replay(&poses, extrude) {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            process::exit(1);
        }
    };
    info!(
        "Trace has {} segments, {} poses",
        trace.segments().len(),
        trace.len()
    );

    match serde_json::to_string_pretty(&trace) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize trace: {}", e);
            process::exit(1);
        }
    }
}
