//! RMS client library (rmslib)
//!
//! This library drives a robot controller running the motion server over
//! TCP. [`RobotClient`] implements the [`rmsproto::Robot`] capability set.

pub mod client;
pub mod config;
pub mod connection;
pub mod logger;

pub use client::*;
pub use config::*;
pub use connection::*;
pub use logger::*;
pub use rmsproto::*;
