//! Configuration loading for rmslib

use std::fs::File;
use std::io::BufReader;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use rmsproto::{AngularUnit, Coordinates, LinearUnit, Pose, RmsError, RmsResult, UnitScale};

use crate::config::constants::{
    CONNECT_TIMEOUT, DEFAULT_ADDRESS, LOGGER_PORT, MOTION_PORT, SETTLE_DELAY,
};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Controller host name or IP address
    pub address: String,
    /// Motion server port
    pub motion_port: u16,
    /// Pose logger port
    pub logger_port: u16,
    /// Bound on the connect phase only
    pub connect_timeout_ms: u64,
    /// Delay between writing a request and reading its reply
    pub settle_delay_ms: u64,
    pub linear_unit: LinearUnit,
    pub angular_unit: AngularUnit,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            motion_port: MOTION_PORT,
            logger_port: LOGGER_PORT,
            connect_timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
            settle_delay_ms: SETTLE_DELAY.as_millis() as u64,
            linear_unit: LinearUnit::default(),
            angular_unit: AngularUnit::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn units(&self) -> UnitScale {
        UnitScale::from_units(self.linear_unit, self.angular_unit)
    }

    pub fn motion_addr(&self) -> RmsResult<SocketAddr> {
        resolve(&self.address, self.motion_port)
    }

    pub fn logger_addr(&self) -> RmsResult<SocketAddr> {
        resolve(&self.address, self.logger_port)
    }
}

fn resolve(address: &str, port: u16) -> RmsResult<SocketAddr> {
    (address, port)
        .to_socket_addrs()
        .map_err(|e| RmsError::Config(format!("Invalid address {}:{}: {}", address, port, e)))?
        .next()
        .ok_or_else(|| RmsError::Config(format!("No address found for {}:{}", address, port)))
}

/// Load client configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> RmsResult<ClientConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: ClientConfig = serde_json::from_reader(reader)?;
    Ok(config)
}

/// Load a tool pose from a JSON file holding either
/// `[[x, y, z], [q0, q1, q2, q3]]` or `[x, y, z, q0, q1, q2, q3]`
pub fn load_tool<P: AsRef<Path>>(path: P) -> RmsResult<Pose> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let coordinates: Coordinates = serde_json::from_reader(reader)?;
    Pose::normalize(&coordinates)
}

/// Configuration constants
pub mod constants {
    use std::time::Duration;

    pub const DEFAULT_ADDRESS: &str = "192.168.125.1";

    pub const MOTION_PORT: u16 = 5000;

    pub const LOGGER_PORT: u16 = 5001;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(2500);

    /// The controller needs this long between a request and reading the
    /// reply. Smaller values have not been verified.
    pub const SETTLE_DELAY: Duration = Duration::from_millis(80);

    /// Largest reply read in one go
    pub const RECV_BUFFER_SIZE: usize = 4096;
}
