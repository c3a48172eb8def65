//! Connection management for the motion server
//!
//! The connect phase is bounded by a timeout so an unreachable controller
//! fails fast. Once connected the socket is fully blocking: a controller that
//! never replies hangs the caller rather than producing a timeout error.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use log::info;
use rmsproto::{RmsError, RmsResult};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::constants::RECV_BUFFER_SIZE;

/// Request/response channel to the controller
pub trait Connection: Send {
    /// Write a complete request
    fn send(&mut self, message: &str) -> RmsResult<()>;

    /// Block until a reply arrives
    fn receive(&mut self) -> RmsResult<String>;

    /// Shut the channel down
    fn close(&mut self) -> RmsResult<()>;
}

/// Open a blocking TCP stream, bounding only the connect phase
pub(crate) fn open_stream(remote: SocketAddr, timeout: Duration) -> RmsResult<TcpStream> {
    let socket = Socket::new(Domain::for_address(remote), Type::STREAM, Some(Protocol::TCP))?;
    socket
        .connect_timeout(&remote.into(), timeout)
        .map_err(|e| RmsError::Connection(format!("{}: {}", remote, e)))?;
    socket.set_nodelay(true)?;

    let stream: TcpStream = socket.into();
    stream.set_read_timeout(None)?;
    stream.set_write_timeout(None)?;
    Ok(stream)
}

/// TCP connection to the motion server
pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
    recv_buffer: Vec<u8>,
}

impl TcpConnection {
    /// Connect, waiting at most `timeout` for the controller to accept
    pub fn connect(remote: SocketAddr, timeout: Duration) -> RmsResult<Self> {
        info!("Attempting to connect to robot motion server at {}", remote);
        let stream = open_stream(remote, timeout)?;
        info!("Connected to robot motion server at {}", remote);

        Ok(Self {
            stream,
            peer: remote,
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    fn send(&mut self, message: &str) -> RmsResult<()> {
        self.stream.write_all(message.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> RmsResult<String> {
        let size = self.stream.read(&mut self.recv_buffer)?;
        if size == 0 {
            return Err(RmsError::Connection(format!(
                "{} closed the connection",
                self.peer
            )));
        }
        Ok(String::from_utf8_lossy(&self.recv_buffer[..size]).into_owned())
    }

    fn close(&mut self) -> RmsResult<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(RmsError::Io(e)),
        }
    }
}
