//! RMS shared library (rmsproto)
//!
//! Definitions shared by the real client (rmslib) and the offline simulator
//! (rmssim): the pose model, units, zones, the command catalog, the wire codec
//! and the [`Robot`] capability trait both backends implement.

pub mod types;
pub mod zone;
pub mod commands;
pub mod codec;
pub mod robot;
pub mod error;

pub use types::*;
pub use zone::*;
pub use commands::*;
pub use codec::{decode, encode, Field, Reply};
pub use robot::*;
pub use error::*;
