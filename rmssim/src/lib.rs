//! RMS offline simulator (rmssim)
//!
//! A [`rmsproto::Robot`] backend that needs no controller. Every motion is
//! recorded in a [`MotionTrace`] so a path can be checked before it is run
//! on hardware.

pub mod robot;
pub mod trace;

pub use robot::*;
pub use trace::*;
