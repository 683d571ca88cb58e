//! # gonioview-base
//! Core library for gonioview.
//! Contains the angle units, the conversions between the coordinate spaces
//! used by the viewer (hemisphere angles, unit vectors, the disk layout and
//! the screen), the error type and the typed handles shared by all crates.

#![warn(missing_docs)]

pub mod error;
pub mod math;
pub mod units;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

pub use utils::{Asset, Handle};
