//! Miscellaneous helpers shared by the gonioview crates.

mod asset;
pub mod handle;

pub use asset::Asset;
pub use handle::Handle;

/// Returns the current time as an ISO 8601 (RFC 3339) timestamp.
pub fn iso_timestamp() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
}
