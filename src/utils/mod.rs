//! Utility modules for resscan

pub mod command;
pub mod timing;

pub use timing::{format_duration, ScopedTimer, Timer};
