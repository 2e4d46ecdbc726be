//! Utilities shared by the Tsunagi crates.

pub mod logger;
pub mod time;
