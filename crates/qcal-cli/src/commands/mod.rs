//! CLI command implementations.

pub mod common;
pub mod rb;
pub mod sequence;
pub mod sweep;
pub mod version;
