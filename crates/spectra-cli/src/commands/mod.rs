//! CLI command implementations.

pub mod common;
pub mod fft;
pub mod init;
pub mod nodes;
pub mod run;
pub mod status;
pub mod taps;
