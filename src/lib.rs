//! A library for talking to standalone temperature data loggers over a serial link.
//!
//! The loggers speak a fixed-layout binary protocol: every frame is a run of
//! bytes closed by an additive checksum, and every response has a size defined
//! by the command that asked for it. This crate provides:
//!
//! 1.  **Codec and field layouts**: [`frame`] builds and verifies frames,
//!     [`protocol`] translates wire fields into typed values ([`protocol::DeviceInfo`],
//!     [`protocol::DataHeader`], [`protocol::Sample`]) and back, and [`command`]
//!     holds the request template of every operation.
//!
//! 2.  **Command engine**: [`client::TempLogger`] runs the operations over any
//!     [`transport::Transport`], recovering from a silent link with the bounded
//!     flush-and-retry of [`retry::RetryPolicy`], and reassembles the recorded
//!     sample series from the device's data pages.
//!
//! 3.  **Shared client**: [`safe_client::SafeClient`] serializes calls from
//!     several threads onto one engine.
//!
//! ## Quick Start
//!
//! ```no_run
//! use templog_lib::{client::TempLogger, transport::SerialTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut logger = TempLogger::new(SerialTransport::open("/dev/ttyUSB0", 115_200)?);
//!
//!     let info = logger.read_device_info()?;
//!     println!("Logger {} records every {:?}", info.device_number, info.sample_interval);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod retry;
pub mod safe_client;
pub mod samples;
pub mod transport;

pub use error::{Error, Result};
