//! Byte transport between the engine and the logger.
//!
//! The engine only needs three things from a link: write a frame, read with a
//! bounded wait, and discard whatever is buffered. [`SerialTransport`] provides
//! them on top of a serial port opened with the fixed line settings the logger
//! expects.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};
use std::time::Duration;

/// The parity used for serial communication.
pub const PARITY: &tokio_serial::Parity = &tokio_serial::Parity::None;
/// The number of stop bits used for serial communication.
pub const STOP_BITS: &tokio_serial::StopBits = &tokio_serial::StopBits::One;
/// The number of data bits used for serial communication.
pub const DATA_BITS: &tokio_serial::DataBits = &tokio_serial::DataBits::Eight;
/// Default wait for the first byte of a response.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// A duplex byte channel with bounded reads.
pub trait Transport {
    /// Writes all of `bytes`, returning the number written.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Reads up to `max_bytes`, returning early with fewer (possibly none) once
    /// `wait` passes without data.
    fn read(&mut self, max_bytes: usize, wait: Duration) -> io::Result<Vec<u8>>;

    /// Discards buffered input and output.
    fn flush(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize, wait: Duration) -> io::Result<Vec<u8>> {
        (**self).read(max_bytes, wait)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Creates a `tokio_serial::SerialPortBuilder` with the logger's line settings.
///
/// # Arguments
///
/// * `device` - The path to the serial port device (e.g., `/dev/ttyUSB0`).
/// * `baud_rate` - The baud rate for the serial communication.
pub fn serial_port_builder(device: &str, baud_rate: u32) -> tokio_serial::SerialPortBuilder {
    tokio_serial::new(device, baud_rate)
        .parity(*PARITY)
        .stop_bits(*STOP_BITS)
        .data_bits(*DATA_BITS)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(DEFAULT_READ_TIMEOUT)
}

/// Blocking serial link to a logger.
pub struct SerialTransport {
    path: String,
    port: Box<dyn tokio_serial::SerialPort>,
}

impl SerialTransport {
    /// Opens `path` and discards anything left in the port buffers.
    ///
    /// # Errors
    ///
    /// * [`Error::TransportUnavailable`] if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serial_port_builder(path, baud_rate)
            .open()
            .map_err(|source| Error::TransportUnavailable {
                path: path.to_string(),
                source,
            })?;
        let mut transport = Self {
            path: path.to_string(),
            port,
        };
        Transport::flush(&mut transport)?;
        log::debug!("Opened {path} at {baud_rate} baud");
        Ok(transport)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.port.write_all(bytes)?;
        Write::flush(&mut self.port)?;
        Ok(bytes.len())
    }

    fn read(&mut self, max_bytes: usize, wait: Duration) -> io::Result<Vec<u8>> {
        self.port.set_timeout(wait).map_err(io::Error::from)?;
        let mut buffer = vec![0u8; max_bytes];
        let mut filled = 0;
        while filled < max_bytes {
            match self.port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(err) if err.kind() == io::ErrorKind::TimedOut => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        buffer.truncate(filled);
        Ok(buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port
            .clear(tokio_serial::ClearBuffer::All)
            .map_err(io::Error::from)
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory transport replaying canned responses.
    use super::Transport;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Event {
        Write(Vec<u8>),
        Read(usize),
        Flush,
    }

    /// Answers each read with the next scripted response, or nothing once the
    /// script runs out.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        responses: VecDeque<Vec<u8>>,
        pub(crate) events: Vec<Event>,
    }

    impl ScriptedTransport {
        pub(crate) fn new<I: IntoIterator<Item = Vec<u8>>>(responses: I) -> Self {
            Self {
                responses: responses.into_iter().collect(),
                events: Vec::new(),
            }
        }

        pub(crate) fn writes(&self) -> Vec<&[u8]> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::Write(bytes) => Some(bytes.as_slice()),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn flushes(&self) -> usize {
            self.events
                .iter()
                .filter(|event| **event == Event::Flush)
                .count()
        }

        pub(crate) fn remaining(&self) -> usize {
            self.responses.len()
        }
    }

    impl Transport for ScriptedTransport {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.events.push(Event::Write(bytes.to_vec()));
            Ok(bytes.len())
        }

        fn read(&mut self, max_bytes: usize, _wait: Duration) -> io::Result<Vec<u8>> {
            self.events.push(Event::Read(max_bytes));
            let mut response = self.responses.pop_front().unwrap_or_default();
            response.truncate(max_bytes);
            Ok(response)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.events.push(Event::Flush);
            Ok(())
        }
    }
}
