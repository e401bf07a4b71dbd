//! Bounded flush-and-retry around a single exchange with the device.
//!
//! The link loses bytes now and then and the device sometimes ignores a request
//! altogether. An exchange that comes back incomplete is repeated after the
//! transport buffers have been flushed, up to a fixed number of retries. Every
//! other failure is returned unchanged.

use crate::command::ResponseLength;
use crate::transport::Transport;
use log::warn;
use std::io;

/// Number of attempts after the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RETRIES)
    }
}

impl RetryPolicy {
    pub const DEFAULT_RETRIES: u32 = 1;

    pub const fn new(retries: u32) -> Self {
        Self { retries }
    }

    /// Never repeat an exchange.
    pub const fn none() -> Self {
        Self::new(0)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Total number of exchanges this policy allows.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Runs `exchange` until it yields a complete response or the budget is spent.
    ///
    /// Returns `Ok(None)` when no attempt produced a single byte. When the last
    /// attempt produced a partial response it is returned as is, for the caller
    /// to reject.
    pub fn run<T, F>(
        &self,
        transport: &mut T,
        expected: ResponseLength,
        mut exchange: F,
    ) -> io::Result<Option<Vec<u8>>>
    where
        T: Transport + ?Sized,
        F: FnMut(&mut T) -> io::Result<Vec<u8>>,
    {
        let attempts = self.attempts();
        let mut response = Vec::new();
        for attempt in 1..=attempts {
            response = exchange(transport)?;
            if expected.is_complete(&response) {
                return Ok(Some(response));
            }
            if attempt < attempts {
                warn!(
                    "Attempt {attempt}/{attempts} got {} of {} bytes, flushing and retrying",
                    response.len(),
                    expected.max_bytes()
                );
                transport.flush()?;
            }
        }
        Ok(if response.is_empty() {
            None
        } else {
            Some(response)
        })
    }
}
