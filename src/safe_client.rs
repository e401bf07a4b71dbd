//! Shareable, thread-safe handle to a [`TempLogger`].
//!
//! The protocol has no request identifiers, so concurrent callers must never
//! interleave their exchanges. `SafeClient` serializes every call through one
//! mutex around the engine and can be cloned freely between threads.
//!
//! ## Example
//!
//! ```no_run
//! use templog_lib::{safe_client::SafeClient, transport::SerialTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SafeClient::from_transport(SerialTransport::open("/dev/ttyUSB0", 115_200)?);
//!
//!     let worker = {
//!         let client = client.clone();
//!         std::thread::spawn(move || client.read_device_info())
//!     };
//!     let header = client.read_data_header(1)?;
//!     println!("{header}");
//!     println!("{}", worker.join().expect("worker thread panicked")?);
//!     Ok(())
//! }
//! ```

use crate::client::TempLogger;
use crate::error::Result;
use crate::protocol::{DataHeader, DeviceInfo, DeviceParams, Sample};
use crate::transport::Transport;
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutex-guarded [`TempLogger`] that can be shared across threads.
#[derive(Debug)]
pub struct SafeClient<T> {
    logger: Arc<Mutex<TempLogger<T>>>,
}

impl<T> Clone for SafeClient<T> {
    fn clone(&self) -> Self {
        Self {
            logger: self.logger.clone(),
        }
    }
}

impl<T: Transport> SafeClient<T> {
    /// Creates a new `SafeClient` owning the given engine.
    pub fn new(logger: TempLogger<T>) -> Self {
        Self {
            logger: Arc::new(Mutex::new(logger)),
        }
    }

    /// Creates a new `SafeClient` with a default engine around `transport`.
    pub fn from_transport(transport: T) -> Self {
        Self::new(TempLogger::new(transport))
    }

    /// Creates a new `SafeClient` from a shared engine.
    pub fn from_shared(logger: Arc<Mutex<TempLogger<T>>>) -> Self {
        Self { logger }
    }

    /// Clones the shared engine.
    pub fn clone_shared(&self) -> Arc<Mutex<TempLogger<T>>> {
        self.logger.clone()
    }

    // A panic in another caller leaves the engine itself consistent, the next
    // exchange starts from a fresh write.
    fn lock(&self) -> MutexGuard<'_, TempLogger<T>> {
        self.logger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the identity and configuration of the logger.
    pub fn read_device_info(&self) -> Result<DeviceInfo> {
        self.lock().read_device_info()
    }

    /// Writes new operating parameters.
    pub fn write_device_params(
        &self,
        params: &DeviceParams,
        new_station: Option<u8>,
    ) -> Result<()> {
        self.lock().write_device_params(params, new_station)
    }

    /// Clears the recorded samples while keeping the current configuration.
    pub fn clear_data(&self) -> Result<()> {
        self.lock().clear_data()
    }

    /// Sets the device number.
    pub fn set_device_number(&self, station: u8, number: &str) -> Result<()> {
        self.lock().set_device_number(station, number)
    }

    /// Sets the user information text.
    pub fn set_user_info(&self, station: u8, user_info: &str) -> Result<()> {
        self.lock().set_user_info(station, user_info)
    }

    /// Sets the clock of the logger.
    pub fn set_device_time(&self, station: u8, time: &NaiveDateTime) -> Result<()> {
        self.lock().set_device_time(station, time)
    }

    /// Reads the data header of `station`.
    pub fn read_data_header(&self, station: u8) -> Result<DataHeader> {
        self.lock().read_data_header(station)
    }

    /// Reads one page of stored temperatures.
    pub fn read_data_page(&self, station: u8, page: u8) -> Result<Vec<f32>> {
        self.lock().read_data_page(station, page)
    }

    /// Downloads every stored sample, holding the lock for the whole download.
    pub fn fetch_samples(&self, station: u8) -> Result<Vec<Sample>> {
        self.lock().fetch_samples(station)
    }
}
