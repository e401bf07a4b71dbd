//! Blocking command engine for a temperature logger.
//!
//! [`TempLogger`] owns the transport for the duration of a session, so only one
//! request is ever in flight. Each operation builds its frame from
//! [`crate::command::Request`], runs the write/read exchange under the
//! configured [`RetryPolicy`], then verifies and decodes the answer.
//!
//! # Example
//!
//! ```no_run
//! use templog_lib::{client::TempLogger, transport::SerialTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = SerialTransport::open("/dev/ttyUSB0", 115_200)?;
//!     let mut logger = TempLogger::new(transport);
//!
//!     let info = logger.read_device_info()?;
//!     println!("{info}");
//!
//!     for sample in logger.fetch_samples(info.station_number)? {
//!         println!("{sample}");
//!     }
//!     Ok(())
//! }
//! ```

use crate::command::Request;
use crate::error::{Error, Result};
use crate::frame;
use crate::protocol::{self as proto, DataHeader, DeviceInfo, DeviceParams};
use crate::retry::RetryPolicy;
use crate::transport::{Transport, DEFAULT_READ_TIMEOUT};
use chrono::NaiveDateTime;
use log::{debug, info};
use std::time::Duration;

/// Synchronous client for a temperature logger.
///
/// All methods block the calling thread until the device answers or the retry
/// budget is spent.
#[derive(Debug)]
pub struct TempLogger<T> {
    transport: T,
    retry: RetryPolicy,
    read_timeout: Duration,
}

impl<T: Transport> TempLogger<T> {
    /// Creates a client with the default retry policy and read timeout.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sets how long each read waits for the device.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Gives back the transport, ending the session.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Runs one request and returns the checksum-stripped response.
    fn transact(&mut self, request: &Request) -> Result<Vec<u8>> {
        let read_timeout = self.read_timeout;
        let expected = request.response();
        let response = self
            .retry
            .run(&mut self.transport, expected, |transport| {
                debug!("{} >> {:02x?}", request.name(), request.frame());
                transport.write(request.frame())?;
                let response = transport.read(expected.max_bytes(), read_timeout)?;
                debug!("{} << {:02x?}", request.name(), response);
                Ok(response)
            })?
            .ok_or(Error::NoResponse {
                attempts: self.retry.attempts(),
            })?;
        expected.check(&response)?;
        Ok(frame::decode_frame(&response)?.to_vec())
    }

    /// Reads the identity and configuration of the logger.
    ///
    /// # Errors
    ///
    /// * [`Error::NoResponse`] if the device stays silent.
    /// * [`Error::Protocol`] for a corrupted frame or an undefined field value.
    pub fn read_device_info(&mut self) -> Result<DeviceInfo> {
        let payload = self.transact(&Request::read_device_info())?;
        Ok(DeviceInfo::decode_from_payload(&payload)?)
    }

    /// Writes new operating parameters, optionally moving the logger to `new_station`.
    ///
    /// The logger discards its recorded samples when it accepts new parameters.
    pub fn write_device_params(
        &mut self,
        params: &DeviceParams,
        new_station: Option<u8>,
    ) -> Result<()> {
        self.transact(&Request::write_device_params(params, new_station)?)?;
        Ok(())
    }

    /// Clears the recorded samples while keeping the current configuration.
    pub fn clear_data(&mut self) -> Result<()> {
        let info = self.read_device_info()?;
        info!(
            "Clearing {} records on station {}",
            info.record_count, info.station_number
        );
        self.write_device_params(&DeviceParams::from(&info), None)
    }

    /// Sets the device number, truncated to 10 bytes.
    pub fn set_device_number(&mut self, station: u8, number: &str) -> Result<()> {
        self.transact(&Request::set_device_number(station, number)?)?;
        Ok(())
    }

    /// Sets the user information text, truncated to 100 bytes.
    pub fn set_user_info(&mut self, station: u8, user_info: &str) -> Result<()> {
        self.transact(&Request::set_user_info(station, user_info)?)?;
        Ok(())
    }

    /// Sets the clock of the logger.
    pub fn set_device_time(&mut self, station: u8, time: &NaiveDateTime) -> Result<()> {
        self.transact(&Request::set_device_time(station, time)?)?;
        Ok(())
    }

    /// Reads how many samples are stored and when recording started.
    pub fn read_data_header(&mut self, station: u8) -> Result<DataHeader> {
        let payload = self.transact(&Request::read_data_header(station))?;
        Ok(DataHeader::decode_from_payload(&payload)?)
    }

    /// Reads one page of stored temperatures.
    ///
    /// The number of values depends on how many bytes the device sends.
    pub fn read_data_page(&mut self, station: u8, page: u8) -> Result<Vec<f32>> {
        let payload = self.transact(&Request::read_data_page(station, page))?;
        Ok(proto::decode_page(&payload)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::protocol::tests::{device_info_payload, time};
    use crate::protocol::{Permission, WorkStatus};
    use crate::transport::scripted::ScriptedTransport;
    use assert_matches::assert_matches;

    pub(crate) fn device_info_frame() -> Vec<u8> {
        encode_frame(&device_info_payload(), &[])
    }

    pub(crate) fn ack_frame(station: u8) -> Vec<u8> {
        encode_frame(&[proto::STATION_COMMAND, station], &[])
    }

    pub(crate) fn logger(responses: Vec<Vec<u8>>) -> TempLogger<ScriptedTransport> {
        TempLogger::new(ScriptedTransport::new(responses))
    }

    #[test]
    fn reads_device_info() {
        let mut logger = logger(vec![device_info_frame()]);
        let info = logger.read_device_info().unwrap();
        assert_eq!(info.station_number, 1);
        assert_eq!(info.work_status, WorkStatus::Start);
        let transport = logger.into_inner();
        assert_eq!(
            transport.writes(),
            vec![&[0xCC, 0x00, 0x06, 0x00, 0xD2][..]]
        );
    }

    #[test]
    fn empty_first_read_is_recovered() {
        let mut logger = logger(vec![vec![], device_info_frame()]);
        assert!(logger.read_device_info().is_ok());
        let transport = logger.into_inner();
        assert_eq!(transport.flushes(), 1);
        assert_eq!(transport.writes().len(), 2);
    }

    #[test]
    fn silent_device_is_no_response() {
        let mut logger = logger(vec![]);
        let error = logger.read_device_info().unwrap_err();
        assert!(error.is_no_response());
        assert_matches!(error, Error::NoResponse { attempts: 2 });
        assert_eq!(logger.into_inner().flushes(), 1);
    }

    #[test]
    fn checksum_mismatch_is_not_retried() {
        let mut corrupted = device_info_frame();
        corrupted[40] ^= 0x01;
        let mut logger = logger(vec![corrupted, device_info_frame()]);
        assert_matches!(
            logger.read_device_info(),
            Err(Error::Protocol(proto::Error::ChecksumMismatch { .. }))
        );
        let transport = logger.into_inner();
        assert_eq!(transport.flushes(), 0);
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn truncated_frame_after_retries_is_a_length_error() {
        let frame = device_info_frame();
        let mut logger = logger(vec![frame[..10].to_vec(), frame[..80].to_vec()]);
        assert_matches!(
            logger.read_device_info(),
            Err(Error::Protocol(proto::Error::FrameLength {
                expected: 160,
                actual: 80
            }))
        );
    }

    #[test]
    fn undefined_code_is_fatal() {
        let mut payload = device_info_payload();
        payload[27] = 0x00;
        let mut logger = logger(vec![encode_frame(&payload, &[])]);
        assert_matches!(
            logger.read_device_info(),
            Err(Error::Protocol(proto::Error::UnknownWireCode { .. }))
        );
    }

    #[test]
    fn write_commands_expect_an_acknowledgement() {
        let mut logger = logger(vec![ack_frame(1), ack_frame(1), ack_frame(1)]);
        logger.set_device_number(1, "RC0042").unwrap();
        logger.set_user_info(1, "freezer").unwrap();
        logger
            .set_device_time(1, &time(2024, 3, 14, 9, 30, 5))
            .unwrap();
        let transport = logger.into_inner();
        let writes = transport.writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].len(), 15);
        assert_eq!(writes[1].len(), 105);
        assert_eq!(writes[2].len(), 11);
    }

    #[test]
    fn invalid_input_is_rejected_before_writing() {
        let mut logger = logger(vec![]);
        assert_matches!(
            logger.set_user_info(1, "nul\0byte"),
            Err(Error::Protocol(proto::Error::InvalidInput { .. }))
        );
        assert!(logger.into_inner().events.is_empty());
    }

    #[test]
    fn clear_data_writes_back_current_configuration() {
        let mut logger = logger(vec![device_info_frame(), ack_frame(1)]);
        logger.clear_data().unwrap();
        let transport = logger.into_inner();
        let writes = transport.writes();
        assert_eq!(writes.len(), 2);
        let info = DeviceInfo::decode_from_payload(&device_info_payload()).unwrap();
        assert_eq!(
            writes[1],
            Request::write_device_params(&DeviceParams::from(&info), None)
                .unwrap()
                .frame()
        );
    }

    #[test]
    fn write_device_params_can_move_station() {
        let info = DeviceInfo::decode_from_payload(&device_info_payload()).unwrap();
        let mut params = DeviceParams::from(&info);
        params.stop_button = Permission::Prohibit;
        let mut logger = logger(vec![ack_frame(1)]);
        logger.write_device_params(&params, Some(9)).unwrap();
        let transport = logger.into_inner();
        let frame = transport.writes()[0];
        assert_eq!(frame[1], 1);
        assert_eq!(frame[11], 9);
        assert_eq!(frame[12], 0x31);
    }

    #[test]
    fn reads_header_and_page() {
        let header = encode_frame(&[0x01, 0x00, 0x19, 0x07, 0xE8, 3, 1, 12, 0, 0], &[]);
        let page = encode_frame(&[0x02, 0x00, 0xDB, 0xFF, 0x90], &[]);
        let mut logger = logger(vec![header, page]);
        let header = logger.read_data_header(1).unwrap();
        assert_eq!(header.record_count, 25);
        assert_eq!(header.start_time, Some(time(2024, 3, 1, 12, 0, 0)));
        assert_eq!(logger.read_data_page(1, 0).unwrap(), vec![21.9, -11.2]);
    }

    #[test]
    fn retry_policy_is_configurable() {
        let mut logger = logger(vec![]).with_retry_policy(RetryPolicy::new(3));
        logger.set_timeout(Duration::from_millis(50));
        assert_eq!(logger.timeout(), Duration::from_millis(50));
        assert_matches!(
            logger.read_data_header(1),
            Err(Error::NoResponse { attempts: 4 })
        );
        assert_eq!(logger.into_inner().flushes(), 3);
    }
}
