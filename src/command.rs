//! Request frame templates.
//!
//! Each [`Request`] carries the complete frame to write and the shape of the
//! response the device answers with, so the engine can size its reads and
//! decide when a read is incomplete.

use crate::frame::encode_frame;
use crate::protocol::{self as proto, DataHeader, DeviceInfo, DeviceParams, Error};
use chrono::NaiveDateTime;

/// Upper bound for a single data page response.
pub const MAX_PAGE_RESPONSE_LEN: usize = 4096;

/// Expected size of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLength {
    /// Exactly this many bytes, checksum included.
    Exact(usize),
    /// Whatever arrives, bounded by this many bytes.
    UpTo(usize),
}

impl ResponseLength {
    /// Largest number of bytes to read for this response.
    pub fn max_bytes(&self) -> usize {
        match *self {
            ResponseLength::Exact(len) | ResponseLength::UpTo(len) => len,
        }
    }

    /// Whether `response` is all the device is going to send.
    pub fn is_complete(&self, response: &[u8]) -> bool {
        match *self {
            ResponseLength::Exact(len) => response.len() >= len,
            ResponseLength::UpTo(_) => !response.is_empty(),
        }
    }

    /// Checks the size of a non-empty response.
    pub fn check(&self, response: &[u8]) -> Result<(), Error> {
        match *self {
            ResponseLength::Exact(len) if response.len() != len => Err(Error::FrameLength {
                expected: len,
                actual: response.len(),
            }),
            _ => Ok(()),
        }
    }
}

/// A request frame together with the response it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    name: &'static str,
    frame: Vec<u8>,
    response: ResponseLength,
}

impl Request {
    fn new(name: &'static str, frame: Vec<u8>, response: ResponseLength) -> Self {
        Self {
            name,
            frame,
            response,
        }
    }

    /// Name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Complete frame, checksum included.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn response(&self) -> ResponseLength {
        self.response
    }

    pub fn read_device_info() -> Self {
        Self::new(
            "read device info",
            encode_frame(
                &[proto::INFO_COMMAND, 0x00, proto::READ_DEVICE_INFO_CODE, 0x00],
                &[],
            ),
            ResponseLength::Exact(DeviceInfo::RESPONSE_LEN),
        )
    }

    /// Writes the configuration in `params` to `params.station_number`,
    /// optionally moving the device to `new_station`.
    ///
    /// Also resets the recorded data on the device.
    pub fn write_device_params(
        params: &DeviceParams,
        new_station: Option<u8>,
    ) -> Result<Self, Error> {
        let [hours, minutes, seconds] = proto::split_interval(params.sample_interval)?;
        let [upper_hi, upper_lo] =
            proto::encode_decidegrees("upper limit", params.upper_limit)?.to_be_bytes();
        let [lower_hi, lower_lo] =
            proto::encode_decidegrees("lower limit", params.lower_limit)?.to_be_bytes();
        let payload = [
            hours,
            minutes,
            seconds,
            upper_hi,
            upper_lo,
            lower_hi,
            lower_lo,
            new_station.unwrap_or(params.station_number),
            params.stop_button.encode(),
            params.delay_time.encode(),
            params.tone_set.encode(),
            params.alarm,
            params.temperature_unit.encode(),
            proto::encode_calibration(params.temperature_calibration)?,
            0x00,
            0x00,
            0x00,
        ];
        Ok(Self::new(
            "write device params",
            encode_frame(
                &station_command(params.station_number, proto::WRITE_DEVICE_PARAMS_CODE),
                &payload,
            ),
            ResponseLength::Exact(proto::ACK_LEN),
        ))
    }

    pub fn set_device_number(station: u8, number: &str) -> Result<Self, Error> {
        let payload = proto::encode_text("device number", number, proto::DEVICE_NUMBER_LEN)?;
        Ok(Self::new(
            "set device number",
            encode_frame(&station_command(station, proto::SET_DEVICE_NUMBER_CODE), &payload),
            ResponseLength::Exact(proto::ACK_LEN),
        ))
    }

    pub fn set_user_info(station: u8, info: &str) -> Result<Self, Error> {
        let payload = proto::encode_text("user info", info, proto::USER_INFO_LEN)?;
        Ok(Self::new(
            "set user info",
            encode_frame(&station_command(station, proto::SET_USER_INFO_CODE), &payload),
            ResponseLength::Exact(proto::ACK_LEN),
        ))
    }

    pub fn set_device_time(station: u8, time: &NaiveDateTime) -> Result<Self, Error> {
        // no trailing zero byte on this command
        let command = [proto::STATION_COMMAND, station, proto::SET_DEVICE_TIME_CODE];
        Ok(Self::new(
            "set device time",
            encode_frame(&command, &proto::encode_date_time(time)?),
            ResponseLength::Exact(proto::ACK_LEN),
        ))
    }

    pub fn read_data_header(station: u8) -> Self {
        Self::new(
            "read data header",
            encode_frame(&station_command(station, proto::READ_DATA_HEADER_CODE), &[]),
            ResponseLength::Exact(DataHeader::RESPONSE_LEN),
        )
    }

    pub fn read_data_page(station: u8, page: u8) -> Self {
        Self::new(
            "read data page",
            encode_frame(
                &[proto::STATION_COMMAND, station, proto::READ_DATA_PAGE_CODE, page],
                &[],
            ),
            ResponseLength::UpTo(MAX_PAGE_RESPONSE_LEN),
        )
    }
}

fn station_command(station: u8, code: u8) -> [u8; 4] {
    [proto::STATION_COMMAND, station, code, 0x00]
}
