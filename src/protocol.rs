//! Field layouts of the logger's binary protocol.
//!
//! This module translates between the scalar encodings found on the wire and the
//! strongly-typed values used by the rest of the crate: enumerations, scaled
//! fixed-point temperatures, packed date-times with their null sentinel, and the
//! delay-time lookup table. It also decodes the positional payloads of the
//! device-info, data-header and data-page responses.
//!
//! Every function here is pure. Undefined wire codes are rejected with
//! [`Error::UnknownWireCode`], values that cannot be encoded with
//! [`Error::InvalidInput`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Errors raised while encoding or decoding protocol fields and frames.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The trailing checksum byte does not match the sum of the preceding bytes.
    #[error("Checksum mismatch: frame carries {actual:#04x}, computed {expected:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// An enumerated field holds a code outside its defined set.
    #[error("Unknown wire code {code:#04x} for {field}")]
    UnknownWireCode { field: &'static str, code: u8 },

    /// A caller supplied value is outside the encodable domain of its field.
    #[error("Invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: String },

    /// A response does not have the size its command defines.
    #[error("Unexpected frame length: expected {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    /// A date-time field that is not the null sentinel but names no valid date.
    #[error("Invalid date-time field {0:02x?}")]
    InvalidDateTime([u8; DATE_TIME_LEN]),
}

impl Error {
    fn invalid(field: &'static str, value: impl fmt::Display) -> Self {
        Error::InvalidInput {
            field,
            value: value.to_string(),
        }
    }
}

/// Factory default serial speed of the logger.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Leading byte of every command addressed to a station.
pub const STATION_COMMAND: u8 = 0x33;
/// Leading byte of the device-info query, which is not station addressed.
pub const INFO_COMMAND: u8 = 0xCC;

pub const READ_DEVICE_INFO_CODE: u8 = 0x06;
pub const WRITE_DEVICE_PARAMS_CODE: u8 = 0x05;
pub const SET_DEVICE_NUMBER_CODE: u8 = 0x0B;
pub const SET_USER_INFO_CODE: u8 = 0x09;
pub const SET_DEVICE_TIME_CODE: u8 = 0x07;
pub const READ_DATA_HEADER_CODE: u8 = 0x01;
pub const READ_DATA_PAGE_CODE: u8 = 0x02;

/// Length of an acknowledgement frame, checksum included.
pub const ACK_LEN: usize = 3;

/// Width of the free-text user information field.
pub const USER_INFO_LEN: usize = 100;
/// Width of the device number field.
pub const DEVICE_NUMBER_LEN: usize = 10;

/// Width of a packed date-time field: big-endian year followed by five bytes.
pub const DATE_TIME_LEN: usize = 7;
/// Wire pattern of a date-time field that holds no timestamp.
pub const NULL_DATE_TIME: [u8; DATE_TIME_LEN] = [0xFF; DATE_TIME_LEN];

/// Recording state of the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum WorkStatus {
    NotStarted,
    Start,
    Stop,
    /// Reported by the device itself; distinct from an undefined code.
    Unknown,
}

impl WorkStatus {
    pub fn decode(code: u8) -> Result<Self, Error> {
        match code {
            0 => Ok(WorkStatus::NotStarted),
            1 => Ok(WorkStatus::Start),
            2 => Ok(WorkStatus::Stop),
            3 => Ok(WorkStatus::Unknown),
            _ => Err(Error::UnknownWireCode {
                field: "work status",
                code,
            }),
        }
    }

    pub fn encode(&self) -> u8 {
        match self {
            WorkStatus::NotStarted => 0,
            WorkStatus::Start => 1,
            WorkStatus::Stop => 2,
            WorkStatus::Unknown => 3,
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WorkStatus::NotStarted => "not started",
            WorkStatus::Start => "started",
            WorkStatus::Stop => "stopped",
            WorkStatus::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Whether a front-panel action (stop button, tone setting) is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Permission {
    Permit,
    Prohibit,
}

impl Permission {
    pub fn decode(code: u8) -> Result<Self, Error> {
        match code {
            0x13 => Ok(Permission::Permit),
            0x31 => Ok(Permission::Prohibit),
            _ => Err(Error::UnknownWireCode {
                field: "permission",
                code,
            }),
        }
    }

    pub fn encode(&self) -> u8 {
        match self {
            Permission::Permit => 0x13,
            Permission::Prohibit => 0x31,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Permit => f.write_str("permit"),
            Permission::Prohibit => f.write_str("prohibit"),
        }
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permit" | "yes" | "on" => Ok(Permission::Permit),
            "prohibit" | "no" | "off" => Ok(Permission::Prohibit),
            _ => Err(Error::invalid("permission", s)),
        }
    }
}

/// Display unit configured on the logger.
///
/// Shares its wire codes with [`Permission`], the two are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TemperatureUnit {
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    pub fn decode(code: u8) -> Result<Self, Error> {
        match code {
            0x13 => Ok(TemperatureUnit::Fahrenheit),
            0x31 => Ok(TemperatureUnit::Celsius),
            _ => Err(Error::UnknownWireCode {
                field: "temperature unit",
                code,
            }),
        }
    }

    pub fn encode(&self) -> u8 {
        match self {
            TemperatureUnit::Fahrenheit => 0x13,
            TemperatureUnit::Celsius => 0x31,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Fahrenheit => f.write_str("°F"),
            TemperatureUnit::Celsius => f.write_str("°C"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(Error::invalid("temperature unit", s)),
        }
    }
}

/// Delay between pressing start and the first recorded sample.
///
/// The device only knows these six settings and the mapping to wire codes is not linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u32", try_from = "u32"))]
pub enum DelayTime {
    #[default]
    None,
    Minutes30,
    Minutes60,
    Minutes90,
    Minutes120,
    Minutes150,
}

impl DelayTime {
    pub fn decode(code: u8) -> Result<Self, Error> {
        match code {
            0x00 => Ok(DelayTime::None),
            0x01 => Ok(DelayTime::Minutes30),
            0x10 => Ok(DelayTime::Minutes60),
            0x11 => Ok(DelayTime::Minutes90),
            0x20 => Ok(DelayTime::Minutes120),
            0x21 => Ok(DelayTime::Minutes150),
            _ => Err(Error::UnknownWireCode {
                field: "delay time",
                code,
            }),
        }
    }

    pub fn encode(&self) -> u8 {
        match self {
            DelayTime::None => 0x00,
            DelayTime::Minutes30 => 0x01,
            DelayTime::Minutes60 => 0x10,
            DelayTime::Minutes90 => 0x11,
            DelayTime::Minutes120 => 0x20,
            DelayTime::Minutes150 => 0x21,
        }
    }

    pub fn as_secs(&self) -> u32 {
        match self {
            DelayTime::None => 0,
            DelayTime::Minutes30 => 1800,
            DelayTime::Minutes60 => 3600,
            DelayTime::Minutes90 => 5400,
            DelayTime::Minutes120 => 7200,
            DelayTime::Minutes150 => 9000,
        }
    }

    pub fn from_secs(secs: u32) -> Result<Self, Error> {
        match secs {
            0 => Ok(DelayTime::None),
            1800 => Ok(DelayTime::Minutes30),
            3600 => Ok(DelayTime::Minutes60),
            5400 => Ok(DelayTime::Minutes90),
            7200 => Ok(DelayTime::Minutes120),
            9000 => Ok(DelayTime::Minutes150),
            _ => Err(Error::invalid("delay time", format!("{secs}s"))),
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs() as u64)
    }
}

impl From<DelayTime> for u32 {
    fn from(delay: DelayTime) -> u32 {
        delay.as_secs()
    }
}

impl TryFrom<u32> for DelayTime {
    type Error = Error;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl TryFrom<Duration> for DelayTime {
    type Error = Error;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.subsec_nanos() != 0 {
            return Err(Error::invalid("delay time", format!("{value:?}")));
        }
        let secs = u32::try_from(value.as_secs())
            .map_err(|_| Error::invalid("delay time", format!("{value:?}")))?;
        Self::from_secs(secs)
    }
}

impl fmt::Display for DelayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.as_secs() / 60)
    }
}

/// Decodes a packed date-time field, `None` when it holds the null sentinel.
pub fn decode_date_time(bytes: &[u8; DATE_TIME_LEN]) -> Result<Option<NaiveDateTime>, Error> {
    if *bytes == NULL_DATE_TIME {
        return Ok(None);
    }
    let year = u16::from_be_bytes([bytes[0], bytes[1]]);
    NaiveDate::from_ymd_opt(year as i32, bytes[2] as u32, bytes[3] as u32)
        .and_then(|date| date.and_hms_opt(bytes[4] as u32, bytes[5] as u32, bytes[6] as u32))
        .map(Some)
        .ok_or(Error::InvalidDateTime(*bytes))
}

/// Packs a date-time as big-endian year, month, day, hour, minute and second.
pub fn encode_date_time(time: &NaiveDateTime) -> Result<[u8; DATE_TIME_LEN], Error> {
    let year = u16::try_from(time.year()).map_err(|_| Error::invalid("date-time", time))?;
    let [year_hi, year_lo] = year.to_be_bytes();
    Ok([
        year_hi,
        year_lo,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    ])
}

/// Converts a tenth-of-a-degree wire value to degrees.
pub fn decode_decidegrees(raw: i16) -> f32 {
    raw as f32 / 10.0
}

/// Converts degrees to a signed tenth-of-a-degree wire value, truncating.
pub fn encode_decidegrees(field: &'static str, value: f32) -> Result<i16, Error> {
    let raw = (value * 10.0).trunc();
    if (i16::MIN as f32..=i16::MAX as f32).contains(&raw) {
        Ok(raw as i16)
    } else {
        Err(Error::invalid(field, value))
    }
}

/// Converts the unsigned calibration byte to degrees.
pub fn decode_calibration(raw: u8) -> f32 {
    raw as f32 / 10.0
}

/// Converts a calibration offset to its unsigned tenth-of-a-degree byte, truncating.
pub fn encode_calibration(value: f32) -> Result<u8, Error> {
    let raw = (value * 10.0).trunc();
    if (u8::MIN as f32..=u8::MAX as f32).contains(&raw) {
        Ok(raw as u8)
    } else {
        Err(Error::invalid("temperature calibration", value))
    }
}

/// Joins the hour/minute/second triple of the sample interval.
pub fn combine_interval(hours: u8, minutes: u8, seconds: u8) -> Duration {
    Duration::from_secs(hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64)
}

/// Splits a sample interval into the hour/minute/second triple sent to the device.
///
/// Sub-second parts are dropped.
pub fn split_interval(interval: Duration) -> Result<[u8; 3], Error> {
    let secs = interval.as_secs();
    let hours =
        u8::try_from(secs / 3600).map_err(|_| Error::invalid("sample interval", format!("{interval:?}")))?;
    Ok([hours, ((secs % 3600) / 60) as u8, (secs % 60) as u8])
}

/// Decodes a fixed-width text field, dropping trailing padding.
pub fn decode_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0x00 && *b != b' ')
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encodes text into a zero-padded field of `width` bytes.
///
/// Longer text is cut at the last character boundary that fits.
pub fn encode_text(field: &'static str, text: &str, width: usize) -> Result<Vec<u8>, Error> {
    if text.contains('\0') {
        return Err(Error::invalid(field, text.escape_debug()));
    }
    let mut end = text.len().min(width);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut bytes = text.as_bytes()[..end].to_vec();
    bytes.resize(width, 0x00);
    Ok(bytes)
}

fn field<const N: usize>(payload: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&payload[offset..offset + N]);
    out
}

fn check_payload_len(payload: &[u8], expected: usize) -> Result<(), Error> {
    if payload.len() == expected {
        Ok(())
    } else {
        Err(Error::FrameLength {
            expected,
            actual: payload.len(),
        })
    }
}

mod device_info_offset {
    pub const STATION: usize = 1;
    pub const MODEL: usize = 3;
    pub const INTERVAL: usize = 5;
    pub const UPPER_LIMIT: usize = 8;
    pub const LOWER_LIMIT: usize = 10;
    pub const LAST_ONLINE: usize = 12;
    pub const WORK_STATUS: usize = 19;
    pub const START_TIME: usize = 20;
    pub const STOP_BUTTON: usize = 27;
    pub const RECORD_COUNT: usize = 29;
    pub const CURRENT_TIME: usize = 31;
    pub const USER_INFO: usize = 38;
    pub const DEVICE_NUMBER: usize = 138;
    pub const DELAY_TIME: usize = 148;
    pub const TONE_SET: usize = 149;
    pub const ALARM: usize = 150;
    pub const TEMPERATURE_UNIT: usize = 151;
    pub const CALIBRATION: usize = 152;
}

/// Identity and configuration snapshot of a logger.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    pub station_number: u8,
    pub model_number: u8,
    #[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
    pub sample_interval: Duration,
    /// Upper alarm limit in degrees.
    pub upper_limit: f32,
    /// Lower alarm limit in degrees.
    pub lower_limit: f32,
    pub last_online: Option<NaiveDateTime>,
    pub work_status: WorkStatus,
    pub start_time: Option<NaiveDateTime>,
    pub stop_button: Permission,
    pub record_count: u16,
    pub current_time: Option<NaiveDateTime>,
    pub user_info: String,
    pub device_number: String,
    pub delay_time: DelayTime,
    pub tone_set: Permission,
    /// Raw alarm setting byte, passed through unchanged.
    pub alarm: u8,
    pub temperature_unit: TemperatureUnit,
    /// Calibration offset in degrees.
    pub temperature_calibration: f32,
}

impl DeviceInfo {
    /// Size of the response frame, checksum included.
    pub const RESPONSE_LEN: usize = 160;
    /// Size of the payload once the checksum is stripped.
    pub const PAYLOAD_LEN: usize = Self::RESPONSE_LEN - 1;

    /// Decodes the checksum-stripped payload of a device-info response.
    pub fn decode_from_payload(payload: &[u8]) -> Result<Self, Error> {
        use device_info_offset as at;
        check_payload_len(payload, Self::PAYLOAD_LEN)?;
        let [hours, minutes, seconds] = field::<3>(payload, at::INTERVAL);
        Ok(Self {
            station_number: payload[at::STATION],
            model_number: payload[at::MODEL],
            sample_interval: combine_interval(hours, minutes, seconds),
            upper_limit: decode_decidegrees(i16::from_be_bytes(field(payload, at::UPPER_LIMIT))),
            lower_limit: decode_decidegrees(i16::from_be_bytes(field(payload, at::LOWER_LIMIT))),
            last_online: decode_date_time(&field(payload, at::LAST_ONLINE))?,
            work_status: WorkStatus::decode(payload[at::WORK_STATUS])?,
            start_time: decode_date_time(&field(payload, at::START_TIME))?,
            stop_button: Permission::decode(payload[at::STOP_BUTTON])?,
            record_count: u16::from_be_bytes(field(payload, at::RECORD_COUNT)),
            current_time: decode_date_time(&field(payload, at::CURRENT_TIME))?,
            user_info: decode_text(&payload[at::USER_INFO..at::USER_INFO + USER_INFO_LEN]),
            device_number: decode_text(
                &payload[at::DEVICE_NUMBER..at::DEVICE_NUMBER + DEVICE_NUMBER_LEN],
            ),
            delay_time: DelayTime::decode(payload[at::DELAY_TIME])?,
            tone_set: Permission::decode(payload[at::TONE_SET])?,
            alarm: payload[at::ALARM],
            temperature_unit: TemperatureUnit::decode(payload[at::TEMPERATURE_UNIT])?,
            temperature_calibration: decode_calibration(payload[at::CALIBRATION]),
        })
    }
}

struct OptionalTime<'a>(&'a Option<NaiveDateTime>);

impl fmt::Display for OptionalTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(time) => write!(f, "{time}"),
            None => f.write_str("-"),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Station number:   {}", self.station_number)?;
        writeln!(f, "Model number:     {}", self.model_number)?;
        writeln!(f, "Device number:    {}", self.device_number)?;
        writeln!(f, "User info:        {}", self.user_info)?;
        writeln!(f, "Work status:      {}", self.work_status)?;
        writeln!(f, "Sample interval:  {}s", self.sample_interval.as_secs())?;
        writeln!(f, "Record count:     {}", self.record_count)?;
        writeln!(f, "Start time:       {}", OptionalTime(&self.start_time))?;
        writeln!(f, "Current time:     {}", OptionalTime(&self.current_time))?;
        writeln!(f, "Last online:      {}", OptionalTime(&self.last_online))?;
        writeln!(f, "Upper limit:      {:.1}", self.upper_limit)?;
        writeln!(f, "Lower limit:      {:.1}", self.lower_limit)?;
        writeln!(f, "Calibration:      {:.1}", self.temperature_calibration)?;
        writeln!(f, "Temperature unit: {}", self.temperature_unit)?;
        writeln!(f, "Delay time:       {}", self.delay_time)?;
        writeln!(f, "Stop button:      {}", self.stop_button)?;
        writeln!(f, "Tone set:         {}", self.tone_set)?;
        write!(f, "Alarm:            {:#04x}", self.alarm)
    }
}

/// Writable subset of [`DeviceInfo`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceParams {
    /// Station the write is addressed to.
    pub station_number: u8,
    #[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
    pub sample_interval: Duration,
    pub upper_limit: f32,
    pub lower_limit: f32,
    pub stop_button: Permission,
    pub delay_time: DelayTime,
    pub tone_set: Permission,
    pub alarm: u8,
    pub temperature_unit: TemperatureUnit,
    pub temperature_calibration: f32,
}

impl From<&DeviceInfo> for DeviceParams {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            station_number: info.station_number,
            sample_interval: info.sample_interval,
            upper_limit: info.upper_limit,
            lower_limit: info.lower_limit,
            stop_button: info.stop_button,
            delay_time: info.delay_time,
            tone_set: info.tone_set,
            alarm: info.alarm,
            temperature_unit: info.temperature_unit,
            temperature_calibration: info.temperature_calibration,
        }
    }
}

/// Summary of the samples stored for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataHeader {
    pub station_number: u8,
    pub record_count: u16,
    pub start_time: Option<NaiveDateTime>,
}

impl DataHeader {
    pub const RESPONSE_LEN: usize = 11;
    pub const PAYLOAD_LEN: usize = Self::RESPONSE_LEN - 1;

    pub fn decode_from_payload(payload: &[u8]) -> Result<Self, Error> {
        check_payload_len(payload, Self::PAYLOAD_LEN)?;
        Ok(Self {
            station_number: payload[0],
            record_count: u16::from_be_bytes(field(payload, 1)),
            start_time: decode_date_time(&field(payload, 3))?,
        })
    }
}

impl fmt::Display for DataHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "station {}: {} records since {}",
            self.station_number,
            self.record_count,
            OptionalTime(&self.start_time)
        )
    }
}

/// Decodes the temperatures of a data page payload (header byte followed by
/// big-endian tenth-of-a-degree values).
pub fn decode_page(payload: &[u8]) -> Result<Vec<f32>, Error> {
    let body = payload.get(1..).ok_or(Error::FrameLength {
        expected: 1,
        actual: 0,
    })?;
    let values = body.chunks_exact(2);
    if !values.remainder().is_empty() {
        return Err(Error::FrameLength {
            expected: payload.len() + 1,
            actual: payload.len(),
        });
    }
    Ok(values
        .map(|pair| decode_decidegrees(i16::from_be_bytes([pair[0], pair[1]])))
        .collect())
}

/// One recorded temperature and the time it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub time: NaiveDateTime,
    pub temperature: f32,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:.1}", self.time, self.temperature)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;

    pub(crate) fn time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid test date")
    }

    /// Payload of a device-info response as a real logger sends it.
    pub(crate) fn device_info_payload() -> Vec<u8> {
        let mut payload = vec![0u8; DeviceInfo::PAYLOAD_LEN];
        payload[1] = 0x01; // station
        payload[3] = 0x05; // model
        payload[5..8].copy_from_slice(&[0, 15, 0]);
        payload[8..10].copy_from_slice(&600i16.to_be_bytes());
        payload[10..12].copy_from_slice(&(-300i16).to_be_bytes());
        payload[12..19].copy_from_slice(&[0x07, 0xE8, 3, 14, 9, 30, 0]);
        payload[19] = 1;
        payload[20..27].copy_from_slice(&[0x07, 0xE8, 3, 1, 12, 0, 0]);
        payload[27] = 0x13;
        payload[29..31].copy_from_slice(&25u16.to_be_bytes());
        payload[31..38].copy_from_slice(&NULL_DATE_TIME);
        payload[38..38 + 9].copy_from_slice(b"cold room");
        payload[138..138 + 6].copy_from_slice(b"RC0042");
        payload[148] = 0x10;
        payload[149] = 0x31;
        payload[150] = 0x02;
        payload[151] = 0x31;
        payload[152] = 0xC8;
        payload
    }

    #[test]
    fn work_status_codes() {
        assert_eq!(WorkStatus::decode(0), Ok(WorkStatus::NotStarted));
        assert_eq!(WorkStatus::decode(3), Ok(WorkStatus::Unknown));
        for status in [
            WorkStatus::NotStarted,
            WorkStatus::Start,
            WorkStatus::Stop,
            WorkStatus::Unknown,
        ] {
            assert_eq!(WorkStatus::decode(status.encode()), Ok(status));
        }
        assert_matches!(
            WorkStatus::decode(4),
            Err(Error::UnknownWireCode { code: 4, .. })
        );
    }

    #[test]
    fn permission_and_unit_share_codes_but_not_domains() {
        assert_eq!(Permission::decode(0x13), Ok(Permission::Permit));
        assert_eq!(Permission::decode(0x31), Ok(Permission::Prohibit));
        assert_eq!(TemperatureUnit::decode(0x13), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!(TemperatureUnit::decode(0x31), Ok(TemperatureUnit::Celsius));
        assert_eq!(Permission::Prohibit.encode(), 0x31);
        assert_eq!(TemperatureUnit::Fahrenheit.encode(), 0x13);
        assert_matches!(
            Permission::decode(0x00),
            Err(Error::UnknownWireCode { field: "permission", .. })
        );
        assert_matches!(
            TemperatureUnit::decode(0x43),
            Err(Error::UnknownWireCode { field: "temperature unit", .. })
        );
    }

    #[test]
    fn parse_from_str() {
        assert_eq!("permit".parse(), Ok(Permission::Permit));
        assert_eq!("Prohibit".parse(), Ok(Permission::Prohibit));
        assert_eq!("C".parse(), Ok(TemperatureUnit::Celsius));
        assert_eq!("fahrenheit".parse(), Ok(TemperatureUnit::Fahrenheit));
        assert_matches!("K".parse::<TemperatureUnit>(), Err(Error::InvalidInput { .. }));
    }

    #[test]
    fn delay_time_table_is_a_bijection() {
        let table = [
            (0, 0x00),
            (1800, 0x01),
            (3600, 0x10),
            (5400, 0x11),
            (7200, 0x20),
            (9000, 0x21),
        ];
        for (secs, code) in table {
            let delay = DelayTime::from_secs(secs).unwrap();
            assert_eq!(delay.encode(), code);
            assert_eq!(DelayTime::decode(code), Ok(delay));
            assert_eq!(delay.as_secs(), secs);
        }
        assert_matches!(DelayTime::decode(0x02), Err(Error::UnknownWireCode { .. }));
        assert_matches!(DelayTime::decode(0x30), Err(Error::UnknownWireCode { .. }));
        assert_matches!(DelayTime::from_secs(60), Err(Error::InvalidInput { .. }));
        assert_matches!(
            DelayTime::try_from(Duration::from_millis(1800_500)),
            Err(Error::InvalidInput { .. })
        );
        assert_eq!(
            DelayTime::try_from(Duration::from_secs(5400)),
            Ok(DelayTime::Minutes90)
        );
    }

    #[test]
    fn date_time_sentinel_is_absent() {
        assert_eq!(decode_date_time(&NULL_DATE_TIME), Ok(None));
        // only the full pattern is the sentinel
        assert_matches!(
            decode_date_time(&[0xFF, 0xFF, 12, 31, 23, 59, 59]),
            Ok(Some(_))
        );
        assert_matches!(
            decode_date_time(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]),
            Err(Error::InvalidDateTime(_))
        );
    }

    #[test]
    fn date_time_packing() {
        let t = time(2024, 3, 14, 9, 30, 5);
        let packed = encode_date_time(&t).unwrap();
        assert_eq!(packed, [0x07, 0xE8, 3, 14, 9, 30, 5]);
        assert_eq!(decode_date_time(&packed), Ok(Some(t)));
        assert_matches!(
            decode_date_time(&[0x07, 0xE8, 13, 1, 0, 0, 0]),
            Err(Error::InvalidDateTime(_))
        );
        assert_matches!(
            encode_date_time(&time(-1, 1, 1, 0, 0, 0)),
            Err(Error::InvalidInput { .. })
        );
    }

    #[test]
    fn decidegrees() {
        assert_eq!(decode_decidegrees(219), 21.9);
        assert_eq!(encode_decidegrees("limit", 21.9), Ok(219));

        assert_eq!(decode_decidegrees(-112), -11.2);
        assert_eq!(encode_decidegrees("limit", -11.2), Ok(-112));

        assert_eq!(decode_decidegrees(-30), -3.0);
        assert_eq!(encode_decidegrees("limit", -3.0), Ok(-30));

        // truncation, not rounding
        assert_eq!(encode_decidegrees("limit", 10.07), Ok(100));

        assert_eq!(decode_decidegrees(i16::MAX), 3276.7);
        assert_eq!(encode_decidegrees("limit", 3276.7), Ok(i16::MAX));
        assert_eq!(encode_decidegrees("limit", -3276.8), Ok(i16::MIN));
        assert_matches!(
            encode_decidegrees("limit", 3276.9),
            Err(Error::InvalidInput { field: "limit", .. })
        );
        assert_matches!(
            encode_decidegrees("limit", f32::NAN),
            Err(Error::InvalidInput { .. })
        );
    }

    #[test]
    fn calibration() {
        assert_eq!(decode_calibration(0xC8), 20.0);
        assert_eq!(encode_calibration(20.0), Ok(200));
        assert_eq!(encode_calibration(0.0), Ok(0));
        assert_eq!(encode_calibration(25.5), Ok(255));
        assert_matches!(encode_calibration(25.6), Err(Error::InvalidInput { .. }));
        assert_matches!(encode_calibration(-0.5), Err(Error::InvalidInput { .. }));
    }

    #[test]
    fn interval_split() {
        assert_eq!(combine_interval(1, 2, 3), Duration::from_secs(3723));
        assert_eq!(split_interval(Duration::from_secs(3723)), Ok([1, 2, 3]));
        assert_eq!(split_interval(Duration::from_millis(59_900)), Ok([0, 0, 59]));
        assert_eq!(
            split_interval(Duration::from_secs(255 * 3600 + 59 * 60 + 59)),
            Ok([255, 59, 59])
        );
        assert_matches!(
            split_interval(Duration::from_secs(256 * 3600)),
            Err(Error::InvalidInput { .. })
        );
    }

    #[test]
    fn text_fields() {
        assert_eq!(
            encode_text("device number", "RC0042", 10),
            Ok(b"RC0042\0\0\0\0".to_vec())
        );
        assert_eq!(
            encode_text("device number", "ABCDEFGHIJKLMN", 10),
            Ok(b"ABCDEFGHIJ".to_vec())
        );
        // never splits a multi-byte character
        assert_eq!(
            encode_text("device number", "123456789é", 10),
            Ok(b"123456789\0".to_vec())
        );
        assert_matches!(
            encode_text("user info", "a\0b", 100),
            Err(Error::InvalidInput { field: "user info", .. })
        );
        assert_eq!(decode_text(b"RC0042\0\0\0\0"), "RC0042");
        assert_eq!(decode_text(b"cold room   "), "cold room");
        assert_eq!(decode_text(&[0u8; 10]), "");
    }

    #[test]
    fn device_info_decoding() {
        let info = DeviceInfo::decode_from_payload(&device_info_payload()).unwrap();
        assert_eq!(info.station_number, 1);
        assert_eq!(info.model_number, 5);
        assert_eq!(info.sample_interval, Duration::from_secs(900));
        assert_eq!(info.upper_limit, 60.0);
        assert_eq!(info.lower_limit, -30.0);
        assert_eq!(info.last_online, Some(time(2024, 3, 14, 9, 30, 0)));
        assert_eq!(info.work_status, WorkStatus::Start);
        assert_eq!(info.start_time, Some(time(2024, 3, 1, 12, 0, 0)));
        assert_eq!(info.stop_button, Permission::Permit);
        assert_eq!(info.record_count, 25);
        assert_eq!(info.current_time, None);
        assert_eq!(info.user_info, "cold room");
        assert_eq!(info.device_number, "RC0042");
        assert_eq!(info.delay_time, DelayTime::Minutes60);
        assert_eq!(info.tone_set, Permission::Prohibit);
        assert_eq!(info.alarm, 0x02);
        assert_eq!(info.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(info.temperature_calibration, 20.0);
    }

    #[test]
    fn device_info_rejects_undefined_codes_and_wrong_size() {
        let mut payload = device_info_payload();
        payload[148] = 0x05;
        assert_matches!(
            DeviceInfo::decode_from_payload(&payload),
            Err(Error::UnknownWireCode { field: "delay time", code: 0x05 })
        );

        let mut payload = device_info_payload();
        payload[151] = 0x00;
        assert_matches!(
            DeviceInfo::decode_from_payload(&payload),
            Err(Error::UnknownWireCode { field: "temperature unit", .. })
        );

        let payload = device_info_payload();
        assert_matches!(
            DeviceInfo::decode_from_payload(&payload[..100]),
            Err(Error::FrameLength { expected: 159, actual: 100 })
        );
    }

    #[test]
    fn data_header_decoding() {
        let payload = [0x01, 0x00, 0x19, 0x07, 0xE8, 3, 1, 12, 0, 0];
        assert_eq!(
            DataHeader::decode_from_payload(&payload),
            Ok(DataHeader {
                station_number: 1,
                record_count: 25,
                start_time: Some(time(2024, 3, 1, 12, 0, 0)),
            })
        );
        let payload = [0x01, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_matches!(
            DataHeader::decode_from_payload(&payload),
            Ok(DataHeader { start_time: None, record_count: 0, .. })
        );
    }

    #[test]
    fn page_decoding() {
        let payload = [0x55, 0x00, 0xDB, 0xFF, 0x90, 0x00, 0x00];
        assert_eq!(decode_page(&payload), Ok(vec![21.9, -11.2, 0.0]));
        assert_eq!(decode_page(&[0x55]), Ok(vec![]));
        assert_matches!(decode_page(&[]), Err(Error::FrameLength { .. }));
        assert_matches!(
            decode_page(&[0x55, 0x00, 0xDB, 0x01]),
            Err(Error::FrameLength { .. })
        );
    }
}
