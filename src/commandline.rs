use crate::http::HttpConfig;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::net::SocketAddr;
use std::time::Duration;
use templog_lib::protocol::{self as proto, DelayTime, DeviceParams, Permission, TemperatureUnit};

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

fn parse_station(s: &str) -> Result<u8, String> {
    clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid station number format: {e}"))
}

fn parse_permission(s: &str) -> Result<Permission, String> {
    s.parse::<Permission>().map_err(|e| e.to_string())
}

fn parse_temperature_unit(s: &str) -> Result<TemperatureUnit, String> {
    s.parse::<TemperatureUnit>().map_err(|e| e.to_string())
}

fn parse_delay_time(s: &str) -> Result<DelayTime, String> {
    let delay = humantime::parse_duration(s).map_err(|e| format!("Invalid delay format: {e}"))?;
    DelayTime::try_from(delay)
        .map_err(|e| format!("{e} (supported: 0s, 30m, 60m, 90m, 120m, 150m)"))
}

fn parse_degrees(s: &str) -> Result<f32, String> {
    s.parse::<f32>().map_err(|e| format!("Invalid temperature value format: {e}"))
}

fn parse_device_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| format!("Invalid time, expected \"YYYY-MM-DD HH:MM:SS\": {e}"))
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One tab separated line per sample.
    #[default]
    Text,
    /// A JSON array of samples.
    Json,
}

/// Parameters to change with `set-params`; anything left out keeps its current value.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct ParamOverrides {
    /// Sample interval, e.g. "30s", "15m", "1h 30m".
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Upper alarm limit in degrees, 0.1 degree resolution.
    #[arg(long, value_parser = parse_degrees, allow_negative_numbers = true)]
    pub upper_limit: Option<f32>,

    /// Lower alarm limit in degrees, 0.1 degree resolution.
    #[arg(long, value_parser = parse_degrees, allow_negative_numbers = true)]
    pub lower_limit: Option<f32>,

    /// Whether the stop button may end a recording: "permit" or "prohibit".
    #[arg(long, value_parser = parse_permission)]
    pub stop_button: Option<Permission>,

    /// Delay before the first sample: 0s, 30m, 60m, 90m, 120m or 150m.
    #[arg(long, value_parser = parse_delay_time)]
    pub delay: Option<DelayTime>,

    /// Whether the alarm tone may sound: "permit" or "prohibit".
    #[arg(long, value_parser = parse_permission)]
    pub tone_set: Option<Permission>,

    /// Raw alarm setting byte.
    #[arg(long, value_parser = clap_num::maybe_hex::<u8>)]
    pub alarm: Option<u8>,

    /// Display unit: "C" or "F".
    #[arg(long, value_parser = parse_temperature_unit)]
    pub unit: Option<TemperatureUnit>,

    /// Calibration offset in degrees (0.0 to 25.5).
    #[arg(long, value_parser = parse_degrees)]
    pub calibration: Option<f32>,
}

impl ParamOverrides {
    pub fn apply(&self, params: &mut DeviceParams) {
        if let Some(interval) = self.interval {
            params.sample_interval = interval;
        }
        if let Some(upper_limit) = self.upper_limit {
            params.upper_limit = upper_limit;
        }
        if let Some(lower_limit) = self.lower_limit {
            params.lower_limit = lower_limit;
        }
        if let Some(stop_button) = self.stop_button {
            params.stop_button = stop_button;
        }
        if let Some(delay) = self.delay {
            params.delay_time = delay;
        }
        if let Some(tone_set) = self.tone_set {
            params.tone_set = tone_set;
        }
        if let Some(alarm) = self.alarm {
            params.alarm = alarm;
        }
        if let Some(unit) = self.unit {
            params.temperature_unit = unit;
        }
        if let Some(calibration) = self.calibration {
            params.temperature_calibration = calibration;
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Read and display the device identity and configuration.
    Info,

    /// Read and display how many samples are stored and when recording started.
    Header {
        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,
    },

    /// Read and display the raw temperatures of a single data page.
    Page {
        /// Page index, starting at 0.
        #[arg(value_parser = clap_num::maybe_hex::<u8>)]
        page: u8,

        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,
    },

    /// Download all recorded samples with their timestamps.
    Samples {
        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Change operating parameters.
    /// The current configuration is read first and only the given options are changed.
    /// **Warning:** The device discards its recorded samples when parameters are written.
    #[clap(verbatim_doc_comment)]
    SetParams {
        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,

        /// Move the device to a new station number.
        #[arg(long, value_parser = parse_station)]
        new_station: Option<u8>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Erase the recorded samples, keeping the current configuration.
    Clear {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Set the device number (at most 10 bytes, longer text is cut).
    SetNumber {
        number: String,

        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,
    },

    /// Set the user information text (at most 100 bytes, longer text is cut).
    SetUserInfo {
        user_info: String,

        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,
    },

    /// Set the device clock, by default to the local time of this computer.
    SetTime {
        /// Time to set, "YYYY-MM-DD HH:MM:SS".
        #[arg(short, long, value_parser = parse_device_time)]
        time: Option<NaiveDateTime>,

        /// Station number, defaults to the one reported by the device.
        #[arg(short, long, value_parser = parse_station)]
        station: Option<u8>,
    },

    /// Serve device info and samples as JSON over HTTP.
    /// Endpoints: GET /device-info, GET /samples
    #[clap(verbatim_doc_comment)]
    Serve {
        /// YAML configuration file, used if it exists.
        #[arg(long, default_value_t = HttpConfig::DEFAULT_CONFIG_FILE.to_string())]
        config_file: String,

        /// Address to listen on, overrides the configuration file.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

const fn about_text() -> &'static str {
    "Temperature logger CLI - Read configuration and recorded samples from serial temperature data loggers."
}

#[derive(Parser, Debug)]
#[command(name = "templog", author, version, about = about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default is warnings only.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Serial port device name.
    /// Examples: "/dev/ttyUSB0" (Linux), "COM3" (Windows).
    #[arg(global = true, short, long, default_value_t = default_device_name(), verbatim_doc_comment)]
    pub device: String,

    /// Baud rate for serial communication.
    #[arg(global = true, long, default_value_t = proto::DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,

    /// How long each read waits for the device.
    /// Examples: "500ms", "1s".
    #[arg(global = true, long, default_value = "500ms", value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Duration,

    /// How often a request is repeated when the device does not answer.
    #[arg(global = true, long, default_value_t = templog_lib::retry::RetryPolicy::DEFAULT_RETRIES)]
    pub retries: u32,

    #[command(subcommand)]
    pub command: CliCommands,
}
