//! Temperature logger CLI
//!
//! A command-line interface for standalone temperature data loggers attached
//! to a serial port.
//!
//! This tool allows users to:
//! - Read the device identity and configuration.
//! - Download the recorded samples as text or JSON.
//! - Change operating parameters, the device number, the user text and the clock.
//! - Clear the recorded samples.
//! - Serve device info and samples over HTTP.
//!
//! The CLI leverages the `templog_lib` crate for the protocol and the command engine.

use anyhow::{Context, Result};
use clap::Parser;
use commandline::{CliCommands, OutputFormat};
use dialoguer::Confirm;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use std::panic;
use templog_lib::{
    client::TempLogger, retry::RetryPolicy, safe_client::SafeClient, transport::SerialTransport,
};

mod commandline;
mod http;

fn logging_init(loglevel: LevelFilter) -> Result<LoggerHandle> {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .context("Cannot init logging")?
        .start()
        .context("Cannot start logging")?;

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0));

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic",
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    Ok(log_handle)
}

/// Uses `station` if given, otherwise asks the device which station it is.
fn resolve_station(
    logger: &mut TempLogger<SerialTransport>,
    station: Option<u8>,
) -> Result<u8> {
    match station {
        Some(station) => Ok(station),
        None => {
            let station = logger
                .read_device_info()
                .with_context(|| "Cannot read device info")?
                .station_number;
            debug!("Using station {station} reported by the device");
            Ok(station)
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .show_default(true)
        .interact()
        .context("Failed to get user confirmation.")
}

fn run_command(logger: &mut TempLogger<SerialTransport>, command: CliCommands) -> Result<()> {
    match command {
        CliCommands::Info => {
            let info = logger
                .read_device_info()
                .with_context(|| "Cannot read device info")?;
            println!("{info}");
        }
        CliCommands::Header { station } => {
            let station = resolve_station(logger, station)?;
            let header = logger
                .read_data_header(station)
                .with_context(|| format!("Cannot read data header of station {station}"))?;
            println!("{header}");
        }
        CliCommands::Page { page, station } => {
            let station = resolve_station(logger, station)?;
            let temperatures = logger
                .read_data_page(station, page)
                .with_context(|| format!("Cannot read data page {page} of station {station}"))?;
            for temperature in temperatures {
                println!("{temperature:.1}");
            }
        }
        CliCommands::Samples { station, format } => {
            let station = resolve_station(logger, station)?;
            let samples = logger
                .fetch_samples(station)
                .with_context(|| format!("Cannot download samples of station {station}"))?;
            match format {
                OutputFormat::Text => {
                    for sample in &samples {
                        println!("{sample}");
                    }
                }
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&samples)
                            .context("Cannot serialize samples")?
                    );
                }
            }
        }
        CliCommands::SetParams {
            station,
            new_station,
            overrides,
        } => {
            let info = logger
                .read_device_info()
                .with_context(|| "Cannot read device info")?;
            let mut params = templog_lib::protocol::DeviceParams::from(&info);
            if let Some(station) = station {
                params.station_number = station;
            }
            overrides.apply(&mut params);
            if info.record_count > 0
                && !confirm(&format!(
                    "Writing parameters discards {} recorded samples. Continue?",
                    info.record_count
                ))?
            {
                info!("Writing parameters aborted by user.");
                return Ok(());
            }
            logger
                .write_device_params(&params, new_station)
                .with_context(|| "Cannot write device parameters")?;
            println!("Device parameters written.");
        }
        CliCommands::Clear { yes } => {
            if !yes && !confirm("Erase all recorded samples?")? {
                info!("Clearing aborted by user.");
                return Ok(());
            }
            logger
                .clear_data()
                .with_context(|| "Cannot clear recorded samples")?;
            println!("Recorded samples cleared.");
        }
        CliCommands::SetNumber { number, station } => {
            let station = resolve_station(logger, station)?;
            logger
                .set_device_number(station, &number)
                .with_context(|| "Cannot set device number")?;
            println!("Device number set.");
        }
        CliCommands::SetUserInfo { user_info, station } => {
            let station = resolve_station(logger, station)?;
            logger
                .set_user_info(station, &user_info)
                .with_context(|| "Cannot set user info")?;
            println!("User info set.");
        }
        CliCommands::SetTime { time, station } => {
            let station = resolve_station(logger, station)?;
            let time = time.unwrap_or_else(|| chrono::Local::now().naive_local());
            logger
                .set_device_time(station, &time)
                .with_context(|| "Cannot set device time")?;
            println!("Device time set to {time}.");
        }
        CliCommands::Serve { .. } => unreachable!("Serve is handled before opening the engine."),
    }
    Ok(())
}

fn run_server(
    logger: TempLogger<SerialTransport>,
    config_file: &str,
    bind: Option<std::net::SocketAddr>,
) -> Result<()> {
    let mut config = http::HttpConfig::load(config_file)?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot start async runtime")?;
    runtime.block_on(http::serve(SafeClient::new(logger), &config))
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter())?;
    info!(
        "templog CLI started. Log level: {}",
        args.verbose.log_level_filter()
    );

    info!(
        "Opening {} at {} baud (timeout {:?}, {} retries)",
        args.device, args.baud_rate, args.timeout, args.retries
    );
    let transport = SerialTransport::open(&args.device, args.baud_rate)
        .with_context(|| format!("Cannot open serial port {}", args.device))?;
    let mut logger = TempLogger::new(transport).with_retry_policy(RetryPolicy::new(args.retries));
    logger.set_timeout(args.timeout);

    match args.command {
        CliCommands::Serve { config_file, bind } => run_server(logger, &config_file, bind),
        command => run_command(&mut logger, command),
    }
}
