//! Reconstruction of the recorded sample series.
//!
//! The logger stores its samples in fixed-size pages without timestamps. The
//! data header gives the number of samples and the time recording started, the
//! device info gives the sample interval, and sample `i` was taken at
//! `start + i * interval`.

use crate::client::TempLogger;
use crate::error::{Error, Result};
use crate::protocol::{self as proto, Sample};
use crate::transport::Transport;
use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info};
use std::time::Duration;

impl<T: Transport> TempLogger<T> {
    /// Downloads every stored sample of `station`, oldest first.
    ///
    /// # Errors
    ///
    /// * [`Error::MissingStartTime`] if samples exist but the header has no start time.
    /// * [`Error::IncompleteSeries`] if the device runs out of pages early.
    /// * Any error of the underlying reads.
    pub fn fetch_samples(&mut self, station: u8) -> Result<Vec<Sample>> {
        let interval = self.read_device_info()?.sample_interval;
        let header = self.read_data_header(station)?;
        let count = header.record_count as usize;
        info!("Station {station} holds {count} samples every {interval:?}");
        if count == 0 {
            return Ok(Vec::new());
        }
        let start = header.start_time.ok_or(Error::MissingStartTime)?;
        let temperatures = collect_pages(count, |page| self.read_data_page(station, page))?;
        build_series(start, interval, temperatures)
    }
}

/// Reads pages 0, 1, 2, ... until `count` temperatures have arrived.
///
/// Pages may hold any number of values, the last one usually fewer. Values past
/// `count` are dropped.
pub fn collect_pages<F>(count: usize, mut read_page: F) -> Result<Vec<f32>>
where
    F: FnMut(u8) -> Result<Vec<f32>>,
{
    let mut temperatures = Vec::with_capacity(count);
    let mut page: u8 = 0;
    while temperatures.len() < count {
        let values = read_page(page)?;
        debug!("Page {page} holds {} samples", values.len());
        if values.is_empty() {
            return Err(Error::IncompleteSeries {
                expected: count,
                received: temperatures.len(),
            });
        }
        temperatures.extend(values);
        if temperatures.len() >= count {
            break;
        }
        page = page.checked_add(1).ok_or(Error::IncompleteSeries {
            expected: count,
            received: temperatures.len(),
        })?;
    }
    temperatures.truncate(count);
    Ok(temperatures)
}

/// Places each temperature at `start + index * interval`.
pub fn build_series(
    start: NaiveDateTime,
    interval: Duration,
    temperatures: Vec<f32>,
) -> Result<Vec<Sample>> {
    let step = interval.as_secs() as i64;
    temperatures
        .into_iter()
        .enumerate()
        .map(|(index, temperature)| -> Result<Sample> {
            let time = (index as i64)
                .checked_mul(step)
                .and_then(TimeDelta::try_seconds)
                .and_then(|offset| start.checked_add_signed(offset))
                .ok_or_else(|| proto::Error::InvalidInput {
                    field: "sample time",
                    value: format!("{start} + {index} * {interval:?}"),
                })?;
            Ok(Sample { time, temperature })
        })
        .collect()
}
