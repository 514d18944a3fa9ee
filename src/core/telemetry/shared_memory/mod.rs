//! Reader for the HWiNFO shared-memory sensor segment.
//!
//! The segment carries a header and two record tables: sensors (device
//! groups) and readings (individual metrics pointing back at a sensor by
//! index). The producer may restart at any time, so every poll validates
//! the header and resyncs once when it looks wrong.

pub mod layout;
pub mod region;

use std::collections::HashMap;

use crate::core::telemetry::classifier::classify;
use crate::core::telemetry::feed::{
    BackendStatus, FeedError, FeedResult, TelemetryFeed, BACKEND_HWINFO,
};
use crate::core::telemetry::reading::{ClassifiedReadings, RawSensorReading, SensorKind};
use crate::core::telemetry::rules::SHARED_MEMORY_RULES;

use layout::{Header, TableLayout};
pub use region::{HeapRegion, RegionOpener, SharedRegion};

/// Sensor name used when a reading points at a missing sensor record
pub const UNKNOWN_SENSOR: &str = "Unknown";

pub struct SharedMemoryFeed<O: RegionOpener> {
    opener: O,
    region: Option<Box<dyn SharedRegion>>,
}

impl<O: RegionOpener> SharedMemoryFeed<O> {
    /// Try to map the segment right away. A producer that is not running
    /// yet is not an error; the feed retries on every poll.
    pub fn new(opener: O) -> Self {
        let mut feed = Self {
            opener,
            region: None,
        };
        match feed.reopen() {
            Ok(()) => log::info!("Shared-memory sensor segment mapped"),
            Err(e) => log::info!("Shared-memory sensor segment not available: {}", e),
        }
        feed
    }

    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    /// Release the current mapping before opening a new one so no more
    /// than one view is ever live.
    fn reopen(&mut self) -> FeedResult<()> {
        self.region = None;
        self.region = Some(self.opener.open()?);
        Ok(())
    }

    fn read_header(&self) -> FeedResult<Header> {
        let region = self
            .region
            .as_deref()
            .ok_or_else(|| FeedError::unavailable("segment not mapped"))?;
        layout::parse_header(&region.read_bytes(0, layout::header::SIZE))
    }

    /// A valid header for the mapped region, resyncing at most once.
    fn validated_header(&mut self) -> FeedResult<Header> {
        if !self.is_initialized() {
            self.reopen()?;
        }

        match self.read_header() {
            Ok(header) => Ok(header),
            Err(first) => {
                log::warn!("Shared-memory header invalid ({}), resyncing", first);
                self.reopen()?;
                self.read_header().inspect_err(|_| {
                    // Stay uninitialized so the next poll starts clean.
                    self.region = None;
                })
            }
        }
    }

    /// Raw readings joined with their sensor names.
    pub fn read_raw(&mut self) -> FeedResult<Vec<RawSensorReading>> {
        let header = self.validated_header()?;
        let region = self
            .region
            .as_deref()
            .ok_or_else(|| FeedError::unavailable("segment not mapped"))?;
        Ok(read_tables(region, &header))
    }
}

/// Walk both tables. Records past the end of the region stop the walk;
/// short or malformed records are skipped.
fn read_tables(region: &dyn SharedRegion, header: &Header) -> Vec<RawSensorReading> {
    let mut names: HashMap<u32, String> = HashMap::new();
    for (index, record) in records(region, &header.sensors, layout::sensor::READ_CAP) {
        match layout::parse_sensor_name(index, &record) {
            Ok(name) => {
                names.insert(index as u32, name);
            }
            Err(e) => log::trace!("Skipping sensor record: {}", e),
        }
    }

    let mut readings = Vec::new();
    for (index, record) in records(region, &header.readings, layout::reading::READ_CAP) {
        let parsed = match layout::parse_reading(index, &record) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::trace!("Skipping reading record: {}", e);
                continue;
            }
        };
        let name = names
            .get(&parsed.sensor_index)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SENSOR.to_string());
        readings.push(RawSensorReading {
            id: parsed.id,
            name,
            label: parsed.label,
            unit: parsed.unit,
            value: parsed.value,
            kind: SensorKind::from_code(parsed.kind_code),
        });
    }
    readings
}

/// `(index, bytes)` for each record of `table` that starts inside the region.
fn records<'a>(
    region: &'a dyn SharedRegion,
    table: &'a TableLayout,
    read_cap: usize,
) -> impl Iterator<Item = (usize, Vec<u8>)> + 'a {
    let len = table.stride.min(read_cap);
    (0..table.count_within(region.len()))
        .map_while(move |index| {
            table
                .record_offset(index)
                .filter(|&offset| offset < region.len())
                .map(|offset| (index, offset))
        })
        .map(move |(index, offset)| (index, region.read_bytes(offset, len)))
}

impl<O: RegionOpener> TelemetryFeed for SharedMemoryFeed<O> {
    fn name(&self) -> &'static str {
        "shared-memory"
    }

    fn record_status(&self, status: &mut BackendStatus) {
        status.record(BACKEND_HWINFO, self.is_initialized());
    }

    fn read(&mut self) -> FeedResult<ClassifiedReadings> {
        let readings = self.read_raw()?;
        Ok(classify(&readings, &SHARED_MEMORY_RULES))
    }

    fn raw_readings(&mut self) -> FeedResult<Vec<RawSensorReading>> {
        self.read_raw()
    }

    fn shutdown(&mut self) {
        self.region = None;
    }
}
