#![allow(dead_code)]

// Shared fixtures for the integration tests

use std::cell::Cell;
use std::rc::Rc;

use hwpulse::core::telemetry::counters::{CounterSource, OsCounters};
use hwpulse::core::telemetry::feed::{
    BackendStatus, DeviceNames, FeedError, FeedResult, TelemetryFeed,
};
use hwpulse::core::telemetry::reading::{Category, ClassifiedReadings, RawSensorReading};
use hwpulse::core::telemetry::shared_memory::layout::{
    self, encode_sensor, Header, ReadingRecord, TableLayout,
};
use hwpulse::core::telemetry::shared_memory::{HeapRegion, RegionOpener, SharedRegion};

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Feed returning the same fields on every poll.
pub struct StubFeed {
    pub name: &'static str,
    pub status_key: &'static str,
    pub result: FeedResult<ClassifiedReadings>,
    pub names: DeviceNames,
    pub shutdowns: Rc<Cell<u32>>,
}

impl StubFeed {
    pub fn with(name: &'static str, status_key: &'static str, pairs: &[(Category, f64)]) -> Self {
        Self {
            name,
            status_key,
            result: Ok(pairs.iter().copied().collect()),
            names: DeviceNames::default(),
            shutdowns: Rc::default(),
        }
    }

    pub fn failing(name: &'static str, status_key: &'static str) -> Self {
        Self {
            result: Err(FeedError::unavailable("stub backend down")),
            ..Self::with(name, status_key, &[])
        }
    }
}

impl TelemetryFeed for StubFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn record_status(&self, status: &mut BackendStatus) {
        status.record(self.status_key, self.result.is_ok());
    }

    fn read(&mut self) -> FeedResult<ClassifiedReadings> {
        self.result.clone()
    }

    fn device_names(&self) -> DeviceNames {
        self.names.clone()
    }

    fn shutdown(&mut self) {
        self.shutdowns.set(self.shutdowns.get() + 1);
    }
}

/// OS counters: 23.4% CPU, 8.1 of 16 GiB RAM.
pub struct FixedCounters;

pub const RAM_TOTAL: u64 = 16 * GIB;
pub const RAM_USED: u64 = 8 * GIB + GIB / 10;

impl CounterSource for FixedCounters {
    fn sample(&mut self) -> OsCounters {
        OsCounters::from_memory(23.4, RAM_USED, RAM_TOTAL)
    }

    fn cpu_brand(&self) -> Option<String> {
        Some("Generic x86-64 CPU".to_string())
    }
}

pub fn reading(kind_code: u32, sensor_index: u32, label: &str, unit: &str, value: f64) -> ReadingRecord {
    ReadingRecord {
        kind_code,
        sensor_index,
        id: sensor_index * 1000 + kind_code,
        label: label.to_string(),
        unit: unit.to_string(),
        value,
    }
}

/// Build a complete segment image with the strides real producers use.
pub fn segment(sensors: &[&str], readings: &[ReadingRecord]) -> Vec<u8> {
    let sensor_stride = 200;
    let reading_stride = 316;
    let sensor_offset = layout::header::SIZE;
    let reading_offset = sensor_offset + sensors.len() * sensor_stride;
    let header = Header::new(
        TableLayout {
            offset: sensor_offset,
            stride: sensor_stride,
            count: sensors.len(),
        },
        TableLayout {
            offset: reading_offset,
            stride: reading_stride,
            count: readings.len(),
        },
    );

    let mut bytes = header.to_bytes();
    for name in sensors {
        bytes.extend(encode_sensor(name, sensor_stride));
    }
    for record in readings {
        bytes.extend(record.to_bytes(reading_stride));
    }
    bytes
}

/// Counts opens and live regions so tests can prove nothing leaks.
#[derive(Clone, Default)]
pub struct RegionTracker {
    pub opens: Rc<Cell<u32>>,
    pub live: Rc<Cell<i32>>,
    pub max_live: Rc<Cell<i32>>,
}

struct TrackedRegion {
    inner: HeapRegion,
    live: Rc<Cell<i32>>,
}

impl SharedRegion for TrackedRegion {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn read_bytes(&self, offset: usize, len: usize) -> Vec<u8> {
        self.inner.read_bytes(offset, len)
    }
}

impl Drop for TrackedRegion {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Hands out the next image from `images` on each open, repeating the
/// last one. `None` images fail to open.
pub struct ScriptedOpener {
    images: Vec<Option<Vec<u8>>>,
    next: usize,
    tracker: RegionTracker,
}

impl ScriptedOpener {
    pub fn new(images: Vec<Option<Vec<u8>>>, tracker: RegionTracker) -> Self {
        Self {
            images,
            next: 0,
            tracker,
        }
    }
}

impl RegionOpener for ScriptedOpener {
    fn open(&mut self) -> FeedResult<Box<dyn SharedRegion>> {
        let index = self.next.min(self.images.len().saturating_sub(1));
        self.next += 1;
        self.tracker.opens.set(self.tracker.opens.get() + 1);

        let image = self
            .images
            .get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| FeedError::unavailable("producer not running"))?;

        let live = self.tracker.live.get() + 1;
        self.tracker.live.set(live);
        self.tracker
            .max_live
            .set(self.tracker.max_live.get().max(live));
        Ok(Box::new(TrackedRegion {
            inner: HeapRegion::new(image),
            live: self.tracker.live.clone(),
        }))
    }
}

pub fn raw(name: &str, label: &str, kind: hwpulse::core::telemetry::SensorKind, value: f64) -> RawSensorReading {
    RawSensorReading {
        id: 0,
        name: name.to_string(),
        label: label.to_string(),
        unit: String::new(),
        value,
        kind,
    }
}
