//! Hardware telemetry: backends, classification and the tiered merge.

pub mod classifier;
pub mod counters;
pub mod engine;
pub mod feed;
pub mod instrumentation;
pub mod reading;
pub mod rules;
pub mod runtime;
pub mod shared_memory;
pub mod snapshot;
pub mod vendor_gpu;

pub use classifier::classify;
pub use counters::{CounterSource, OsCounters, SysinfoCounters};
pub use engine::{reconcile, SourcedReading, TelemetryEngine};
pub use feed::{BackendStatus, DeviceNames, FeedError, FeedResult, NoopFeed, TelemetryFeed};
pub use reading::{Category, ClassifiedReadings, RawSensorReading, SensorKind};
pub use runtime::TelemetryRuntime;
pub use shared_memory::SharedMemoryFeed;
pub use snapshot::Snapshot;
