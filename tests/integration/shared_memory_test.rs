use hwpulse::core::telemetry::feed::{BackendStatus, FeedError, TelemetryFeed, BACKEND_HWINFO};
use hwpulse::core::telemetry::reading::Category;
use hwpulse::core::telemetry::shared_memory::layout;
use hwpulse::core::telemetry::shared_memory::SharedMemoryFeed;

use super::support::*;

fn healthy_image() -> Vec<u8> {
    segment(
        &["CPU [#0]: Intel Core i7-13700K", "GPU [#0]: NVIDIA GeForce RTX 4070 Ti"],
        &[
            reading(1, 0, "CPU Package", "°C", 62.0),
            reading(6, 0, "P-core 0 Clock", "MHz", 5300.0),
            reading(7, 1, "GPU Core Load", "%", 41.0),
        ],
    )
}

fn dead_image() -> Vec<u8> {
    let mut image = healthy_image();
    image[..4].copy_from_slice(b"DEAD");
    image
}

#[test]
fn test_wrong_signature_twice_releases_everything() {
    let tracker = RegionTracker::default();
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(dead_image())], tracker.clone()));

    for _ in 0..2 {
        let result = feed.read();
        assert!(matches!(result, Err(FeedError::StaleProtocol { .. })));
        assert!(!feed.is_initialized());
        assert_eq!(tracker.live.get(), 0, "mapping leaked after resync");
    }
    assert!(tracker.max_live.get() <= 1);
    // One open at construction, then reopen + resync per poll after the first.
    assert_eq!(tracker.opens.get(), 4);

    let mut status = BackendStatus::new();
    feed.record_status(&mut status);
    assert_eq!(status.get(BACKEND_HWINFO), Some(false));
}

#[test]
fn test_resync_recovers_after_producer_restart() {
    let tracker = RegionTracker::default();
    let opener = ScriptedOpener::new(vec![Some(dead_image()), Some(healthy_image())], tracker.clone());
    let mut feed = SharedMemoryFeed::new(opener);

    let classified = feed.read().unwrap();
    assert_eq!(classified.get(Category::CpuTemp), Some(62.0));
    assert_eq!(classified.get(Category::GpuUsage), Some(41.0));
    assert!(feed.is_initialized());
    assert_eq!(tracker.opens.get(), 2);
    assert_eq!(tracker.live.get(), 1);
}

#[test]
fn test_lazy_initialization_when_producer_starts_late() {
    let tracker = RegionTracker::default();
    let opener = ScriptedOpener::new(vec![None, Some(healthy_image())], tracker.clone());
    let mut feed = SharedMemoryFeed::new(opener);
    assert!(!feed.is_initialized());

    let classified = feed.read().unwrap();
    assert_eq!(classified.get(Category::CpuClock), Some(5300.0));
    assert!(feed.is_initialized());
}

#[test]
fn test_truncated_header_is_not_fatal() {
    let tracker = RegionTracker::default();
    let short = healthy_image()[..layout::header::SIZE - 8].to_vec();
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(short)], tracker.clone()));

    assert!(matches!(feed.read(), Err(FeedError::TransientReadFailure(_))));
    assert_eq!(tracker.live.get(), 0);
}

#[test]
fn test_records_outside_region_are_ignored() {
    let mut image = healthy_image();
    // Point the reading table past the end of the segment.
    layout::header::READING_OFFSET.write_u32(&mut image, 1 << 30);
    let tracker = RegionTracker::default();
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(image)], tracker));

    assert!(feed.raw_readings().unwrap().is_empty());
}

#[test]
fn test_out_of_range_temperatures_are_dropped() {
    let image = segment(
        &["CPU [#0]: AMD Ryzen 5 5600X"],
        &[
            reading(1, 0, "CPU (Tctl/Tdie)", "°C", 255.0),
            reading(1, 0, "CPU Package", "°C", -1.0),
            reading(1, 0, "CPU Die (average)", "°C", 150.0),
        ],
    );
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(image)], RegionTracker::default()));
    assert!(!feed.read().unwrap().contains(Category::CpuTemp));
}

#[test]
fn test_shutdown_unmaps() {
    let tracker = RegionTracker::default();
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(healthy_image())], tracker.clone()));
    assert_eq!(tracker.live.get(), 1);
    feed.shutdown();
    feed.shutdown();
    assert_eq!(tracker.live.get(), 0);
}

#[test]
fn test_zero_stride_table_does_not_stall_poll() {
    let mut image = healthy_image();
    layout::header::SENSOR_STRIDE.write_u32(&mut image, 0);
    layout::header::SENSOR_COUNT.write_u32(&mut image, u32::MAX);
    let tracker = RegionTracker::default();
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(image)], tracker.clone()));

    assert!(matches!(feed.read(), Err(FeedError::TransientReadFailure(_))));
    assert!(!feed.is_initialized());
    assert_eq!(tracker.live.get(), 0);
}

#[test]
fn test_oversized_reading_count_is_bounded_by_region() {
    let mut image = healthy_image();
    layout::header::READING_COUNT.write_u32(&mut image, u32::MAX);
    let mut feed = SharedMemoryFeed::new(ScriptedOpener::new(vec![Some(image)], RegionTracker::default()));

    assert_eq!(feed.raw_readings().unwrap().len(), 3);
}
