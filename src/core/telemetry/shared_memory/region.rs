use crate::core::telemetry::feed::FeedResult;

/// A readable, fixed-size view of a shared-memory segment.
///
/// Reads copy out of the region so a concurrently writing producer can
/// never hand out a torn borrow.
pub trait SharedRegion {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy up to `len` bytes starting at `offset`. The result is shorter
    /// than requested near the end of the region and empty past it.
    fn read_bytes(&self, offset: usize, len: usize) -> Vec<u8>;
}

/// Opens a fresh view of the segment. Each successful call hands out a new
/// region; dropping it releases the underlying OS handles.
pub trait RegionOpener {
    fn open(&mut self) -> FeedResult<Box<dyn SharedRegion>>;
}

/// Region backed by an owned buffer.
#[derive(Debug, Clone, Default)]
pub struct HeapRegion {
    bytes: Vec<u8>,
}

impl HeapRegion {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl SharedRegion for HeapRegion {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn read_bytes(&self, offset: usize, len: usize) -> Vec<u8> {
        clamp_range(offset, len, self.bytes.len())
            .map(|range| self.bytes[range].to_vec())
            .unwrap_or_default()
    }
}

/// The in-bounds part of `offset..offset + len` for a region of `total`
/// bytes, or `None` when nothing of it is readable.
pub fn clamp_range(offset: usize, len: usize, total: usize) -> Option<std::ops::Range<usize>> {
    let end = offset.saturating_add(len).min(total);
    (offset < end).then_some(offset..end)
}
