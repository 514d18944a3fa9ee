//! Binary layout of the HWiNFO shared-memory segment.
//!
//! All integers are little-endian. Strings are fixed-width, NUL-terminated
//! and decoded lossily.

use crate::core::telemetry::feed::{FeedError, FeedResult};

/// "HWiS"
pub const SIGNATURE_ACTIVE: u32 = 0x5369_5748;

/// A fixed-width field within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub width: usize,
}

impl Field {
    pub const fn new(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.width
    }

    fn bytes<'a>(&self, record: &'a [u8]) -> &'a [u8] {
        &record[self.offset..self.end()]
    }

    /// Caller guarantees `record.len() >= self.end()`.
    pub fn read_u32(&self, record: &[u8]) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes(record)[..4]);
        u32::from_le_bytes(buf)
    }

    pub fn read_f64(&self, record: &[u8]) -> f64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes(record)[..8]);
        f64::from_le_bytes(buf)
    }

    /// Bytes up to the first NUL, otherwise untouched.
    pub fn read_str(&self, record: &[u8]) -> String {
        let raw = self.bytes(record);
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    pub fn write_u32(&self, record: &mut [u8], value: u32) {
        record[self.offset..self.offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&self, record: &mut [u8], value: f64) {
        record[self.offset..self.offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Truncates to leave room for the terminator.
    pub fn write_str(&self, record: &mut [u8], value: &str) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(self.width.saturating_sub(1));
        let slot = &mut record[self.offset..self.end()];
        slot.fill(0);
        slot[..len].copy_from_slice(&bytes[..len]);
    }
}

pub mod header {
    use super::Field;

    pub const SIZE: usize = 48;

    pub const SIGNATURE: Field = Field::new(0, 4);
    pub const SENSOR_OFFSET: Field = Field::new(20, 4);
    pub const SENSOR_STRIDE: Field = Field::new(24, 4);
    pub const SENSOR_COUNT: Field = Field::new(28, 4);
    pub const READING_OFFSET: Field = Field::new(32, 4);
    pub const READING_STRIDE: Field = Field::new(36, 4);
    pub const READING_COUNT: Field = Field::new(40, 4);
}

pub mod sensor {
    use super::Field;

    pub const NAME: Field = Field::new(8, 128);

    /// Minimum usable record length
    pub const MIN_LEN: usize = NAME.end();
    /// Never read more than this per record
    pub const READ_CAP: usize = 200;
}

pub mod reading {
    use super::Field;

    pub const KIND: Field = Field::new(0, 4);
    pub const SENSOR_INDEX: Field = Field::new(4, 4);
    pub const ID: Field = Field::new(8, 4);
    pub const LABEL: Field = Field::new(12, 128);
    pub const UNIT: Field = Field::new(268, 16);
    pub const VALUE: Field = Field::new(284, 8);

    pub const MIN_LEN: usize = VALUE.end();
    pub const READ_CAP: usize = 300;
}

/// Location of one fixed-stride record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableLayout {
    pub offset: usize,
    pub stride: usize,
    pub count: usize,
}

impl TableLayout {
    /// Byte offset of record `index`, `None` on arithmetic overflow.
    pub fn record_offset(&self, index: usize) -> Option<usize> {
        index
            .checked_mul(self.stride)
            .and_then(|delta| self.offset.checked_add(delta))
    }

    /// Number of records that start before `region_len`, never more than
    /// `count`.
    pub fn count_within(&self, region_len: usize) -> usize {
        if self.stride == 0 || self.offset >= region_len {
            return 0;
        }
        let fit = (region_len - self.offset).div_ceil(self.stride);
        self.count.min(fit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub signature: u32,
    pub sensors: TableLayout,
    pub readings: TableLayout,
}

impl Header {
    pub fn new(sensors: TableLayout, readings: TableLayout) -> Self {
        Self {
            signature: SIGNATURE_ACTIVE,
            sensors,
            readings,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; header::SIZE];
        header::SIGNATURE.write_u32(&mut out, self.signature);
        header::SENSOR_OFFSET.write_u32(&mut out, self.sensors.offset as u32);
        header::SENSOR_STRIDE.write_u32(&mut out, self.sensors.stride as u32);
        header::SENSOR_COUNT.write_u32(&mut out, self.sensors.count as u32);
        header::READING_OFFSET.write_u32(&mut out, self.readings.offset as u32);
        header::READING_STRIDE.write_u32(&mut out, self.readings.stride as u32);
        header::READING_COUNT.write_u32(&mut out, self.readings.count as u32);
        out
    }
}

/// Parse the segment header. A short read is transient; a foreign or
/// retired signature is a stale protocol.
pub fn parse_header(bytes: &[u8]) -> FeedResult<Header> {
    if bytes.len() < header::SIZE {
        return Err(FeedError::transient(format!(
            "header truncated: {} of {} bytes",
            bytes.len(),
            header::SIZE
        )));
    }

    let signature = header::SIGNATURE.read_u32(bytes);
    if signature != SIGNATURE_ACTIVE {
        return Err(FeedError::StaleProtocol { found: signature });
    }

    let table = |offset: &Field, stride: &Field, count: &Field| TableLayout {
        offset: offset.read_u32(bytes) as usize,
        stride: stride.read_u32(bytes) as usize,
        count: count.read_u32(bytes) as usize,
    };

    let parsed = Header {
        signature,
        sensors: table(
            &header::SENSOR_OFFSET,
            &header::SENSOR_STRIDE,
            &header::SENSOR_COUNT,
        ),
        readings: table(
            &header::READING_OFFSET,
            &header::READING_STRIDE,
            &header::READING_COUNT,
        ),
    };

    // A producer restarting writes the signature before the table geometry.
    for (name, table) in [("sensor", &parsed.sensors), ("reading", &parsed.readings)] {
        if table.count > 0 && table.stride == 0 {
            return Err(FeedError::transient(format!(
                "{} table declares {} records with zero stride",
                name, table.count
            )));
        }
    }
    Ok(parsed)
}

pub fn parse_sensor_name(index: usize, record: &[u8]) -> FeedResult<String> {
    if record.len() < sensor::MIN_LEN {
        return Err(FeedError::parse(
            index,
            format!("sensor record has {} bytes, need {}", record.len(), sensor::MIN_LEN),
        ));
    }
    Ok(sensor::NAME.read_str(record))
}

/// A decoded reading record, before it is joined with its sensor name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRecord {
    pub kind_code: u32,
    pub sensor_index: u32,
    pub id: u32,
    pub label: String,
    pub unit: String,
    pub value: f64,
}

impl ReadingRecord {
    /// Encode into a record of `stride` bytes (at least `reading::MIN_LEN`).
    pub fn to_bytes(&self, stride: usize) -> Vec<u8> {
        let mut out = vec![0u8; stride.max(reading::MIN_LEN)];
        reading::KIND.write_u32(&mut out, self.kind_code);
        reading::SENSOR_INDEX.write_u32(&mut out, self.sensor_index);
        reading::ID.write_u32(&mut out, self.id);
        reading::LABEL.write_str(&mut out, &self.label);
        reading::UNIT.write_str(&mut out, &self.unit);
        reading::VALUE.write_f64(&mut out, self.value);
        out
    }
}

/// Encode a sensor record of `stride` bytes (at least `sensor::MIN_LEN`).
pub fn encode_sensor(name: &str, stride: usize) -> Vec<u8> {
    let mut out = vec![0u8; stride.max(sensor::MIN_LEN)];
    sensor::NAME.write_str(&mut out, name);
    out
}

pub fn parse_reading(index: usize, record: &[u8]) -> FeedResult<ReadingRecord> {
    if record.len() < reading::MIN_LEN {
        return Err(FeedError::parse(
            index,
            format!("reading record has {} bytes, need {}", record.len(), reading::MIN_LEN),
        ));
    }
    Ok(ReadingRecord {
        kind_code: reading::KIND.read_u32(record),
        sensor_index: reading::SENSOR_INDEX.read_u32(record),
        id: reading::ID.read_u32(record),
        label: reading::LABEL.read_str(record),
        unit: reading::UNIT.read_str(record),
        value: reading::VALUE.read_f64(record),
    })
}
