use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind tag carried by every raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Temperature,
    Voltage,
    Fan,
    Current,
    Power,
    Clock,
    Usage,
    Other,
}

impl SensorKind {
    /// Map a shared-memory protocol kind code. Code 0 ("none") and
    /// unknown codes collapse into `Other`.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => SensorKind::Temperature,
            2 => SensorKind::Voltage,
            3 => SensorKind::Fan,
            4 => SensorKind::Current,
            5 => SensorKind::Power,
            6 => SensorKind::Clock,
            7 => SensorKind::Usage,
            _ => SensorKind::Other,
        }
    }

    /// Map an instrumentation namespace `SensorType` string.
    pub fn from_namespace_type(sensor_type: &str) -> Self {
        match sensor_type {
            "Temperature" => SensorKind::Temperature,
            "Voltage" => SensorKind::Voltage,
            "Fan" => SensorKind::Fan,
            "Current" => SensorKind::Current,
            "Power" => SensorKind::Power,
            "Clock" => SensorKind::Clock,
            "Load" => SensorKind::Usage,
            _ => SensorKind::Other,
        }
    }
}

/// An unclassified reading as exported by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSensorReading {
    pub id: u32,
    /// Device or sensor-group name, producer defined
    pub name: String,
    /// Metric label, producer defined
    pub label: String,
    pub unit: String,
    pub value: f64,
    pub kind: SensorKind,
}

/// Semantic (device, metric) slot a reading can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    CpuTemp,
    CpuClock,
    CpuFan,
    GpuTemp,
    GpuClock,
    GpuFan,
    GpuFanPercent,
    GpuUsage,
    GpuPower,
    GpuMemUsed,
    GpuMemTotal,
    Fps,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::CpuTemp,
        Category::CpuClock,
        Category::CpuFan,
        Category::GpuTemp,
        Category::GpuClock,
        Category::GpuFan,
        Category::GpuFanPercent,
        Category::GpuUsage,
        Category::GpuPower,
        Category::GpuMemUsed,
        Category::GpuMemTotal,
        Category::Fps,
    ];

    pub fn is_temperature(self) -> bool {
        matches!(self, Category::CpuTemp | Category::GpuTemp)
    }

    pub fn is_gpu_memory(self) -> bool {
        matches!(self, Category::GpuMemUsed | Category::GpuMemTotal)
    }
}

/// A reading resolved to its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReading {
    pub category: Category,
    pub value: f64,
}

/// At most one value per category, as produced by one backend for one poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReadings {
    values: BTreeMap<Category, f64>,
}

impl ClassifiedReadings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.values.get(&category).copied()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.values.contains_key(&category)
    }

    /// Unconditionally write `value`, replacing any previous one.
    pub fn set(&mut self, category: Category, value: f64) {
        self.values.insert(category, value);
    }

    /// Write `value` only when the category is still empty. Returns whether
    /// the value was stored.
    pub fn fill(&mut self, category: Category, value: f64) -> bool {
        if self.values.contains_key(&category) {
            return false;
        }
        self.values.insert(category, value);
        true
    }

    /// Override every category `other` reports.
    pub fn override_with(&mut self, other: &ClassifiedReadings) {
        for reading in other.iter() {
            self.set(reading.category, reading.value);
        }
    }

    /// Copy in only the categories that are still empty here.
    pub fn fill_from(&mut self, other: &ClassifiedReadings) {
        for reading in other.iter() {
            self.fill(reading.category, reading.value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ClassifiedReading> + '_ {
        self.values
            .iter()
            .map(|(&category, &value)| ClassifiedReading { category, value })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Category, f64)> for ClassifiedReadings {
    fn from_iter<I: IntoIterator<Item = (Category, f64)>>(iter: I) -> Self {
        let mut readings = ClassifiedReadings::new();
        for (category, value) in iter {
            readings.fill(category, value);
        }
        readings
    }
}
