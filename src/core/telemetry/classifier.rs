//! Rule-driven sensor classification.
//!
//! Producers name their sensors freely, so a reading is resolved to a
//! [`Category`] by walking an ordered [`RuleTable`]. The first rule whose
//! kind, name predicate and label predicate all match decides the category.
//! Within one `classify` call only the first sane value per category is
//! kept; later candidates for a filled category are dropped.

use super::reading::{Category, ClassifiedReadings, RawSensorReading, SensorKind};

const TEMPERATURE_MIN: f64 = 0.0;
const TEMPERATURE_MAX: f64 = 150.0;
const FPS_MIN: f64 = 1.0;

/// Case-insensitive predicate over a lowercased name or label.
#[derive(Debug, Clone, Copy)]
pub enum Pred {
    /// Always matches
    Any,
    /// Matches if any token is a substring
    Contains(&'static [&'static str]),
    /// Matches if every token is a substring
    ContainsAll(&'static [&'static str]),
    /// Matches the trimmed text exactly
    Equals(&'static str),
    /// Matches if the trimmed text starts with the prefix
    StartsWith(&'static str),
    Either(&'static [Pred]),
    Both(&'static [Pred]),
}

impl Pred {
    /// `text` must already be lowercase.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Pred::Any => true,
            Pred::Contains(tokens) => tokens.iter().any(|t| text.contains(t)),
            Pred::ContainsAll(tokens) => tokens.iter().all(|t| text.contains(t)),
            Pred::Equals(expected) => text.trim() == *expected,
            Pred::StartsWith(prefix) => text.trim().starts_with(prefix),
            Pred::Either(preds) => preds.iter().any(|p| p.matches(text)),
            Pred::Both(preds) => preds.iter().all(|p| p.matches(text)),
        }
    }
}

/// `(kind, name predicate, label predicate) -> category`
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// `None` accepts any kind
    pub kind: Option<SensorKind>,
    pub name: Pred,
    pub label: Pred,
    pub category: Category,
}

impl Rule {
    pub fn matches(&self, kind: SensorKind, name: &str, label: &str) -> bool {
        self.kind.is_none_or(|k| k == kind) && self.name.matches(name) && self.label.matches(label)
    }
}

/// An ordered list of rules; order is the tie-break.
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    pub name: &'static str,
    pub rules: &'static [Rule],
}

impl RuleTable {
    /// Category decided by the first matching rule, if any.
    pub fn resolve(&self, reading: &RawSensorReading) -> Option<Category> {
        let name = reading.name.to_lowercase();
        let label = reading.label.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(reading.kind, &name, &label))
            .map(|rule| rule.category)
    }
}

/// Classify `readings` against `table`.
///
/// Pure and deterministic: the same ordered input always yields the same
/// output. Readings that match no rule, fail the range checks, or arrive
/// after their category is filled are ignored.
pub fn classify(readings: &[RawSensorReading], table: &RuleTable) -> ClassifiedReadings {
    let mut classified = ClassifiedReadings::new();

    for reading in readings {
        let Some(category) = table.resolve(reading) else {
            continue;
        };
        if classified.contains(category) {
            continue;
        }
        if let Some(value) = accept_value(category, reading) {
            classified.fill(category, value);
        }
    }

    classified
}

/// Normalized value if it passes the category's sanity filter.
fn accept_value(category: Category, reading: &RawSensorReading) -> Option<f64> {
    let value = if category.is_gpu_memory() {
        to_gigabytes(reading.value, &reading.unit)
    } else {
        reading.value
    };
    is_sane(category, value).then_some(value)
}

/// Range filter applied before a value is accepted for a category.
///
/// Temperatures must lie in (0, 150); frame rates above 1; everything else
/// finite and positive. Usage has no upper clamp since some producers
/// export raw counters there.
pub fn is_sane(category: Category, value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    if category.is_temperature() {
        return value > TEMPERATURE_MIN && value < TEMPERATURE_MAX;
    }
    if category == Category::Fps {
        return value > FPS_MIN;
    }
    value > 0.0
}

/// Convert a memory amount to GiB based on its unit. Unitless values are
/// taken as MB, which is how the instrumentation namespace reports them.
pub fn to_gigabytes(value: f64, unit: &str) -> f64 {
    match unit.trim().to_lowercase().as_str() {
        "gb" | "gib" => value,
        "kb" | "kib" => value / (1024.0 * 1024.0),
        "b" | "bytes" => value / (1024.0 * 1024.0 * 1024.0),
        _ => value / 1024.0,
    }
}
