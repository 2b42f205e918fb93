use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, fmt::Write as _, time::Duration};

/// Offset between the Celsius and Kelvin scales.
pub const CELSIUS_OFFSET: f64 = 273.15;

/// A temperature reading in Kelvin.
///
/// Every provider normalizes to this unit before readings are combined.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(transparent)]
pub struct Kelvin(pub f64);

/// Whole values are written without a fraction (`289`, not `289.0`),
/// matching Go's JSON encoder.
impl Serialize for Kelvin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl Kelvin {
    pub fn from_celsius(celsius: f64) -> Self {
        Self(celsius + CELSIUS_OFFSET)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Arithmetic mean of the given readings, `None` when there are none.
    pub fn mean(readings: &[Kelvin]) -> Option<Kelvin> {
        if readings.is_empty() {
            return None;
        }

        let sum: f64 = readings.iter().map(|k| k.0).sum();
        Some(Kelvin(sum / readings.len() as f64))
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}K", self.0)
    }
}

/// Body of a successful `/weather/{city}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temp: Kelvin,
    pub took: String,
}

impl WeatherReport {
    pub fn new(city: impl Into<String>, temp: Kelvin, took: Duration) -> Self {
        Self { city: city.into(), temp, took: format_duration(took) }
    }
}

/// Formats a duration the way Go's `time.Duration.String()` does,
/// e.g. `850ns`, `1.234ms`, `2.5s`, `1m30s`, `1h0m0s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs_nanos = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", decimal(secs_nanos, 1_000_000_000));
    out
}

/// `value / unit` as a decimal string with trailing zeros removed.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
