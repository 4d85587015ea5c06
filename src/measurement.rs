use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, BoolFromInt, DisplayFromStr};
use std::fmt::{self, Display};
use std::str::FromStr;

pub use crate::proto::registry::Mode;

/// Decimal number exactly as shown on the display
///
/// Stored as the signed digit readout and the position of the decimal
/// point, so `6.000` and `6.0` compare equal but keep their precision
/// when printed.
#[derive(Debug, Clone, Copy)]
pub struct DisplayValue {
    digits: i32,
    decimal_point: u8,
}

impl DisplayValue {
    /// `decimal_point` must not exceed 9.
    pub fn new(digits: i32, decimal_point: u8) -> Self {
        Self {
            digits,
            decimal_point,
        }
    }

    /// Signed readout without decimal point
    pub fn digits(&self) -> i32 {
        self.digits
    }

    /// Digits right of the decimal point
    pub fn decimal_point(&self) -> u8 {
        self.decimal_point
    }

    pub fn to_f64(&self) -> f64 {
        f64::from(self.digits) / 10_f64.powi(i32::from(self.decimal_point))
    }

    fn scaled(&self, decimal_point: u8) -> i64 {
        i64::from(self.digits) * 10_i64.pow(u32::from(decimal_point - self.decimal_point))
    }
}

impl PartialEq for DisplayValue {
    fn eq(&self, other: &Self) -> bool {
        let decimal_point = self.decimal_point.max(other.decimal_point);
        self.scaled(decimal_point) == other.scaled(decimal_point)
    }
}

impl Eq for DisplayValue {}

impl Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.digits < 0 { "-" } else { "" };
        let abs = self.digits.unsigned_abs();
        let width = usize::from(self.decimal_point);
        if width == 0 {
            f.write_fmt(format_args!("{}{}", sign, abs))
        } else {
            let pow = 10_u32.pow(u32::from(self.decimal_point));
            f.write_fmt(format_args!(
                "{}{}.{:0width$}",
                sign,
                abs / pow,
                abs % pow
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid display value: {0:?}")]
pub struct ParseDisplayValueError(String);

impl FromStr for DisplayValue {
    type Err = ParseDisplayValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDisplayValueError(s.to_string());
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let digits: i32 = format!("{}{}", int, frac).parse().map_err(|_| err())?;
        Ok(Self::new(digits, frac.len() as u8))
    }
}

/// Current type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Current {
    AC,
    DC,
}

impl Display for Current {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Current::AC => f.write_str("AC"),
            Current::DC => f.write_str("DC"),
        }
    }
}

/// Min/Max recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Peak {
    Max,
    Min,
}

impl Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peak::Max => f.write_str("max"),
            Peak::Min => f.write_str("min"),
        }
    }
}

/// Range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    Auto,
    Manual,
}

impl Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeMode::Auto => f.write_str("auto"),
            RangeMode::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Normal,
    Overload,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Normal => f.write_str("normal"),
            Operation::Overload => f.write_str("overload"),
        }
    }
}

/// Decoded measurement of a single packet
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Value in base unit, e.g. 0.0006 for 600.0µA. `None` on overload.
    pub value: Option<f64>,
    /// Base unit
    pub unit: String,
    /// Value as shown on the display. `None` on overload.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub display_value: Option<DisplayValue>,
    /// Unit shown on the display
    pub display_unit: String,
    pub mode: Mode,
    pub current: Option<Current>,
    pub peak: Option<Peak>,
    pub hold: bool,
    pub range: RangeMode,
    pub operation: Operation,
    pub battery_low: bool,
}

/// Column names of the delimited field list
pub const CSV_FIELDS: [&str; 8] = [
    "value",
    "unit",
    "mode",
    "current",
    "operation",
    "peak",
    "battery_low",
    "hold",
];

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn optional<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Measurement {
    /// Value, only present if the reading is not overloaded.
    pub fn normal_value(&self) -> Option<f64> {
        self.value.filter(|_| self.operation == Operation::Normal)
    }

    /// Fields in [`CSV_FIELDS`] order.
    pub fn csv_fields(&self) -> [String; 8] {
        [
            self.normal_value()
                .map(|v| format!("{:?}", v))
                .unwrap_or_default(),
            self.unit.clone(),
            self.mode.to_string(),
            optional(self.current),
            self.operation.to_string(),
            optional(self.peak),
            flag(self.battery_low),
            flag(self.hold),
        ]
    }

    /// One line for the plot output, e.g. `voltage: 6.0V`.
    pub fn plot_line(&self) -> String {
        match self.normal_value() {
            Some(value) => format!("{}: {:?}{}", self.mode, value, self.unit),
            None => format!("{}: {}", self.mode, self.operation),
        }
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operation, &self.display_value) {
            (Operation::Normal, Some(value)) => {
                f.write_fmt(format_args!("{} {}", value, self.display_unit))?
            }
            (operation, _) => {
                f.write_fmt(format_args!("-, the measurement is {}ed!", operation))?
            }
        }
        if self.battery_low {
            f.write_str(" Battery low!")?;
        }
        Ok(())
    }
}

/// Timestamped CSV row
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct CsvRecord {
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
    pub unit: String,
    pub mode: Mode,
    pub current: Option<Current>,
    pub operation: Operation,
    pub peak: Option<Peak>,
    #[serde_as(as = "BoolFromInt")]
    pub battery_low: bool,
    #[serde_as(as = "BoolFromInt")]
    pub hold: bool,
}

impl CsvRecord {
    pub fn new(timestamp: NaiveDateTime, value: &Measurement) -> Self {
        Self {
            timestamp,
            value: value.normal_value(),
            unit: value.unit.clone(),
            mode: value.mode,
            current: value.current,
            operation: value.operation,
            peak: value.peak,
            battery_low: value.battery_low,
            hold: value.hold,
        }
    }
}
