use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DecodeError;

/// Measurement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Diode,
    Frequency,
    DutyCycle,
    Resistance,
    Temperature,
    Continuity,
    Capacitance,
    Current,
    Voltage,
    #[serde(rename = "current gain")]
    CurrentGain,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Diode => f.write_str("diode"),
            Mode::Frequency => f.write_str("frequency"),
            Mode::DutyCycle => f.write_str("duty_cycle"),
            Mode::Resistance => f.write_str("resistance"),
            Mode::Temperature => f.write_str("temperature"),
            Mode::Continuity => f.write_str("continuity"),
            Mode::Capacitance => f.write_str("capacitance"),
            Mode::Current => f.write_str("current"),
            Mode::Voltage => f.write_str("voltage"),
            Mode::CurrentGain => f.write_str("current gain"),
        }
    }
}

/// Scale, decimal point and unit of one measurement range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeDescriptor {
    /// Factor from the displayed value to the base unit
    pub multiplier: f64,
    /// Digits right of the decimal point on the display
    pub decimal_point: u8,
    /// Unit shown next to the displayed value
    pub unit: &'static str,
}

impl RangeDescriptor {
    const fn new(multiplier: f64, decimal_point: u8, unit: &'static str) -> Self {
        Self {
            multiplier,
            decimal_point,
            unit,
        }
    }
}

/// Range used when a frequency reading is switched to duty cycle (2200.0%)
pub const DUTY_CYCLE_RANGE: RangeDescriptor = RangeDescriptor::new(1e0, 1, "%");

#[rustfmt::skip]
static RANGE_DIODE: [RangeDescriptor; 1] = [
    RangeDescriptor::new(1e0, 3, "V"),      // 6.000V
];

#[rustfmt::skip]
static RANGE_FREQUENCY: [RangeDescriptor; 5] = [
    RangeDescriptor::new(1e0, 0, "Hz"),     // 6000Hz
    RangeDescriptor::new(1e3, 2, "kHz"),    // 60.00kHz
    RangeDescriptor::new(1e3, 1, "kHz"),    // 600.0kHz
    RangeDescriptor::new(1e6, 3, "MHz"),    // 6.000MHz
    RangeDescriptor::new(1e6, 2, "MHz"),    // 60.00MHz
];

#[rustfmt::skip]
static RANGE_RESISTANCE: [RangeDescriptor; 6] = [
    RangeDescriptor::new(1e0, 1, "Ω"),      // 600.0Ω
    RangeDescriptor::new(1e3, 3, "kΩ"),     // 6.000kΩ
    RangeDescriptor::new(1e3, 2, "kΩ"),     // 60.00kΩ
    RangeDescriptor::new(1e3, 1, "kΩ"),     // 600.0kΩ
    RangeDescriptor::new(1e6, 3, "MΩ"),     // 6.000MΩ
    RangeDescriptor::new(1e6, 2, "MΩ"),     // 60.00MΩ
];

#[rustfmt::skip]
static RANGE_CONTINUITY: [RangeDescriptor; 1] = [
    RangeDescriptor::new(1e0, 1, "Ω"),      // 600.0Ω
];

#[rustfmt::skip]
static RANGE_CAPACITANCE: [RangeDescriptor; 7] = [
    RangeDescriptor::new(1e-9, 3, "nF"),    // 6.000nF
    RangeDescriptor::new(1e-9, 2, "nF"),    // 60.00nF
    RangeDescriptor::new(1e-9, 1, "nF"),    // 600.0nF
    RangeDescriptor::new(1e-6, 3, "µF"),    // 6.000µF
    RangeDescriptor::new(1e-6, 2, "µF"),    // 60.00µF
    RangeDescriptor::new(1e-6, 1, "µF"),    // 600.0µF
    RangeDescriptor::new(1e-3, 3, "mF"),    // 6.000mF
];

#[rustfmt::skip]
static RANGE_CURRENT_10A: [RangeDescriptor; 1] = [
    RangeDescriptor::new(1e0, 2, "A"),      // 10.00A
];

#[rustfmt::skip]
static RANGE_VOLTAGE: [RangeDescriptor; 5] = [
    RangeDescriptor::new(1e0, 3, "V"),      // 6.000V
    RangeDescriptor::new(1e0, 2, "V"),      // 60.00V
    RangeDescriptor::new(1e0, 1, "V"),      // 600.0V
    RangeDescriptor::new(1e0, 0, "V"),      // 1000V
    RangeDescriptor::new(1e-3, 1, "mV"),    // 600.0mV
];

#[rustfmt::skip]
static RANGE_CURRENT_AUTO_UA: [RangeDescriptor; 2] = [
    RangeDescriptor::new(1e-6, 1, "µA"),    // 600.0µA
    RangeDescriptor::new(1e-6, 0, "µA"),    // 6000µA
];

#[rustfmt::skip]
static RANGE_HFE: [RangeDescriptor; 1] = [
    RangeDescriptor::new(1e0, 0, "hFe"),
];

#[rustfmt::skip]
static RANGE_CURRENT_AUTO_MA: [RangeDescriptor; 2] = [
    RangeDescriptor::new(1e-3, 2, "mA"),    // 60.00mA
    RangeDescriptor::new(1e-3, 1, "mA"),    // 600.0mA
];

/// Measurement function: mode name, range table and base unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionEntry {
    pub mode: Mode,
    /// `None` for functions without a known range table (temperature)
    pub ranges: Option<&'static [RangeDescriptor]>,
    pub unit: &'static str,
}

impl FunctionEntry {
    /// Range descriptor selected by the low nibble of `index`.
    pub fn range(&self, index: u8) -> Result<&'static RangeDescriptor, DecodeError> {
        let ranges = self
            .ranges
            .ok_or(DecodeError::UnsupportedFunction(self.mode))?;
        let index = index & 0x0f;
        ranges.get(usize::from(index)).ok_or(DecodeError::UnknownRange {
            mode: self.mode,
            index,
        })
    }
}

static DIODE: FunctionEntry = FunctionEntry {
    mode: Mode::Diode,
    ranges: Some(&RANGE_DIODE),
    unit: "V",
};

static FREQUENCY: FunctionEntry = FunctionEntry {
    mode: Mode::Frequency,
    ranges: Some(&RANGE_FREQUENCY),
    unit: "Hz",
};

static RESISTANCE: FunctionEntry = FunctionEntry {
    mode: Mode::Resistance,
    ranges: Some(&RANGE_RESISTANCE),
    unit: "Ω",
};

static TEMPERATURE: FunctionEntry = FunctionEntry {
    mode: Mode::Temperature,
    ranges: None,
    unit: "deg",
};

static CONTINUITY: FunctionEntry = FunctionEntry {
    mode: Mode::Continuity,
    ranges: Some(&RANGE_CONTINUITY),
    unit: "Ω",
};

static CAPACITANCE: FunctionEntry = FunctionEntry {
    mode: Mode::Capacitance,
    ranges: Some(&RANGE_CAPACITANCE),
    unit: "F",
};

static CURRENT_10A: FunctionEntry = FunctionEntry {
    mode: Mode::Current,
    ranges: Some(&RANGE_CURRENT_10A),
    unit: "A",
};

static VOLTAGE: FunctionEntry = FunctionEntry {
    mode: Mode::Voltage,
    ranges: Some(&RANGE_VOLTAGE),
    unit: "V",
};

static CURRENT_AUTO_UA: FunctionEntry = FunctionEntry {
    mode: Mode::Current,
    ranges: Some(&RANGE_CURRENT_AUTO_UA),
    unit: "A",
};

static CURRENT_GAIN: FunctionEntry = FunctionEntry {
    mode: Mode::CurrentGain,
    ranges: Some(&RANGE_HFE),
    unit: "",
};

static CURRENT_AUTO_MA: FunctionEntry = FunctionEntry {
    mode: Mode::Current,
    ranges: Some(&RANGE_CURRENT_AUTO_MA),
    unit: "A",
};

/// Function selector, low nibble of the function byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum FunctionCode {
    DIODE = 0x01,
    FREQUENCY = 0x02,
    RESISTANCE = 0x03,
    TEMPERATURE = 0x04,
    CONTINUITY = 0x05,
    CAPACITANCE = 0x06,
    A_10 = 0x09,
    VOLTAGE = 0x0b,
    UA_AUTO = 0x0d,
    HFE = 0x0e,
    MA_AUTO = 0x0f,
}

impl FunctionCode {
    pub fn entry(self) -> &'static FunctionEntry {
        match self {
            FunctionCode::DIODE => &DIODE,
            FunctionCode::FREQUENCY => &FREQUENCY,
            FunctionCode::RESISTANCE => &RESISTANCE,
            FunctionCode::TEMPERATURE => &TEMPERATURE,
            FunctionCode::CONTINUITY => &CONTINUITY,
            FunctionCode::CAPACITANCE => &CAPACITANCE,
            FunctionCode::A_10 => &CURRENT_10A,
            FunctionCode::VOLTAGE => &VOLTAGE,
            FunctionCode::UA_AUTO => &CURRENT_AUTO_UA,
            FunctionCode::HFE => &CURRENT_GAIN,
            FunctionCode::MA_AUTO => &CURRENT_AUTO_MA,
        }
    }
}

/// Look up the function registered for the low nibble of `code`.
pub fn function(code: u8) -> Result<&'static FunctionEntry, DecodeError> {
    FunctionCode::try_from(code & 0x0f)
        .map(FunctionCode::entry)
        .map_err(|err| DecodeError::UnknownFunction(err.number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_functions() {
        assert_eq!(function(0x0b).unwrap().mode, Mode::Voltage);
        assert_eq!(function(0x3b).unwrap().mode, Mode::Voltage);
        assert_eq!(function(0x0e).unwrap().mode, Mode::CurrentGain);
        assert_eq!(function(0x0e).unwrap().unit, "");
        for code in [0x09, 0x0d, 0x0f] {
            let entry = function(code).unwrap();
            assert_eq!(entry.mode, Mode::Current);
            assert_eq!(entry.unit, "A");
        }
    }

    #[test]
    fn test_unknown_functions() {
        for code in [0x00, 0x07, 0x08, 0x0a, 0x0c] {
            assert_eq!(function(code), Err(DecodeError::UnknownFunction(code)));
        }
        assert_eq!(function(0xfa), Err(DecodeError::UnknownFunction(0x0a)));
    }

    #[test]
    fn test_range_lookup() {
        let voltage = function(0x0b).unwrap();
        let range = voltage.range(4).unwrap();
        assert_eq!(range.unit, "mV");
        assert_eq!(range.decimal_point, 1);
        assert_eq!(voltage.range(0x31).unwrap().unit, "V");
        assert_eq!(
            voltage.range(5),
            Err(DecodeError::UnknownRange {
                mode: Mode::Voltage,
                index: 5
            })
        );
    }

    #[test]
    fn test_temperature_has_no_ranges() {
        let temperature = function(0x04).unwrap();
        assert_eq!(
            temperature.range(0),
            Err(DecodeError::UnsupportedFunction(Mode::Temperature))
        );
    }

    #[test]
    fn test_range_tables_consistent() {
        for code in 0..16u8 {
            if let Ok(entry) = function(code) {
                for range in entry.ranges.unwrap_or(&[]) {
                    assert!(range.decimal_point <= 3);
                    assert!(range.multiplier > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::DutyCycle.to_string(), "duty_cycle");
        assert_eq!(Mode::CurrentGain.to_string(), "current gain");
        assert_eq!(
            serde_json::to_string(&Mode::CurrentGain).unwrap(),
            "\"current gain\""
        );
        assert_eq!(
            serde_json::to_string(&Mode::DutyCycle).unwrap(),
            "\"duty_cycle\""
        );
    }
}
