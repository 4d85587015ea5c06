use super::flags::StatusFlags;
use super::registry::{self, Mode, DUTY_CYCLE_RANGE};
use super::{DecodeError, FramingError};
use crate::measurement::{Current, DisplayValue, Measurement, Operation, Peak, RangeMode};

pub const PACKET_LEN: usize = 9;

/// Raw 9 byte packet
///
/// | Byte | Meaning |
/// |---|---|
/// | 0 | range index |
/// | 1-4 | digits, most significant first |
/// | 5 | function code |
/// | 6 | status: OL, BATT, SIGN, JUDGE |
/// | 7 | option 1: 0, MIN, MAX, HOLD |
/// | 8 | option 2: 0, AUTO, AC, DC |
///
/// Only the low nibble of each byte carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet([u8; PACKET_LEN]);

impl Packet {
    pub fn new(bytes: [u8; PACKET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.0
    }

    pub fn range_index(&self) -> u8 {
        self.0[0] & 0x0f
    }

    pub fn digits(&self) -> [u8; 4] {
        [self.0[1], self.0[2], self.0[3], self.0[4]].map(|d| d & 0x0f)
    }

    pub fn function_code(&self) -> u8 {
        self.0[5] & 0x0f
    }

    pub fn status(&self) -> u8 {
        self.0[6]
    }

    pub fn option1(&self) -> u8 {
        self.0[7]
    }

    pub fn option2(&self) -> u8 {
        self.0[8]
    }

    /// Digit readout as an unsigned integer, digit nibbles above 9 are rejected.
    fn readout(&self) -> Result<i32, DecodeError> {
        self.digits()
            .into_iter()
            .enumerate()
            .try_fold(0, |acc, (position, nibble)| {
                if nibble > 9 {
                    Err(DecodeError::InvalidDigit { position, nibble })
                } else {
                    Ok(acc * 10 + i32::from(nibble))
                }
            })
    }

    /// Decode the packet into a measurement.
    ///
    /// Fails on the first violated precondition, in this order: status
    /// bits, function code, range index, AC/DC conflict, digits.
    pub fn decode(&self) -> Result<Measurement, DecodeError> {
        let flags = StatusFlags::decode(self.status(), self.option1(), self.option2())?;

        let function = registry::function(self.function_code())?;
        let mut range = function.range(self.range_index())?;
        let mut mode = function.mode;
        let mut unit = function.unit;

        if mode == Mode::Frequency && flags.judge {
            mode = Mode::DutyCycle;
            unit = "%";
            range = &DUTY_CYCLE_RANGE;
        }

        let current = match (flags.ac, flags.dc) {
            (true, true) => return Err(DecodeError::ConflictingCurrentType),
            (false, true) => Some(Current::DC),
            (true, false) => Some(Current::AC),
            (false, false) => None,
        };

        let operation = if flags.overload {
            Operation::Overload
        } else {
            Operation::Normal
        };

        let range_mode = if flags.auto {
            RangeMode::Auto
        } else {
            RangeMode::Manual
        };

        let peak = if flags.max {
            Some(Peak::Max)
        } else if flags.min {
            Some(Peak::Min)
        } else {
            None
        };

        // The digits of an overloaded reading carry no number
        let display_value = match operation {
            Operation::Normal => {
                let readout = self.readout()?;
                let signed = if flags.sign { -readout } else { readout };
                Some(DisplayValue::new(signed, range.decimal_point))
            }
            Operation::Overload => None,
        };
        let value = display_value.map(|v| v.to_f64() * range.multiplier);

        Ok(Measurement {
            value,
            unit: unit.to_string(),
            display_value,
            display_unit: range.unit.to_string(),
            mode,
            current,
            peak,
            hold: flags.hold,
            range: range_mode,
            operation,
            battery_low: flags.battery_low,
        })
    }
}

impl From<[u8; PACKET_LEN]> for Packet {
    fn from(value: [u8; PACKET_LEN]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = FramingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; PACKET_LEN]>::try_from(value)
            .map(Self)
            .map_err(|_| FramingError::InvalidLength(value.len()))
    }
}

/// Decode a single packet from raw bytes.
pub fn parse(bytes: &[u8]) -> Result<Measurement, DecodeError> {
    Packet::try_from(bytes)?.decode()
}
