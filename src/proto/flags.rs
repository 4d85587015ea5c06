use std::collections::BTreeMap;
use thiserror::Error;

use super::DecodeError;

/// Named status bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// Duty cycle in frequency mode, °C/°F in temperature mode
    Judge,
    /// Minus sign on display
    Sign,
    /// Battery low
    Batt,
    /// Input overflow
    Ol,
    Hold,
    Max,
    Min,
    Dc,
    Ac,
    Auto,
}

/// One slot of a template: either a named flag or a bit with a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Flag(Flag),
    Fixed(bool),
}

/// Names for the low 4 bits of a byte, written bit 3 first.
pub type Template = [Slot; 4];

pub const STATUS: Template = [
    Slot::Flag(Flag::Judge),
    Slot::Flag(Flag::Sign),
    Slot::Flag(Flag::Batt),
    Slot::Flag(Flag::Ol),
];

pub const OPTION1: Template = [
    Slot::Flag(Flag::Hold),
    Slot::Flag(Flag::Max),
    Slot::Flag(Flag::Min),
    Slot::Fixed(false),
];

pub const OPTION2: Template = [
    Slot::Flag(Flag::Dc),
    Slot::Flag(Flag::Ac),
    Slot::Flag(Flag::Auto),
    Slot::Fixed(false),
];

/// Offset of the status byte inside a packet, option bytes follow.
const STATUS_BYTE_OFFSET: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fixed bit {bit} expected to be {expected}")]
pub struct TemplateMismatch {
    pub bit: u8,
    pub expected: bool,
}

fn test_bit(value: u8, offset: u8) -> bool {
    value & (1 << offset) > 0
}

/// Extract the named bits of `value` according to `template`.
///
/// Bit 0 is matched against the last slot of the template. Fixed slots
/// must match the bit exactly, otherwise the byte is rejected.
pub fn get_bits(value: u8, template: &Template) -> Result<BTreeMap<Flag, bool>, TemplateMismatch> {
    let mut bits = BTreeMap::new();
    for bit in 0..4u8 {
        let set = test_bit(value, bit);
        match template[usize::from(3 - bit)] {
            Slot::Fixed(expected) if expected == set => {}
            Slot::Fixed(expected) => return Err(TemplateMismatch { bit, expected }),
            Slot::Flag(flag) => {
                bits.insert(flag, set);
            }
        }
    }
    Ok(bits)
}

/// Flags decoded from the status and both option bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub judge: bool,
    pub sign: bool,
    pub battery_low: bool,
    pub overload: bool,
    pub hold: bool,
    pub max: bool,
    pub min: bool,
    pub dc: bool,
    pub ac: bool,
    pub auto: bool,
}

impl StatusFlags {
    pub fn decode(status: u8, option1: u8, option2: u8) -> Result<Self, DecodeError> {
        let mut bits = BTreeMap::new();
        let bytes = [(status, &STATUS), (option1, &OPTION1), (option2, &OPTION2)];
        for (index, (value, template)) in bytes.into_iter().enumerate() {
            let decoded =
                get_bits(value, template).map_err(|source| DecodeError::InvalidStatusBits {
                    byte: STATUS_BYTE_OFFSET + index,
                    source,
                })?;
            bits.extend(decoded);
        }

        let flag = |name: Flag| bits.get(&name).copied().unwrap_or(false);
        Ok(Self {
            judge: flag(Flag::Judge),
            sign: flag(Flag::Sign),
            battery_low: flag(Flag::Batt),
            overload: flag(Flag::Ol),
            hold: flag(Flag::Hold),
            max: flag(Flag::Max),
            min: flag(Flag::Min),
            dc: flag(Flag::Dc),
            ac: flag(Flag::Ac),
            auto: flag(Flag::Auto),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_template_order() {
        // bit0=OL, bit1=BATT, bit2=SIGN, bit3=JUDGE
        let bits = get_bits(0b0101, &STATUS).unwrap();
        assert_eq!(bits.get(&Flag::Ol), Some(&true));
        assert_eq!(bits.get(&Flag::Batt), Some(&false));
        assert_eq!(bits.get(&Flag::Sign), Some(&true));
        assert_eq!(bits.get(&Flag::Judge), Some(&false));
        assert_eq!(bits.len(), 4);
    }

    #[test]
    fn test_high_nibble_ignored() {
        assert_eq!(get_bits(0x38, &OPTION2), get_bits(0x08, &OPTION2));
    }

    #[test]
    fn test_fixed_slot_not_in_map() {
        let bits = get_bits(0b1110, &OPTION1).unwrap();
        assert_eq!(bits.len(), 3);
        assert!(bits.values().all(|set| *set));
    }

    #[test]
    fn test_fixed_slot_mismatch() {
        assert_eq!(
            get_bits(0x01, &OPTION1),
            Err(TemplateMismatch {
                bit: 0,
                expected: false
            })
        );
    }

    #[test]
    fn test_fixed_one_slot() {
        let template = [
            Slot::Fixed(true),
            Slot::Flag(Flag::Hold),
            Slot::Fixed(false),
            Slot::Fixed(true),
        ];
        let bits = get_bits(0b1101, &template).unwrap();
        assert_eq!(bits.get(&Flag::Hold), Some(&true));
        assert_eq!(
            get_bits(0b0101, &template),
            Err(TemplateMismatch {
                bit: 3,
                expected: true
            })
        );
    }

    #[test]
    fn test_decode_status_flags() {
        let flags = StatusFlags::decode(0x0f, 0x0e, 0x0a).unwrap();
        assert!(flags.judge && flags.sign && flags.battery_low && flags.overload);
        assert!(flags.hold && flags.max && flags.min);
        assert!(flags.dc && !flags.ac && flags.auto);
    }

    #[test]
    fn test_decode_reports_byte_offset() {
        assert_eq!(
            StatusFlags::decode(0x00, 0x00, 0x01),
            Err(DecodeError::InvalidStatusBits {
                byte: 8,
                source: TemplateMismatch {
                    bit: 0,
                    expected: false
                }
            })
        );
    }
}
