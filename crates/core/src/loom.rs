//! Loom geometry shared by workers (assignment) and production entries.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A numbered production line. Each loom has a fixed number of machine slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LoomNumber {
    One,
    Two,
    Three,
}

impl LoomNumber {
    pub const ALL: [LoomNumber; 3] = [LoomNumber::One, LoomNumber::Two, LoomNumber::Three];

    pub fn as_u8(self) -> u8 {
        match self {
            LoomNumber::One => 1,
            LoomNumber::Two => 2,
            LoomNumber::Three => 3,
        }
    }

    /// Highest valid machine slot index on this loom (slots are 1-based).
    pub fn machine_count(self) -> u8 {
        match self {
            LoomNumber::One => 8,
            LoomNumber::Two => 9,
            LoomNumber::Three => 5,
        }
    }

    pub fn accepts_machine(self, index: u8) -> bool {
        (1..=self.machine_count()).contains(&index)
    }
}

impl TryFrom<u8> for LoomNumber {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LoomNumber::One),
            2 => Ok(LoomNumber::Two),
            3 => Ok(LoomNumber::Three),
            _ => Err(DomainError::validation("Invalid loom number")),
        }
    }
}

impl From<LoomNumber> for u8 {
    fn from(value: LoomNumber) -> Self {
        value.as_u8()
    }
}

impl core::fmt::Display for LoomNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_bounds_per_loom() {
        assert!(LoomNumber::One.accepts_machine(8));
        assert!(!LoomNumber::One.accepts_machine(9));
        assert!(LoomNumber::Two.accepts_machine(9));
        assert!(!LoomNumber::Two.accepts_machine(10));
        assert!(LoomNumber::Three.accepts_machine(5));
        assert!(!LoomNumber::Three.accepts_machine(6));
        assert!(!LoomNumber::Three.accepts_machine(0));
    }

    #[test]
    fn serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&LoomNumber::Two).unwrap(), "2");
        let parsed: LoomNumber = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, LoomNumber::Three);
        assert!(serde_json::from_str::<LoomNumber>("4").is_err());
    }
}
