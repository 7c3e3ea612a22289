//! Exception-handling clause kinds as stored in the binder's EH tables.
use std::fmt;

/// Two-bit classification of a protected-region clause.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EHClauseKind {
    Typed = 0,
    Fault = 1,
    Filter = 2,
    /// Also written by the binder as [`EHClauseKind::TYPED_INDIRECT`], so it does
    /// appear in valid tables.
    Unused = 3,
}

impl EHClauseKind {
    /// Typed clause whose type is reached through an indirection cell.
    pub const TYPED_INDIRECT: EHClauseKind = EHClauseKind::Unused;

    pub const MASK: u32 = 0b11;

    /// Decodes the low two bits; higher bits belong to the surrounding table entry.
    pub fn from_bits(bits: u32) -> Self {
        match bits & Self::MASK {
            0 => EHClauseKind::Typed,
            1 => EHClauseKind::Fault,
            2 => EHClauseKind::Filter,
            _ => EHClauseKind::Unused,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for EHClauseKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > Self::MASK {
            return Err(value);
        }
        Ok(Self::from_bits(value))
    }
}

impl From<EHClauseKind> for u32 {
    fn from(kind: EHClauseKind) -> u32 {
        kind.bits()
    }
}

impl fmt::Display for EHClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EHClauseKind::Typed => "typed",
            EHClauseKind::Fault => "fault",
            EHClauseKind::Filter => "filter",
            EHClauseKind::Unused => "unused",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_values() {
        assert_eq!(EHClauseKind::Typed as u8, 0);
        assert_eq!(EHClauseKind::Fault as u8, 1);
        assert_eq!(EHClauseKind::Filter as u8, 2);
        assert_eq!(EHClauseKind::Unused as u8, 3);
        assert_eq!(EHClauseKind::TYPED_INDIRECT, EHClauseKind::Unused);
    }

    #[test]
    fn test_two_bit_round_trip() {
        for bits in 0..4u32 {
            assert_eq!(EHClauseKind::from_bits(bits).bits(), bits);
            assert_eq!(u32::from(EHClauseKind::try_from(bits).unwrap()), bits);
        }
        assert_eq!(EHClauseKind::from_bits(0xfffc | 2), EHClauseKind::Filter);
        assert_eq!(EHClauseKind::try_from(4), Err(4));
    }
}
