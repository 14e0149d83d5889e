//! Logical motor channels.
//!
//! The board carries two dual H-bridge driver chips. Protocol index `0..=3` maps
//! onto their terminals in a fixed order:
//!
//! | index | channel | chip | terminal |
//! | ----- | ------- | ---- | -------- |
//! | 0     | `M1A`   | 1    | A        |
//! | 1     | `M1B`   | 1    | B        |
//! | 2     | `M2A`   | 2    | A        |
//! | 3     | `M2B`   | 2    | B        |

use std::fmt;

/// Output terminal pair on a driver chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    A,
    B,
}

/// One of the four logical motor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Motor {
    M1A,
    M1B,
    M2A,
    M2B,
}

impl Motor {
    /// All channels in protocol index order.
    pub const ALL: [Motor; 4] = [Motor::M1A, Motor::M1B, Motor::M2A, Motor::M2B];

    /// Resolve a protocol motor index.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Protocol index of this channel.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Driver chip number, 1 or 2.
    pub fn chip(self) -> u8 {
        match self {
            Motor::M1A | Motor::M1B => 1,
            Motor::M2A | Motor::M2B => 2,
        }
    }

    pub fn terminal(self) -> Terminal {
        match self {
            Motor::M1A | Motor::M2A => Terminal::A,
            Motor::M1B | Motor::M2B => Terminal::B,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Motor::M1A => "M1A",
            Motor::M1B => "M1B",
            Motor::M2A => "M2A",
            Motor::M2B => "M2B",
        }
    }
}

impl fmt::Display for Motor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_table() {
        assert_eq!(Motor::from_index(0), Some(Motor::M1A));
        assert_eq!(Motor::from_index(1), Some(Motor::M1B));
        assert_eq!(Motor::from_index(2), Some(Motor::M2A));
        assert_eq!(Motor::from_index(3), Some(Motor::M2B));
        assert_eq!(Motor::from_index(4), None);
        assert_eq!(Motor::from_index(-1), None);
    }

    #[test]
    fn index_round_trips_through_table() {
        for motor in Motor::ALL {
            assert_eq!(Motor::from_index(motor.index() as i32), Some(motor));
        }
    }

    #[test]
    fn chip_and_terminal() {
        assert_eq!((Motor::M1A.chip(), Motor::M1A.terminal()), (1, Terminal::A));
        assert_eq!((Motor::M1B.chip(), Motor::M1B.terminal()), (1, Terminal::B));
        assert_eq!((Motor::M2A.chip(), Motor::M2A.terminal()), (2, Terminal::A));
        assert_eq!((Motor::M2B.chip(), Motor::M2B.terminal()), (2, Terminal::B));
        assert_eq!(Motor::M2B.to_string(), "M2B");
    }
}
