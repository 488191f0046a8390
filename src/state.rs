//! Relay state
//!
//! Snapshot of which relays were on at the last status query.

use std::fmt;

/// Ordered on/off flags; index `i` describes relay `i + 1`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayState {
    relays: Vec<bool>,
}

impl RelayState {
    /// Unpack a status bitmask, least-significant bit first
    ///
    /// Relays beyond bit 31 can never be reported and read as off.
    pub fn from_mask(mask: u32, number_of_relays: usize) -> Self {
        let relays = (0..number_of_relays)
            .map(|index| index < 32 && (mask >> index) & 1 != 0)
            .collect();
        Self { relays }
    }

    /// State of a 1-based relay, `None` if the board has no such relay
    pub fn is_on(&self, relay_number: usize) -> Option<bool> {
        relay_number
            .checked_sub(1)
            .and_then(|index| self.relays.get(index).copied())
    }

    /// Number of relays described
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.relays
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.relays.iter().copied()
    }

    /// Re-pack into the wire bitmask
    pub fn mask(&self) -> u32 {
        self.relays
            .iter()
            .take(32)
            .enumerate()
            .filter(|(_, &on)| on)
            .fold(0u32, |mask, (index, _)| mask | (1 << index))
    }

    /// 1-based numbers of the relays that are on
    pub fn active(&self) -> Vec<usize> {
        self.relays
            .iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(index, _)| index + 1)
            .collect()
    }
}

impl fmt::Display for RelayState {
    /// One line per relay: `relay  3: on`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, on) in self.relays.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "relay {:>2}: {}", index + 1, if *on { "on" } else { "off" })?;
        }
        Ok(())
    }
}
