//! Slot addressing: grid coordinates and human room numbers.
//!
//! A [`SlotAddress`] is `(floor, row, col)`, zero-based, with floor 0 being
//! the *top* floor. It serializes as the key `"<floor>-<row>-<col>"`.
//!
//! A room number reads `<floor><sep><row letters><col number>`, e.g. `3-B12`:
//! floor number counted from the bottom starting at 1, row as bijective
//! base-26 letters (`A` = 0, `Z` = 25, `AA` = 26), column starting at 1.
//!
//! ```
//! use hallplan_logic::slot::{room_number_to_slot, slot_to_room_number, SlotAddress};
//!
//! let slot = room_number_to_slot("3-B12", 5).unwrap();
//! assert_eq!(slot, SlotAddress::new(2, 1, 11));
//! assert_eq!(slot_to_room_number(slot, 5), "3-B12");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the floor number and the grid part of a room number.
pub const ROOM_NUMBER_SEPARATOR: char = '-';

/// One addressable cell of a floor grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotAddress {
    /// Floor index, 0 = top floor.
    pub floor: u32,
    pub row: u32,
    pub col: u32,
}

impl SlotAddress {
    pub fn new(floor: u32, row: u32, col: u32) -> Self {
        Self { floor, row, col }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.floor, self.row, self.col)
    }
}

/// Malformed slot key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSlotError(pub String);

impl fmt::Display for ParseSlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid slot key '{}'", self.0)
    }
}

impl std::error::Error for ParseSlotError {}

impl FromStr for SlotAddress {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSlotError(s.to_string());
        let mut parts = s.split('-');
        let mut next = || -> Result<u32, ParseSlotError> {
            parts.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let slot = SlotAddress::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(slot)
    }
}

impl TryFrom<String> for SlotAddress {
    type Error = ParseSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotAddress> for String {
    fn from(slot: SlotAddress) -> Self {
        slot.to_string()
    }
}

/// Bijective base-26 encoding: 0 → `A`, 25 → `Z`, 26 → `AA`, 701 → `ZZ`.
pub fn index_to_letters(index: u64) -> String {
    let mut letters = Vec::new();
    // n + 1 avoids the zero digit; u128 keeps u64::MAX from overflowing
    let mut n = index as u128 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.into_iter().rev().collect()
}

/// Inverse of [`index_to_letters`]. Case-insensitive.
///
/// Returns `None` for an empty string, any non-ASCII-letter character, or a
/// value that doesn't fit in `u64`.
pub fn letters_to_index(letters: &str) -> Option<u64> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: u128 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u128 + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    u64::try_from(acc - 1).ok()
}

/// Parse a room number into a slot for a building with `floors` floors.
///
/// Returns `None` if the number doesn't match `<digits>-<letters><digits>`,
/// or if any derived index would be negative.
pub fn room_number_to_slot(room_number: &str, floors: u32) -> Option<SlotAddress> {
    let (floor_part, grid_part) = room_number.trim().split_once(ROOM_NUMBER_SEPARATOR)?;
    if floor_part.is_empty() || !floor_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let floor_number: u64 = floor_part.parse().ok()?;

    let split = grid_part
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(grid_part.len());
    let (row_letters, col_digits) = grid_part.split_at(split);
    if col_digits.is_empty() || !col_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let col_number: u64 = col_digits.parse().ok()?;

    let floor = (floors as u64).checked_sub(floor_number)?;
    let row = letters_to_index(row_letters)?;
    let col = col_number.checked_sub(1)?;

    Some(SlotAddress::new(
        u32::try_from(floor).ok()?,
        u32::try_from(row).ok()?,
        u32::try_from(col).ok()?,
    ))
}

/// Format a slot as a room number. Inverse of [`room_number_to_slot`] for
/// `slot.floor < floors`.
pub fn slot_to_room_number(slot: SlotAddress, floors: u32) -> String {
    let floor_number = floors.saturating_sub(slot.floor);
    format!(
        "{}{}{}{}",
        floor_number,
        ROOM_NUMBER_SEPARATOR,
        index_to_letters(slot.row as u64),
        slot.col as u64 + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_known_values() {
        assert_eq!(index_to_letters(0), "A");
        assert_eq!(index_to_letters(25), "Z");
        assert_eq!(index_to_letters(26), "AA");
        assert_eq!(index_to_letters(27), "AB");
        assert_eq!(index_to_letters(701), "ZZ");
        assert_eq!(index_to_letters(702), "AAA");
    }

    #[test]
    fn letters_roundtrip_first_ten_thousand() {
        for n in 0..=10_000u64 {
            assert_eq!(letters_to_index(&index_to_letters(n)), Some(n), "n = {n}");
        }
    }

    #[test]
    fn letters_handle_u64_max() {
        let letters = index_to_letters(u64::MAX);
        assert_eq!(letters_to_index(&letters), Some(u64::MAX));
        // one past the end overflows
        assert_eq!(letters_to_index(&format!("{letters}A")), None);
    }

    #[test]
    fn letters_case_insensitive() {
        assert_eq!(letters_to_index("ab"), Some(27));
        assert_eq!(letters_to_index("aB"), letters_to_index("AB"));
    }

    #[test]
    fn letters_reject_non_alpha() {
        assert_eq!(letters_to_index(""), None);
        assert_eq!(letters_to_index("A1"), None);
        assert_eq!(letters_to_index("É"), None);
        assert_eq!(letters_to_index("-"), None);
    }

    #[test]
    fn room_number_parses() {
        assert_eq!(
            room_number_to_slot("3-B12", 5),
            Some(SlotAddress::new(2, 1, 11))
        );
        assert_eq!(room_number_to_slot("1-a1", 1), Some(SlotAddress::new(0, 0, 0)));
    }

    #[test]
    fn room_number_rejects_malformed() {
        assert_eq!(room_number_to_slot("X-B12", 5), None);
        assert_eq!(room_number_to_slot("3B12", 5), None);
        assert_eq!(room_number_to_slot("3-12", 5), None);
        assert_eq!(room_number_to_slot("3-B", 5), None);
        assert_eq!(room_number_to_slot("3-B1x", 5), None);
        assert_eq!(room_number_to_slot("", 5), None);
        assert_eq!(room_number_to_slot("-B12", 5), None);
    }

    #[test]
    fn room_number_rejects_negative_indices() {
        // floor number above the building
        assert_eq!(room_number_to_slot("6-A1", 5), None);
        // column 0 would be index -1
        assert_eq!(room_number_to_slot("2-A0", 5), None);
    }

    #[test]
    fn room_number_roundtrip() {
        for floors in 1..6u32 {
            for floor in 0..floors {
                for row in [0u32, 1, 25, 26, 700] {
                    for col in [0u32, 9, 99] {
                        let slot = SlotAddress::new(floor, row, col);
                        let number = slot_to_room_number(slot, floors);
                        assert_eq!(room_number_to_slot(&number, floors), Some(slot), "{number}");
                    }
                }
            }
        }
    }

    #[test]
    fn slot_key_format() {
        let slot = SlotAddress::new(0, 3, 12);
        assert_eq!(slot.to_string(), "0-3-12");
        assert_eq!("0-3-12".parse::<SlotAddress>(), Ok(slot));
        assert!("0-3".parse::<SlotAddress>().is_err());
        assert!("0-3-12-1".parse::<SlotAddress>().is_err());
        assert!("a-b-c".parse::<SlotAddress>().is_err());
    }

    #[test]
    fn slot_serializes_as_key_string() {
        let slot = SlotAddress::new(1, 2, 3);
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"1-2-3\"");
        let back: SlotAddress = serde_json::from_str("\"1-2-3\"").unwrap();
        assert_eq!(back, slot);
    }
}
