//! Translation between the three forms of a slot: index, numeric id and name.

use std::ffi::CStr;
use std::fmt;

/// Number of slots in the reserved window.
pub const SLOT_COUNT: u32 = 10_000;
/// First numeric id of the window, shared by uids and gids.
pub const SLOT_UID_LO: u32 = 20_000;
/// One past the last numeric id of the window.
pub const SLOT_UID_HI: u32 = SLOT_UID_LO + SLOT_COUNT;

pub const SLOT_NAME_PREFIX: u8 = b's';
pub const SLOT_NAME_DIGITS: usize = 4;
/// Length of a slot name, not counting the terminator.
pub const SLOT_NAME_LEN: usize = 1 + SLOT_NAME_DIGITS;

pub fn is_valid_slot_index(slot: u32) -> bool {
    slot < SLOT_COUNT
}

pub fn is_valid_numeric_id(id: u32) -> bool {
    SLOT_UID_LO <= id && id < SLOT_UID_HI
}

/// Slot index of a numeric id. The id must already be validated; an id below
/// the window wraps to an index that `is_valid_slot_index` rejects.
pub fn slot_index_of(id: u32) -> u32 {
    id.wrapping_sub(SLOT_UID_LO)
}

/// Numeric id of a slot index. The index must already be validated.
pub fn numeric_id_of(slot: u32) -> u32 {
    SLOT_UID_LO.wrapping_add(slot)
}

/// Parses `sNNNN` into its slot index.
///
/// Anything else (wrong length, wrong prefix, a non-digit) yields `None`. Four
/// digits can't exceed `SLOT_COUNT - 1`, so a parsed name is always in range.
pub fn parse_name(name: &[u8]) -> Option<u32> {
    let (&prefix, digits) = name.split_first()?;
    if name.len() != SLOT_NAME_LEN || prefix != SLOT_NAME_PREFIX {
        return None;
    }

    digits.iter().try_fold(0u32, |slot, &digit| {
        if digit.is_ascii_digit() {
            Some(slot * 10 + u32::from(digit - b'0'))
        } else {
            None
        }
    })
}

/// Canonical name of a slot, or `None` outside the window.
pub fn format_name(slot: u32) -> Option<SlotName> {
    if !is_valid_slot_index(slot) {
        return None;
    }

    let mut bytes = [0u8; SLOT_NAME_LEN + 1];
    bytes[0] = SLOT_NAME_PREFIX;
    let mut rest = slot;
    for digit in bytes[1..=SLOT_NAME_DIGITS].iter_mut().rev() {
        *digit = b'0' + (rest % 10) as u8;
        rest /= 10;
    }

    Some(SlotName(bytes))
}

/// A NUL-terminated `sNNNN` name, held inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotName([u8; SLOT_NAME_LEN + 1]);

impl SlotName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..SLOT_NAME_LEN]
    }

    pub fn as_str(&self) -> &str {
        // Built from ASCII only
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn as_cstr(&self) -> &CStr {
        CStr::from_bytes_with_nul(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotName({:?})", self.as_str())
    }
}
