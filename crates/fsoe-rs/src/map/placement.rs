// crates/fsoe-rs/src/map/placement.rs

use super::{DictionaryMap, MappedEntry};
use crate::FsoeError;
use crate::dictionary::DictionaryItem;
use crate::log::my_trace;
use crate::types::C_FSOE_SLOT_WIDTH;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// First position at or after `from` that is a multiple of `align_to` and
/// on which an item narrower than a slot does not cross a slot boundary.
fn placement_from(from: u16, bits: u16, align_to: u16) -> u32 {
    let slot = u32::from(C_FSOE_SLOT_WIDTH);
    let (bits, align_to) = (u32::from(bits), u32::from(align_to).max(1));
    let position = u32::from(from).div_ceil(align_to) * align_to;
    if bits < slot && position / slot != (position + bits - 1) / slot {
        (position + 1).div_ceil(slot) * slot
    } else {
        position
    }
}

impl DictionaryMap {
    /// Inserts `item` in the first padding run that can host it at a
    /// position aligned to `align_to`, or appends it at the end.
    ///
    /// The padding run is shrunk around the item, so no other mapped item
    /// moves. When appending, alignment padding is added first if needed.
    /// Returns the bit position of the inserted item.
    pub fn insert_in_best_position(
        &mut self,
        item: &Arc<DictionaryItem>,
        align_to: u16,
    ) -> Result<u16, FsoeError> {
        self.check_accepts(item)?;
        let bits = item.bits();

        let mut position = 0u16;
        let mut index = 0usize;
        while index < self.entries.len() {
            if !self.entries[index].is_padding() {
                position += self.entries[index].bits();
                index += 1;
                continue;
            }

            // Consecutive paddings form a single free run.
            let run_start = position;
            let mut run_end_index = index;
            while run_end_index < self.entries.len() && self.entries[run_end_index].is_padding() {
                position += self.entries[run_end_index].bits();
                run_end_index += 1;
            }
            let run_end = position;

            let candidate = placement_from(run_start, bits, align_to);
            if candidate + u32::from(bits) <= u32::from(run_end) {
                // Fits inside the run, so it is below `run_end`.
                let candidate = candidate as u16;
                let mut replacement = Vec::with_capacity(3);
                if candidate > run_start {
                    replacement.push(MappedEntry::Padding(candidate - run_start));
                }
                replacement.push(MappedEntry::Item(item.clone()));
                if run_end > candidate + bits {
                    replacement.push(MappedEntry::Padding(run_end - candidate - bits));
                }
                self.entries.splice(index..run_end_index, replacement);
                my_trace!(
                    self.role,
                    "Inserted {} in free bits {}..{} at position {}",
                    item.name,
                    run_start,
                    run_end,
                    candidate
                );
                return Ok(candidate);
            }
            index = run_end_index;
        }

        let candidate = placement_from(position, bits, align_to);
        let growth = candidate - u32::from(position) + u32::from(bits);
        self.check_room(u16::try_from(growth).unwrap_or(u16::MAX))?;
        // The map stays below `C_FSOE_MAX_MAP_BITS`, so the position fits.
        let candidate = candidate as u16;
        if candidate > position {
            self.entries.push(MappedEntry::Padding(candidate - position));
        }
        self.entries.push(MappedEntry::Item(item.clone()));
        my_trace!(self.role, "Appended {} at position {}", item.name, candidate);
        Ok(candidate)
    }
}
