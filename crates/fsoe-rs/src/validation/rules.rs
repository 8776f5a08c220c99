// crates/fsoe-rs/src/validation/rules.rs
use super::{FrameRule, InvalidFrameRule};
use crate::config::FrameLimits;
use crate::frame::Slot;
use crate::map::DictionaryMap;
use crate::types::{C_FSOE_SLOT_WIDTH, C_FSOE_STO_UID, align_up};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::trace;

fn item_names(map: &DictionaryMap) -> Vec<String> {
    map.entries()
        .iter()
        .filter(|entry| !entry.is_padding())
        .map(|entry| entry.name().to_string())
        .collect()
}

/// 1 to `max_safe_data_blocks` blocks; all but the last one full.
pub fn check_safe_data_blocks(
    map: &DictionaryMap,
    slots: &[Slot<'_>],
    limits: &FrameLimits,
) -> Option<InvalidFrameRule> {
    if slots.len() > limits.max_safe_data_blocks {
        return Some(
            InvalidFrameRule::new(
                FrameRule::SafeDataBlocksValid,
                map.role(),
                format!(
                    "Expected 1-{} safe data blocks, found {}",
                    limits.max_safe_data_blocks,
                    slots.len()
                ),
            )
            .with_items(item_names(map))
            .with_counts(slots.len(), limits.max_safe_data_blocks)
            .with_suggestion("Remove items from the map to reduce the safe data size."),
        );
    }

    let (_, full) = slots.split_last()?;
    let short = full
        .iter()
        .find(|slot| slot.used_bits() != C_FSOE_SLOT_WIDTH)?;
    let items = short
        .entries
        .iter()
        .filter_map(|piece| piece.entry)
        .filter(|entry| !entry.is_padding())
        .map(|entry| entry.name().to_string())
        .collect();
    Some(
        InvalidFrameRule::new(
            FrameRule::SafeDataBlocksValid,
            map.role(),
            format!(
                "Safe data block {} uses {} bits, only the last block may use less than {}",
                short.index,
                short.used_bits(),
                C_FSOE_SLOT_WIDTH
            ),
        )
        .with_items(items)
        .with_counts(usize::from(short.used_bits()), usize::from(C_FSOE_SLOT_WIDTH))
        .with_suggestion("Add padding so that every block but the last one is full."),
    )
}

/// Command, entries, CRCs and connection id within the PDO object limit.
pub fn check_objects_in_frame(
    map: &DictionaryMap,
    slots: &[Slot<'_>],
    limits: &FrameLimits,
) -> Option<InvalidFrameRule> {
    let objects = 1 + map.len() + slots.len() + 1;
    trace!("{} map frame has {} objects", map.role(), objects);
    if objects <= limits.max_frame_objects {
        return None;
    }
    Some(
        InvalidFrameRule::new(
            FrameRule::ObjectsInFrame,
            map.role(),
            format!(
                "Frame has {} objects, maximum is {} ({} too many)",
                objects,
                limits.max_frame_objects,
                objects - limits.max_frame_objects
            ),
        )
        .with_items(item_names(map))
        .with_counts(objects, limits.max_frame_objects)
        .with_suggestion("Merge paddings or remove items from the map."),
    )
}

/// Entries narrower than a block must not cross a block boundary.
pub fn check_objects_split(map: &DictionaryMap, slots: &[Slot<'_>]) -> Option<InvalidFrameRule> {
    let mut items = Vec::new();
    let mut details = Vec::new();
    for slot in slots {
        for piece in &slot.entries {
            let Some(entry) = piece.entry else { continue };
            if entry.is_padding() || !piece.is_split() || entry.bits() >= C_FSOE_SLOT_WIDTH {
                continue;
            }
            details.push(format!(
                "{} ({} bits @ {}) is split between blocks {} and {}",
                entry.name(),
                entry.bits(),
                piece.position_bits,
                slot.index,
                slot.index + 1
            ));
            items.push(entry.name().to_string());
        }
    }
    if items.is_empty() {
        return None;
    }
    let count = items.len();
    Some(
        InvalidFrameRule::new(FrameRule::ObjectsSplitRestricted, map.role(), details.join("; "))
            .with_items(items)
            .with_counts(count, 0)
            .with_suggestion("Move the items so they fit in a single safe data block."),
    )
}

/// Entries of a block width or more start on a block boundary.
pub fn check_objects_aligned(map: &DictionaryMap) -> Option<InvalidFrameRule> {
    let misaligned: Vec<(u16, &str)> = map
        .iter()
        .filter(|(position, entry)| {
            !entry.is_padding()
                && entry.bits() >= C_FSOE_SLOT_WIDTH
                && position % C_FSOE_SLOT_WIDTH != 0
        })
        .map(|(position, entry)| (position, entry.name()))
        .collect();
    let &(first, _) = misaligned.first()?;
    let message = misaligned
        .iter()
        .map(|(position, name)| {
            format!(
                "{} starts at bit {}, next valid position is bit {}",
                name,
                position,
                align_up(*position, C_FSOE_SLOT_WIDTH)
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    let items = misaligned.iter().map(|(_, name)| name.to_string()).collect();
    Some(
        InvalidFrameRule::new(FrameRule::ObjectsAligned, map.role(), message)
            .with_items(items)
            .with_counts(
                usize::from(first),
                usize::from(align_up(first, C_FSOE_SLOT_WIDTH)),
            )
            .with_suggestion("Insert padding before the items to align them to 16 bits."),
    )
}

/// `FSOE_STO` must be the first entry of the map.
pub fn check_sto_command_first(map: &DictionaryMap) -> Option<InvalidFrameRule> {
    let message = match map.entries().first() {
        Some(entry) if !entry.is_padding() && entry.name() == C_FSOE_STO_UID => return None,
        Some(entry) => format!(
            "First item must be {}, but found '{}'",
            C_FSOE_STO_UID,
            entry.name()
        ),
        None => format!("Map is empty - no {} item found", C_FSOE_STO_UID),
    };
    Some(
        InvalidFrameRule::new(FrameRule::StoCommandFirst, map.role(), message)
            .with_items(map.entries().first().map(|e| e.name().to_string()).into_iter().collect())
            .with_suggestion("Map the STO command as the first item."),
    )
}
