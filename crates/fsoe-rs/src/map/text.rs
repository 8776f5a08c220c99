// crates/fsoe-rs/src/map/text.rs

use super::DictionaryMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

const DEFAULT_ITEM_SPACE: usize = 40;
const COLUMN_SPACE: usize = 20;

fn bytes_dot_bits(bits: u16) -> String {
    format!("{}..{}", bits / 8, bits % 8)
}

impl DictionaryMap {
    /// Renders the map as a table of item, position and size, one row per
    /// entry. `item_space` is the width of the first column.
    pub fn text_representation(&self, item_space: usize) -> String {
        let column = COLUMN_SPACE;
        let mut lines = Vec::with_capacity(self.len() + 1);
        lines.push(format!(
            "{:<item_space$} | {:<column$} | {:<column$}",
            "Item", "Position bytes..bits", "Size bytes..bits"
        ));
        for (position, entry) in self.iter() {
            lines.push(format!(
                "{:<item_space$} | {:<column$} | {:<column$}",
                entry.name(),
                bytes_dot_bits(position),
                bytes_dot_bits(entry.bits())
            ));
        }
        lines.join("\n")
    }
}

impl fmt::Display for DictionaryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text_representation(DEFAULT_ITEM_SPACE))
    }
}
