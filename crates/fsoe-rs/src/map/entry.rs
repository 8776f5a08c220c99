// crates/fsoe-rs/src/map/entry.rs

use crate::dictionary::DictionaryItem;
use alloc::sync::Arc;

/// One element of a [`DictionaryMap`](super::DictionaryMap).
#[derive(Debug, Clone, PartialEq)]
pub enum MappedEntry {
    /// A safety variable of the dictionary.
    Item(Arc<DictionaryItem>),
    /// Anonymous unused bits.
    Padding(u16),
}

impl MappedEntry {
    pub fn bits(&self) -> u16 {
        match self {
            MappedEntry::Item(item) => item.bits(),
            MappedEntry::Padding(bits) => *bits,
        }
    }

    pub fn item(&self) -> Option<&Arc<DictionaryItem>> {
        match self {
            MappedEntry::Item(item) => Some(item),
            MappedEntry::Padding(_) => None,
        }
    }

    pub fn is_padding(&self) -> bool {
        matches!(self, MappedEntry::Padding(_))
    }

    /// Item name, or `Padding`.
    pub fn name(&self) -> &str {
        match self {
            MappedEntry::Item(item) => &item.name,
            MappedEntry::Padding(_) => "Padding",
        }
    }

    /// True if this entry maps the given item.
    pub fn maps(&self, item: &DictionaryItem) -> bool {
        matches!(self, MappedEntry::Item(mapped) if mapped.name == item.name)
    }
}
