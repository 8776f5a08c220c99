// crates/fsoe-rs/src/dictionary/mod.rs

mod item;
mod value;

pub use item::{DictionaryItem, ItemKind};
pub use value::SafeValue;

use crate::FsoeError;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use log::{debug, error};

/// Immutable catalogue of the safety variables of a device.
///
/// Items are shared with every map that references them, so lookups hand
/// out `Arc`s instead of copies.
#[derive(Debug, Clone, Default)]
pub struct SafetyItemDictionary {
    items: Vec<Arc<DictionaryItem>>,
    name_map: BTreeMap<String, Arc<DictionaryItem>>,
    key_map: BTreeMap<u32, Arc<DictionaryItem>>,
}

impl SafetyItemDictionary {
    /// Builds the dictionary. Names and keys must be unique.
    pub fn new<I>(items: I) -> Result<Self, FsoeError>
    where
        I: IntoIterator<Item = DictionaryItem>,
    {
        let mut dictionary = Self::default();
        for item in items {
            if dictionary.name_map.contains_key(&item.name)
                || dictionary.key_map.contains_key(&item.key)
            {
                error!(
                    "Safety item {} (key {}) is defined twice in the dictionary",
                    item.name, item.key
                );
                return Err(FsoeError::DuplicateItem(item.name));
            }
            let item = Arc::new(item);
            dictionary.name_map.insert(item.name.clone(), item.clone());
            dictionary.key_map.insert(item.key, item.clone());
            dictionary.items.push(item);
        }
        debug!("Safety dictionary loaded with {} items", dictionary.items.len());
        Ok(dictionary)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DictionaryItem>> {
        self.name_map.get(name)
    }

    /// Like [`get`](Self::get), failing with `ItemNotFound` when absent.
    pub fn require(&self, name: &str) -> Result<&Arc<DictionaryItem>, FsoeError> {
        self.get(name)
            .ok_or_else(|| FsoeError::ItemNotFound(name.into()))
    }

    pub fn by_key(&self, key: u32) -> Option<&Arc<DictionaryItem>> {
        self.key_map.get(&key)
    }

    /// Iterates the items in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DictionaryItem>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn test_lookup_by_name_and_key() {
        let dictionary = SafetyItemDictionary::new([
            DictionaryItem::input_output("FSOE_STO", 0x6640 * 1000, DataType::Bool),
            DictionaryItem::input("FSOE_SAFE_POSITION", 0x6651 * 1000, DataType::Int32),
        ])
        .unwrap();

        assert_eq!(dictionary.len(), 2);
        let sto = dictionary.get("FSOE_STO").unwrap();
        assert!(Arc::ptr_eq(sto, dictionary.by_key(0x6640 * 1000).unwrap()));
        assert_eq!(
            dictionary.require("FSOE_NOPE"),
            Err(FsoeError::ItemNotFound("FSOE_NOPE".into()))
        );
        let names: Vec<_> = dictionary.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["FSOE_STO", "FSOE_SAFE_POSITION"]);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let same_name = SafetyItemDictionary::new([
            DictionaryItem::input("A", 1, DataType::Bool),
            DictionaryItem::input("A", 2, DataType::Bool),
        ]);
        assert_eq!(same_name.unwrap_err(), FsoeError::DuplicateItem("A".into()));

        let same_key = SafetyItemDictionary::new([
            DictionaryItem::input("A", 1, DataType::Bool),
            DictionaryItem::input("B", 1, DataType::Bool),
        ]);
        assert!(matches!(same_key, Err(FsoeError::DuplicateItem(_))));
    }
}
