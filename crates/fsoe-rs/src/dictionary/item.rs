// crates/fsoe-rs/src/dictionary/item.rs

use super::value::SafeValue;
use crate::FsoeError;
use crate::types::{DataType, MapRole};
use alloc::string::{String, ToString};

/// Direction of a safety variable, with the value the master assumes for
/// it while the connection is not in the data state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemKind {
    /// Sent by the slave only.
    Input { fail_safe: SafeValue },
    /// Sent by the master only.
    Output,
    /// Sent in both directions (typically a safety command and its feedback).
    InputOutput { fail_safe: SafeValue },
}

/// A named safety variable of the device.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryItem {
    pub name: String,
    /// Unique numeric key, `index * 1000 + sub_index` for register backed items.
    pub key: u32,
    pub data_type: DataType,
    pub kind: ItemKind,
}

impl DictionaryItem {
    /// Creates an input with the default fail-safe value:
    /// inputs are assumed low in the safe state.
    pub fn input(name: &str, key: u32, data_type: DataType) -> Self {
        Self::with_kind(
            name,
            key,
            data_type,
            ItemKind::Input {
                fail_safe: SafeValue::zero(data_type),
            },
        )
    }

    pub fn output(name: &str, key: u32, data_type: DataType) -> Self {
        Self::with_kind(name, key, data_type, ItemKind::Output)
    }

    /// Creates an input/output with the default fail-safe value.
    /// Boolean input/outputs are safety commands whose safe state is active.
    pub fn input_output(name: &str, key: u32, data_type: DataType) -> Self {
        let fail_safe = match data_type {
            DataType::Bool => SafeValue::Bool(true),
            _ => SafeValue::zero(data_type),
        };
        Self::with_kind(name, key, data_type, ItemKind::InputOutput { fail_safe })
    }

    fn with_kind(name: &str, key: u32, data_type: DataType, kind: ItemKind) -> Self {
        Self {
            name: name.to_string(),
            key,
            data_type,
            kind,
        }
    }

    /// Replaces the fail-safe value. Fails for outputs and for values of
    /// another data type.
    pub fn with_fail_safe(mut self, value: SafeValue) -> Result<Self, FsoeError> {
        if value.data_type() != self.data_type {
            return Err(FsoeError::InvalidValue {
                name: self.name,
                expected: self.data_type,
            });
        }
        match &mut self.kind {
            ItemKind::Input { fail_safe } | ItemKind::InputOutput { fail_safe } => {
                *fail_safe = value
            }
            ItemKind::Output => {
                return Err(FsoeError::KindMismatch {
                    item: self.name,
                    role: MapRole::Inputs,
                });
            }
        }
        Ok(self)
    }

    /// Builds the numeric key of a register backed item.
    pub const fn key_for_register(index: u16, sub_index: u8) -> u32 {
        index as u32 * 1000 + sub_index as u32
    }

    pub fn bits(&self) -> u16 {
        self.data_type.bits()
    }

    pub fn fail_safe(&self) -> Option<SafeValue> {
        match self.kind {
            ItemKind::Input { fail_safe } | ItemKind::InputOutput { fail_safe } => Some(fail_safe),
            ItemKind::Output => None,
        }
    }

    /// True if the slave sends this item (Input or InputOutput).
    pub fn is_input(&self) -> bool {
        !matches!(self.kind, ItemKind::Output)
    }

    /// True if the master sends this item (Output or InputOutput).
    pub fn is_output(&self) -> bool {
        !matches!(self.kind, ItemKind::Input { .. })
    }

    /// True if a map with the given role may contain this item.
    pub fn accepted_by(&self, role: MapRole) -> bool {
        match role {
            MapRole::Outputs => self.is_output(),
            MapRole::Inputs => self.is_input(),
        }
    }
}
