// crates/fsoe-rs/src/frame/mod.rs

pub mod builder;
pub mod elements;
pub mod mapping;
pub mod slots;
pub mod wire;

pub use builder::{FrameBuilder, safety_bytes};
pub use elements::{FrameElements, MASTER_FRAME_ELEMENTS, SLAVE_FRAME_ELEMENTS};
pub use mapping::CoeMappingEntry;
pub use slots::{Slot, SlotEntry, generate_slot_structure};
pub use wire::{PdoDirection, PdoMap, PdoWireItem, Register};
