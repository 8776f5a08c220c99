#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (entry sequences, wire maps, names)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod config;
pub mod hal;
pub(crate) mod log;

// --- Safety Data Model ---
pub mod dictionary;
pub mod map;
pub mod safety;

// --- Safety PDU Framing ---
pub mod frame;
pub mod validation;

// --- Process Image & Session Glue ---
pub mod process_image;
pub mod session;

// --- Top-level Exports ---
pub use types::{DataType, MapRole};
pub use config::FrameLimits;
pub use hal::{
    ErrorCategory, FsoeError, RegisterResolver, SafetyMasterSession, SessionStateListener,
};
pub use dictionary::{DictionaryItem, ItemKind, SafeValue, SafetyItemDictionary};
pub use map::{DictionaryMap, MappedEntry};
pub use frame::{FrameBuilder, FrameElements, PdoDirection, PdoMap, PdoWireItem, Register};
pub use validation::{FrameRule, FrameValidator, InvalidFrameRule, ValidationReport};
pub use safety::{SafetyFunction, SafetyFunctionKind, SafetyParameter};
pub use process_image::ProcessImage;
pub use session::{SafetyPduLink, SessionState};
