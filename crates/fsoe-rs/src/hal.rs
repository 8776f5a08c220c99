// crates/fsoe-rs/src/hal.rs
use crate::frame::Register;
use crate::session::SessionState;
use crate::types::{C_FSOE_MAX_MAP_BITS, DataType, MapRole};
use crate::validation::InvalidFrameRule;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Broad classes of [`FsoeError`], used by callers that only need to know
/// whether the fault is in their edit, in the layout or in the rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller asked for something the map configuration forbids.
    Configuration,
    /// The layout cannot be serialized or parsed.
    Structural,
    /// One or more frame rules are violated.
    Validation,
}

/// Defines the error type for the FSoE process image and framing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FsoeError {
    /// The item's kind is not accepted by the map's role.
    KindMismatch { item: String, role: MapRole },
    /// The map is locked and cannot be edited.
    MappingLocked(MapRole),
    /// The edit would make the map wider than `C_FSOE_MAX_MAP_BITS`.
    MapOverflow { role: MapRole, bits: u32 },
    /// Two dictionary items share a name or a key.
    DuplicateItem(String),
    /// A value does not match the data type of the variable it is written to.
    InvalidValue { name: String, expected: DataType },
    /// The named item is not part of the map or the dictionary.
    ItemNotFound(String),
    /// The transport does not know a register with this identifier.
    RegisterNotFound(String),
    /// No CRC element exists for the given safe data block.
    MissingCrc { slot: usize },
    /// A wire map length cannot hold a safety PDU.
    InvalidFrameLength(usize),
    /// The requested safety function instance does not exist or is ambiguous.
    FunctionInstance { kind: &'static str, instance: Option<u16>, available: usize },
    /// The process image violates one or more frame rules.
    Validation(Vec<InvalidFrameRule>),
}

impl FsoeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::KindMismatch { .. }
            | Self::MappingLocked(_)
            | Self::DuplicateItem(_)
            | Self::InvalidValue { .. }
            | Self::FunctionInstance { .. } => ErrorCategory::Configuration,
            Self::ItemNotFound(_)
            | Self::RegisterNotFound(_)
            | Self::MissingCrc { .. }
            | Self::MapOverflow { .. }
            | Self::InvalidFrameLength(_) => ErrorCategory::Structural,
            Self::Validation(_) => ErrorCategory::Validation,
        }
    }
}

impl fmt::Display for FsoeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { item, role } => {
                write!(f, "Item {} cannot be mapped in the {} map", item, role)
            }
            Self::MappingLocked(role) => write!(f, "The {} map is locked", role),
            Self::MapOverflow { role, bits } => write!(
                f,
                "The {} map cannot grow to {} bits (maximum {})",
                role, bits, C_FSOE_MAX_MAP_BITS
            ),
            Self::DuplicateItem(name) => write!(f, "Duplicate safety item: {}", name),
            Self::InvalidValue { name, expected } => {
                write!(f, "Value for {} must be of type {}", name, expected)
            }
            Self::ItemNotFound(name) => write!(f, "Item {} not found", name),
            Self::RegisterNotFound(uid) => write!(f, "Register {} not found", uid),
            Self::MissingCrc { slot } => write!(
                f,
                "No CRC found for data slot {}. Probably the PDU map is too wide",
                slot
            ),
            Self::InvalidFrameLength(len) => write!(
                f,
                "Invalid safety PDU length: {} bytes (minimum 6, otherwise 3 + 4 * blocks)",
                len
            ),
            Self::FunctionInstance {
                kind,
                instance: Some(instance),
                ..
            } => write!(f, "No {} instance {}", kind, instance),
            Self::FunctionInstance {
                kind,
                instance: None,
                available,
            } => write!(
                f,
                "{} {} instances found. Specify the instance number",
                available, kind
            ),
            Self::Validation(errors) => {
                f.write_str("PDO map validation failed with errors")?;
                if errors.is_empty() {
                    return Ok(());
                }
                f.write_str(":")?;
                for (i, error) in errors.iter().enumerate() {
                    write!(
                        f,
                        "\n  {}. Rule: {}\n     Error: {}",
                        i + 1,
                        error.rule.description(),
                        error.message
                    )?;
                    if let Some(suggestion) = &error.suggestion {
                        write!(f, "\n     Suggestion: {}", suggestion)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsoeError {}

/// Resolves the identifiers used by safety items and frame elements into
/// device registers. Implemented by the transport / device dictionary layer.
pub trait RegisterResolver {
    /// Returns the register with the given identifier, if the device has it.
    fn register(&self, identifier: &str) -> Option<Register>;

    /// Returns the register at the given CoE address, if the device has it.
    fn register_at(&self, index: u16, sub_index: u8) -> Option<Register>;
}

impl RegisterResolver for BTreeMap<String, Register> {
    fn register(&self, identifier: &str) -> Option<Register> {
        self.get(identifier).cloned()
    }

    fn register_at(&self, index: u16, sub_index: u8) -> Option<Register> {
        self.values()
            .find(|register| register.index == index && register.sub_index == sub_index)
            .cloned()
    }
}

/// Interface of the external FSoE master session.
///
/// The session owns the protocol state machine, watchdog and frame CRCs.
/// This crate only moves its request and reply bytes in and out of the
/// safety PDU wire maps.
pub trait SafetyMasterSession {
    /// Returns the next master frame to transmit.
    fn get_request(&mut self) -> Vec<u8>;

    /// Feeds the last received slave frame into the session.
    fn set_reply(&mut self, reply: &[u8]);

    /// Current state of the session.
    fn state(&self) -> SessionState;
}

/// Receives state changes of the master session.
pub trait SessionStateListener {
    fn on_state_change(&mut self, previous: SessionState, current: SessionState);
}
