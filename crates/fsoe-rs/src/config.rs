// crates/fsoe-rs/src/config.rs
//! Runtime limits of the safety PDU layout.

use crate::types::{C_FSOE_MAX_FRAME_OBJECTS, C_FSOE_MAX_SAFE_DATA_BLOCKS};

/// Layout limits used by the slot generator and the frame validators.
///
/// The defaults are the ETG.5120 values. Devices that support fewer PDO
/// entries or blocks can tighten them. The block width is fixed by the
/// protocol (`C_FSOE_SLOT_WIDTH`) and is not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Maximum number of safe data blocks per frame.
    pub max_safe_data_blocks: usize,
    /// Maximum number of PDO objects per frame, counting command, CRCs and
    /// connection id.
    pub max_frame_objects: usize,
}

impl FrameLimits {
    /// Creates the limits with the ETG.5120 values.
    pub const fn new() -> Self {
        Self {
            max_safe_data_blocks: C_FSOE_MAX_SAFE_DATA_BLOCKS,
            max_frame_objects: C_FSOE_MAX_FRAME_OBJECTS,
        }
    }
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self::new()
    }
}
