// crates/fsoe-rs/src/frame/elements.rs

use crate::log::LogMetadata;
use crate::types::MapRole;
use alloc::format;
use alloc::string::String;

/// Identifiers of the frame fields that surround the safe data: the
/// command, one CRC per safe data block and the connection id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameElements {
    /// Short name of the frame side, used in log messages.
    pub side: &'static str,
    pub command_uid: &'static str,
    /// The CRC of block `i` is `{crc_prefix}{i}`.
    pub crc_prefix: &'static str,
    pub connection_id_uid: &'static str,
}

/// Frame sent by the master (the outputs map).
pub const MASTER_FRAME_ELEMENTS: FrameElements = FrameElements {
    side: "master",
    command_uid: "FSOE_MASTER_FRAME_ELEM_CMD",
    crc_prefix: "FSOE_MASTER_FRAME_ELEM_CRC",
    connection_id_uid: "FSOE_MASTER_FRAME_ELEM_CONNID",
};

/// Frame sent by the slave (the inputs map).
pub const SLAVE_FRAME_ELEMENTS: FrameElements = FrameElements {
    side: "slave",
    command_uid: "FSOE_SLAVE_FRAME_ELEM_CMD",
    crc_prefix: "FSOE_SLAVE_FRAME_ELEM_CRC",
    connection_id_uid: "FSOE_SLAVE_FRAME_ELEM_CONNID",
};

impl FrameElements {
    /// Elements of the frame that carries the given map.
    pub const fn for_role(role: MapRole) -> &'static FrameElements {
        match role {
            MapRole::Outputs => &MASTER_FRAME_ELEMENTS,
            MapRole::Inputs => &SLAVE_FRAME_ELEMENTS,
        }
    }

    /// Identifier of the CRC that follows safe data block `slot`.
    pub fn crc_uid(&self, slot: usize) -> String {
        format!("{}{}", self.crc_prefix, slot)
    }

    /// True if `identifier` is the command, a CRC or the connection id.
    pub fn is_frame_element(&self, identifier: &str) -> bool {
        identifier == self.command_uid
            || identifier == self.connection_id_uid
            || identifier
                .strip_prefix(self.crc_prefix)
                .is_some_and(|slot| !slot.is_empty() && slot.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl LogMetadata for FrameElements {
    fn meta(&self) -> String {
        format!("frame={}", self.side)
    }
}
