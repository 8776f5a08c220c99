// crates/fsoe-rs/src/validation/wire.rs
use super::{FrameRule, InvalidFrameRule};
use crate::frame::{FrameElements, PdoMap};
use crate::types::MapRole;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;

/// The first item of a filled wire map must be the frame's command field.
pub fn check_cmd_field_first(
    pdo_map: &PdoMap,
    elements: &FrameElements,
    role: MapRole,
) -> Option<InvalidFrameRule> {
    let Some(first) = pdo_map.items().first() else {
        return Some(
            InvalidFrameRule::new(
                FrameRule::CmdFieldFirst,
                role,
                "PDO map is empty - no CMD field found".to_string(),
            )
            .with_suggestion("Fill the PDO map before validating it."),
        );
    };
    let identifier = first.identifier().unwrap_or("Padding");
    if identifier == elements.command_uid {
        return None;
    }
    Some(
        InvalidFrameRule::new(
            FrameRule::CmdFieldFirst,
            role,
            format!(
                "First PDO item must be CMD field '{}', but found '{}'",
                elements.command_uid, identifier
            ),
        )
        .with_items(vec![String::from(identifier)])
        .with_suggestion("Ensure the first item in the PDO map is the CMD field."),
    )
}
