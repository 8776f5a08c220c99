// crates/fsoe-rs/src/validation/mod.rs
//! Frame rule checks over dictionary maps and filled wire maps.
//!
//! Every rule is a pure function returning at most one violation record.
//! [`FrameValidator`] runs a set of rules and aggregates their records into
//! a [`ValidationReport`]; only the caller decides whether a non-empty
//! report becomes an error.

mod rules;
mod wire;

pub use rules::{
    check_objects_aligned, check_objects_in_frame, check_objects_split,
    check_safe_data_blocks, check_sto_command_first,
};
pub use wire::check_cmd_field_first;

use crate::FsoeError;
use crate::config::FrameLimits;
use crate::frame::{FrameElements, PdoMap, generate_slot_structure};
use crate::log::my_warn;
use crate::map::DictionaryMap;
use crate::types::{C_FSOE_SLOT_WIDTH, MapRole};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use log::debug;

/// Structural rules a safety frame must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRule {
    /// 1 to 8 safe data blocks, all but the last one full.
    SafeDataBlocksValid,
    /// Command + entries + CRCs + connection id fit in the PDO object limit.
    ObjectsInFrame,
    /// Only entries of 16 bits or more may cross a block boundary.
    ObjectsSplitRestricted,
    /// Entries of 16 bits or more start on a 16-bit boundary.
    ObjectsAligned,
    /// The Safe Torque Off command is the first entry of the map.
    StoCommandFirst,
    /// The command field is the first item of the wire map.
    CmdFieldFirst,
}

impl FrameRule {
    /// Rules checked on dictionary maps.
    pub const MAP_RULES: [FrameRule; 5] = [
        FrameRule::SafeDataBlocksValid,
        FrameRule::ObjectsInFrame,
        FrameRule::ObjectsSplitRestricted,
        FrameRule::ObjectsAligned,
        FrameRule::StoCommandFirst,
    ];

    /// Rules checked on filled wire maps.
    pub const WIRE_RULES: [FrameRule; 1] = [FrameRule::CmdFieldFirst];

    pub const fn id(&self) -> &'static str {
        match self {
            FrameRule::SafeDataBlocksValid => "SAFE_DATA_BLOCKS_VALID",
            FrameRule::ObjectsInFrame => "OBJECTS_IN_FRAME",
            FrameRule::ObjectsSplitRestricted => "OBJECTS_SPLIT_RESTRICTED",
            FrameRule::ObjectsAligned => "OBJECTS_ALIGNED",
            FrameRule::StoCommandFirst => "STO_COMMAND_FIRST",
            FrameRule::CmdFieldFirst => "CMD_FIELD_FIRST",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            FrameRule::SafeDataBlocksValid => {
                "Safe data must fit in 1 to 8 blocks of 16 bits, all but the last one full"
            }
            FrameRule::ObjectsInFrame => "A safety frame can be mapped to at most 45 objects",
            FrameRule::ObjectsSplitRestricted => {
                "Only objects of 16 bits or more can be split between safe data blocks"
            }
            FrameRule::ObjectsAligned => "Objects of 16 bits or more must be 16-bit aligned",
            FrameRule::StoCommandFirst => "STO command must be the first item in the map",
            FrameRule::CmdFieldFirst => "CMD field must be the first item in the PDO map",
        }
    }
}

impl fmt::Display for FrameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A violated rule, with what is needed to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFrameRule {
    pub rule: FrameRule,
    /// Map the violation was found in.
    pub role: MapRole,
    pub message: String,
    /// Names of the items involved.
    pub items: Vec<String>,
    pub actual: Option<usize>,
    pub expected: Option<usize>,
    pub suggestion: Option<String>,
}

impl InvalidFrameRule {
    pub(crate) fn new(rule: FrameRule, role: MapRole, message: String) -> Self {
        Self {
            rule,
            role,
            message,
            items: Vec::new(),
            actual: None,
            expected: None,
            suggestion: None,
        }
    }

    pub(crate) fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    pub(crate) fn with_counts(mut self, actual: usize, expected: usize) -> Self {
        self.actual = Some(actual);
        self.expected = Some(expected);
        self
    }

    pub(crate) fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for InvalidFrameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.role, self.rule, self.message)
    }
}

/// Aggregated result of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<InvalidFrameRule>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[InvalidFrameRule] {
        &self.errors
    }

    /// Violations of one rule.
    pub fn for_rule(&self, rule: FrameRule) -> impl Iterator<Item = &InvalidFrameRule> {
        self.errors.iter().filter(move |error| error.rule == rule)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    /// Turns a non-empty report into a single `FsoeError::Validation`.
    pub fn into_result(self) -> Result<(), FsoeError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FsoeError::Validation(self.errors))
        }
    }

    fn push(&mut self, error: Option<InvalidFrameRule>) {
        if let Some(error) = error {
            my_warn!(error.role, "{} violated: {}", error.rule, error.message);
            self.errors.push(error);
        }
    }
}

/// Runs a set of frame rules.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    limits: FrameLimits,
    rules: Vec<FrameRule>,
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new(FrameLimits::default())
    }
}

impl FrameValidator {
    /// Validator running every rule.
    pub fn new(limits: FrameLimits) -> Self {
        let mut rules = Vec::from(FrameRule::MAP_RULES);
        rules.extend(FrameRule::WIRE_RULES);
        Self { limits, rules }
    }

    /// Validator running only `rules`.
    pub fn with_rules(limits: FrameLimits, rules: &[FrameRule]) -> Self {
        Self {
            limits,
            rules: rules.to_vec(),
        }
    }

    pub fn rules(&self) -> &[FrameRule] {
        &self.rules
    }

    /// Checks the map rules on one dictionary map.
    pub fn validate_map(&self, map: &DictionaryMap) -> ValidationReport {
        let slots = generate_slot_structure(map, C_FSOE_SLOT_WIDTH);
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            let error = match rule {
                FrameRule::SafeDataBlocksValid => {
                    check_safe_data_blocks(map, &slots, &self.limits)
                }
                FrameRule::ObjectsInFrame => check_objects_in_frame(map, &slots, &self.limits),
                FrameRule::ObjectsSplitRestricted => check_objects_split(map, &slots),
                FrameRule::ObjectsAligned => check_objects_aligned(map),
                FrameRule::StoCommandFirst => check_sto_command_first(map),
                FrameRule::CmdFieldFirst => None,
            };
            report.push(error);
        }
        debug!(
            "Validated {} map: {} rule(s), {} violation(s)",
            map.role(),
            self.rules.len(),
            report.errors.len()
        );
        report
    }

    /// Checks the wire rules on a filled PDO map.
    pub fn validate_pdo_map(
        &self,
        pdo_map: &PdoMap,
        elements: &FrameElements,
        role: MapRole,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.rules.contains(&FrameRule::CmdFieldFirst) {
            report.push(check_cmd_field_first(pdo_map, elements, role));
        }
        report
    }
}
