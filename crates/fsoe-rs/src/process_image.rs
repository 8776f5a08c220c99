// crates/fsoe-rs/src/process_image.rs
//! The pair of maps exchanged with one safety slave.
//!
//! The outputs map is the safe data of the master frame (RxPDO), the inputs
//! map the safe data of the slave frame (TxPDO). Both share one dictionary.

use crate::FsoeError;
use crate::config::FrameLimits;
use crate::dictionary::{DictionaryItem, ItemKind, SafetyItemDictionary};
use crate::frame::{FrameBuilder, MASTER_FRAME_ELEMENTS, PdoMap, SLAVE_FRAME_ELEMENTS};
use crate::hal::RegisterResolver;
use crate::log::{my_debug, my_error, my_warn};
use crate::map::DictionaryMap;
use crate::safety::{SafetyFunction, SafetyFunctionKind, safety_functions_by_type};
use crate::types::{C_FSOE_SHORT_SLOT_WIDTH, C_FSOE_SLOT_WIDTH, C_FSOE_STO_UID, MapRole};
use crate::validation::{FrameRule, FrameValidator, ValidationReport};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct ProcessImage {
    pub outputs: DictionaryMap,
    pub inputs: DictionaryMap,
    dictionary: Arc<SafetyItemDictionary>,
    limits: FrameLimits,
}

impl PartialEq for ProcessImage {
    fn eq(&self, other: &Self) -> bool {
        self.outputs == other.outputs && self.inputs == other.inputs
    }
}

impl ProcessImage {
    /// Both maps empty and editable.
    pub fn empty(dictionary: Arc<SafetyItemDictionary>) -> Self {
        Self {
            outputs: DictionaryMap::new(MapRole::Outputs),
            inputs: DictionaryMap::new(MapRole::Inputs),
            dictionary,
            limits: FrameLimits::default(),
        }
    }

    /// The minimum process image: the STO command in the outputs map.
    ///
    /// Needs the dictionary, so this is not `Default::default`.
    #[allow(clippy::should_implement_trait)]
    pub fn default(dictionary: Arc<SafetyItemDictionary>) -> Result<Self, FsoeError> {
        let mut image = Self::empty(dictionary);
        let sto = Arc::clone(image.dictionary.require(C_FSOE_STO_UID)?);
        image.outputs.add(&sto)?;
        Ok(image)
    }

    /// Uses `limits` for framing and validation instead of the ETG.5120 ones.
    pub fn with_limits(mut self, limits: FrameLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn dictionary(&self) -> &SafetyItemDictionary {
        &self.dictionary
    }

    pub fn limits(&self) -> &FrameLimits {
        &self.limits
    }

    /// Independent copy of both maps. Items are shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// True while neither map is locked.
    pub fn editable(&self) -> bool {
        self.outputs.editable() && self.inputs.editable()
    }

    pub fn lock(&mut self) {
        self.outputs.lock();
        self.inputs.lock();
    }

    /// Inserts the item in the maps its kind belongs to, reusing free
    /// padding where possible. Maps that already contain it are skipped.
    /// Either every target map is updated or none is.
    pub fn insert_in_best_position(&mut self, item: &Arc<DictionaryItem>) -> Result<(), FsoeError> {
        let bits = item.bits();
        let align_to = if bits >= C_FSOE_SLOT_WIDTH {
            C_FSOE_SLOT_WIDTH
        } else if bits > C_FSOE_SHORT_SLOT_WIDTH {
            C_FSOE_SHORT_SLOT_WIDTH
        } else {
            1
        };
        let targets: &[MapRole] = match item.kind {
            ItemKind::Input { .. } => &[MapRole::Inputs],
            ItemKind::Output => &[MapRole::Outputs],
            ItemKind::InputOutput { .. } => &[MapRole::Inputs, MapRole::Outputs],
        };
        let pending: Vec<MapRole> = targets
            .iter()
            .copied()
            .filter(|role| !self.map(*role).contains(item))
            .collect();
        if let Some(role) = pending.iter().find(|role| !self.map(**role).editable()) {
            my_error!(*role, "Cannot insert {} in a locked map", item.name);
            return Err(FsoeError::MappingLocked(*role));
        }

        let mut edited: Vec<(MapRole, DictionaryMap)> = Vec::with_capacity(pending.len());
        for role in pending {
            let before = self.map(role).clone();
            match self.map_mut(role).insert_in_best_position(item, align_to) {
                Ok(position) => {
                    my_debug!(role, "{} inserted at bit {}", item.name, position);
                    edited.push((role, before));
                }
                Err(error) => {
                    for (role, before) in edited {
                        *self.map_mut(role) = before;
                    }
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Inserts every I/O item of the function.
    pub fn insert_safety_function(&mut self, function: &SafetyFunction) -> Result<(), FsoeError> {
        for item in &function.io {
            self.insert_in_best_position(item)?;
        }
        Ok(())
    }

    /// True if the function is in use.
    ///
    /// A function with output items is mapped when one of them is in the
    /// outputs map. When `strict` is false an output item found only in the
    /// inputs map also counts. Input-only functions are mapped when one of
    /// their items is in the inputs map.
    pub fn is_safety_function_mapped(&self, function: &SafetyFunction, strict: bool) -> bool {
        if function.has_outputs() {
            function.output_items().any(|item| {
                self.outputs.contains(item) || (!strict && self.inputs.contains(item))
            })
        } else {
            function.input_items().any(|item| self.inputs.contains(item))
        }
    }

    /// Turns every mapped item of the function into padding of the same
    /// size, in both maps. Paddings are not merged.
    pub fn unmap_safety_function(&mut self, function: &SafetyFunction) -> Result<(), FsoeError> {
        let mut unmapped = false;
        for item in &function.io {
            for map in [&mut self.outputs, &mut self.inputs] {
                if map.contains(item) {
                    map.transform_to_padding(item)?;
                    unmapped = true;
                }
            }
        }
        if !unmapped {
            warn!("The safety function is not mapped: {}", function.name());
        }
        Ok(())
    }

    /// Inserts the first instance of `kind` that is not mapped yet. An
    /// instance mapped in the inputs map only is completed in the outputs.
    pub fn insert_safety_functions_by_type(
        &mut self,
        functions: &[SafetyFunction],
        kind: SafetyFunctionKind,
    ) -> Result<(), FsoeError> {
        let next = safety_functions_by_type(functions, kind)
            .find(|function| !self.is_safety_function_mapped(function, true));
        match next {
            Some(function) => {
                debug!("Inserting safety function {}", function.name());
                self.insert_safety_function(function)
            }
            None => {
                warn!("All {} instances are already mapped", kind);
                Ok(())
            }
        }
    }

    /// Unmaps the mapped instance of `kind` with the highest instance number.
    pub fn remove_safety_functions_by_type(
        &mut self,
        functions: &[SafetyFunction],
        kind: SafetyFunctionKind,
    ) -> Result<(), FsoeError> {
        let instances: Vec<&SafetyFunction> = safety_functions_by_type(functions, kind).collect();
        let last_mapped = instances
            .into_iter()
            .rev()
            .find(|function| self.is_safety_function_mapped(function, false));
        match last_mapped {
            Some(function) => {
                debug!("Removing safety function {}", function.name());
                self.unmap_safety_function(function)
            }
            None => {
                warn!("No {} instance is mapped", kind);
                Ok(())
            }
        }
    }

    /// Serializes the outputs map into the master frame wire map.
    pub fn fill_rpdo_map(
        &mut self,
        resolver: &impl RegisterResolver,
        rpdo: &mut PdoMap,
    ) -> Result<(), FsoeError> {
        if self.outputs.editable() {
            self.outputs.complete_with_padding()?;
        }
        FrameBuilder::new(self.limits).fill_pdo_map(
            &self.outputs,
            resolver,
            rpdo,
            &MASTER_FRAME_ELEMENTS,
        )
    }

    /// Serializes the inputs map into the slave frame wire map.
    pub fn fill_tpdo_map(
        &mut self,
        resolver: &impl RegisterResolver,
        tpdo: &mut PdoMap,
    ) -> Result<(), FsoeError> {
        if self.inputs.editable() {
            self.inputs.complete_with_padding()?;
        }
        FrameBuilder::new(self.limits).fill_pdo_map(
            &self.inputs,
            resolver,
            tpdo,
            &SLAVE_FRAME_ELEMENTS,
        )
    }

    /// Rebuilds the process image from the wire maps of both frames.
    pub fn from_rpdo_tpdo(
        rpdo: &PdoMap,
        tpdo: &PdoMap,
        dictionary: Arc<SafetyItemDictionary>,
    ) -> Result<Self, FsoeError> {
        let mut image = Self::empty(dictionary);
        let builder = FrameBuilder::new(image.limits);
        builder.fill_dictionary_map_from_pdo(rpdo, &image.dictionary, &mut image.outputs)?;
        builder.fill_dictionary_map_from_pdo(tpdo, &image.dictionary, &mut image.inputs)?;
        Ok(image)
    }

    /// Checks the frame rules on both maps. With `raise` a non-empty report
    /// is returned as `FsoeError::Validation`.
    pub fn validate(&self, raise: bool) -> Result<ValidationReport, FsoeError> {
        let validator = FrameValidator::with_rules(self.limits, &FrameRule::MAP_RULES);
        let mut report = validator.validate_map(&self.outputs);
        report.merge(validator.validate_map(&self.inputs));
        Self::finish(report, raise)
    }

    /// Checks the wire level rules on filled frames.
    pub fn validate_wire(
        &self,
        rpdo: &PdoMap,
        tpdo: &PdoMap,
        raise: bool,
    ) -> Result<ValidationReport, FsoeError> {
        let validator = FrameValidator::with_rules(self.limits, &FrameRule::WIRE_RULES);
        let mut report = validator.validate_pdo_map(rpdo, &MASTER_FRAME_ELEMENTS, MapRole::Outputs);
        report.merge(validator.validate_pdo_map(tpdo, &SLAVE_FRAME_ELEMENTS, MapRole::Inputs));
        Self::finish(report, raise)
    }

    fn finish(report: ValidationReport, raise: bool) -> Result<ValidationReport, FsoeError> {
        if raise && !report.is_valid() {
            for error in report.errors() {
                my_warn!(error.role, "{}", error);
            }
            return Err(FsoeError::Validation(report.errors().to_vec()));
        }
        Ok(report)
    }

    fn map(&self, role: MapRole) -> &DictionaryMap {
        match role {
            MapRole::Outputs => &self.outputs,
            MapRole::Inputs => &self.inputs,
        }
    }

    fn map_mut(&mut self, role: MapRole) -> &mut DictionaryMap {
        match role {
            MapRole::Outputs => &mut self.outputs,
            MapRole::Inputs => &mut self.inputs,
        }
    }
}

impl fmt::Display for ProcessImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Outputs:")?;
        writeln!(f, "{}", self.outputs)?;
        writeln!(f, "Inputs:")?;
        write!(f, "{}", self.inputs)
    }
}
