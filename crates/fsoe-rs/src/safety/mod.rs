// crates/fsoe-rs/src/safety/mod.rs
//! Safety functions of the drive and the dictionary items and parameters
//! each one is made of.

mod parameter;

pub use parameter::{SafetyParameter, application_parameter_words};

use crate::FsoeError;
use crate::dictionary::{DictionaryItem, ItemKind, SafetyItemDictionary};
use crate::types::MapRole;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use log::{debug, error, trace};

/// Kind of dictionary item a safety function requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoKind {
    Input,
    InputOutput,
}

/// The safety functions an FSoE slave can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SafetyFunctionKind {
    /// Safe Torque Off.
    Sto,
    /// Safe Stop 1.
    Ss1,
    SafeInputs,
    /// Safe Operating Stop.
    Sos,
    /// Safe Stop 2.
    Ss2,
    /// Safe Output (brake control).
    SOut,
    /// Safe Position.
    Sp,
    /// Safe Velocity.
    Sv,
    SafeHoming,
    /// Safely Limited Speed.
    Sls,
    /// Safe Speed Range.
    Ssr,
    /// Safely Limited Position.
    Slp,
}

impl SafetyFunctionKind {
    pub const ALL: [SafetyFunctionKind; 12] = [
        SafetyFunctionKind::Sto,
        SafetyFunctionKind::Ss1,
        SafetyFunctionKind::SafeInputs,
        SafetyFunctionKind::Sos,
        SafetyFunctionKind::Ss2,
        SafetyFunctionKind::SOut,
        SafetyFunctionKind::Sp,
        SafetyFunctionKind::Sv,
        SafetyFunctionKind::SafeHoming,
        SafetyFunctionKind::Sls,
        SafetyFunctionKind::Ssr,
        SafetyFunctionKind::Slp,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            SafetyFunctionKind::Sto => "STO",
            SafetyFunctionKind::Ss1 => "SS1",
            SafetyFunctionKind::SafeInputs => "SafeInputs",
            SafetyFunctionKind::Sos => "SOS",
            SafetyFunctionKind::Ss2 => "SS2",
            SafetyFunctionKind::SOut => "SOUT",
            SafetyFunctionKind::Sp => "SP",
            SafetyFunctionKind::Sv => "SV",
            SafetyFunctionKind::SafeHoming => "SafeHoming",
            SafetyFunctionKind::Sls => "SLS",
            SafetyFunctionKind::Ssr => "SSR",
            SafetyFunctionKind::Slp => "SLP",
        }
    }

    /// Kinds that can have several numbered instances (`{i}` in their uids).
    pub const fn is_indexed(&self) -> bool {
        matches!(
            self,
            SafetyFunctionKind::Ss1
                | SafetyFunctionKind::Sos
                | SafetyFunctionKind::Ss2
                | SafetyFunctionKind::Sls
                | SafetyFunctionKind::Ssr
                | SafetyFunctionKind::Slp
        )
    }

    /// Every FSoE slave has to expose these.
    pub const fn is_mandatory(&self) -> bool {
        matches!(self, SafetyFunctionKind::Sto | SafetyFunctionKind::SafeInputs)
    }

    /// Uid template of the function's I/O item.
    pub const fn io_template(&self) -> &'static str {
        match self {
            SafetyFunctionKind::Sto => "FSOE_STO",
            SafetyFunctionKind::Ss1 => "FSOE_SS1_{i}",
            SafetyFunctionKind::SafeInputs => "FSOE_SAFE_INPUTS_VALUE",
            SafetyFunctionKind::Sos => "FSOE_SOS_{i}",
            SafetyFunctionKind::Ss2 => "FSOE_SS2_{i}",
            SafetyFunctionKind::SOut => "FSOE_SBC",
            SafetyFunctionKind::Sp => "FSOE_SAFE_POSITION",
            SafetyFunctionKind::Sv => "FSOE_SAFE_VELOCITY",
            SafetyFunctionKind::SafeHoming => "FSOE_SAFE_HOMING",
            SafetyFunctionKind::Sls => "FSOE_SLS_CMD_{i}",
            SafetyFunctionKind::Ssr => "FSOE_SSR_COMMAND_{i}",
            SafetyFunctionKind::Slp => "FSOE_SLP_COMMAND_{i}",
        }
    }

    /// Uid templates of the function's parameters.
    pub const fn parameter_templates(&self) -> &'static [&'static str] {
        match self {
            SafetyFunctionKind::Sto | SafetyFunctionKind::Sv => &[],
            SafetyFunctionKind::Ss1 => &["FSOE_SS1_TIME_TO_STO_{i}"],
            SafetyFunctionKind::SafeInputs => &["FSOE_SAFE_INPUTS_MAP"],
            SafetyFunctionKind::Sos => &[
                "FSOE_SOS_POS_ZERO_WINDOW_{i}",
                "FSOE_SOS_VEL_ZERO_WINDOW_{i}",
            ],
            SafetyFunctionKind::Ss2 => &[
                "FSOE_SS2_TIME_TO_SOS_{i}",
                "FSOE_SS2_DEC_LIMIT_{i}",
                "FSOE_SS2_TIME_DELAY_DEC_{i}",
                "FSOE_SS2_ERROR_REACTION_{i}",
            ],
            SafetyFunctionKind::SOut => &["FSOE_SBC_BRAKE_TIME_DELAY"],
            SafetyFunctionKind::Sp => &["FSOE_POSITION_TOLERANCE"],
            SafetyFunctionKind::SafeHoming => &["FSOE_SAFE_HOMING_REFERENCE"],
            SafetyFunctionKind::Sls => &[
                "FSOE_SLS_VELOCITY_LIMIT_{i}",
                "FSOE_SLS_ERROR_REACTION_{i}",
            ],
            SafetyFunctionKind::Ssr => &[
                "FSOE_SSR_UPPER_LIMIT_{i}",
                "FSOE_SSR_LOWER_LIMIT_{i}",
                "FSOE_SSR_ERROR_REACTION_{i}",
            ],
            SafetyFunctionKind::Slp => &[
                "FSOE_SLP_UPPER_LIMIT_{i}",
                "FSOE_SLP_LOWER_LIMIT_{i}",
                "FSOE_SLP_ERROR_REACTION_{i}",
            ],
        }
    }

    const fn io_kind(&self) -> IoKind {
        match self {
            SafetyFunctionKind::SafeInputs | SafetyFunctionKind::Sp | SafetyFunctionKind::Sv => {
                IoKind::Input
            }
            _ => IoKind::InputOutput,
        }
    }
}

impl fmt::Display for SafetyFunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn expand(template: &str, instance: Option<u16>) -> String {
    match instance {
        Some(i) => template.replace("{i}", &i.to_string()),
        None => template.to_string(),
    }
}

/// One instance of a safety function: the dictionary items it exchanges and
/// the uids of the parameters that configure it.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyFunction {
    pub kind: SafetyFunctionKind,
    /// Instance number (from 1) of indexed kinds, `None` otherwise.
    pub instance: Option<u16>,
    pub io: Vec<Arc<DictionaryItem>>,
    pub parameters: Vec<String>,
}

impl SafetyFunction {
    /// Discovers every safety function the dictionary and parameters expose.
    ///
    /// Indexed kinds are explored from instance 1 until an item or parameter
    /// is missing. STO and Safe Inputs must be present.
    pub fn for_dictionary(
        dictionary: &SafetyItemDictionary,
        parameters: &[SafetyParameter],
    ) -> Result<Vec<SafetyFunction>, FsoeError> {
        let mut functions = Vec::new();
        for kind in SafetyFunctionKind::ALL {
            if !kind.is_indexed() {
                match Self::discover(kind, None, dictionary, parameters)? {
                    Some(function) => functions.push(function),
                    None if kind.is_mandatory() => {
                        let uid = Self::missing_uid(kind, None, dictionary, parameters);
                        error!("Mandatory safety function {} not found: {} missing", kind, uid);
                        return Err(FsoeError::ItemNotFound(uid));
                    }
                    None => trace!("Safety function {} not available", kind),
                }
                continue;
            }
            for instance in 1u16.. {
                match Self::discover(kind, Some(instance), dictionary, parameters)? {
                    Some(function) => functions.push(function),
                    None => break,
                }
            }
        }
        debug!("Discovered {} safety function instances", functions.len());
        Ok(functions)
    }

    fn discover(
        kind: SafetyFunctionKind,
        instance: Option<u16>,
        dictionary: &SafetyItemDictionary,
        parameters: &[SafetyParameter],
    ) -> Result<Option<SafetyFunction>, FsoeError> {
        let uid = expand(kind.io_template(), instance);
        let Some(item) = dictionary.get(&uid) else {
            return Ok(None);
        };
        Self::check_kind(item, kind.io_kind())?;

        let mut uids = Vec::with_capacity(kind.parameter_templates().len());
        for template in kind.parameter_templates() {
            let uid = expand(template, instance);
            if !parameters.iter().any(|parameter| parameter.uid == uid) {
                return Ok(None);
            }
            uids.push(uid);
        }
        Ok(Some(SafetyFunction {
            kind,
            instance,
            io: vec![Arc::clone(item)],
            parameters: uids,
        }))
    }

    fn check_kind(item: &DictionaryItem, expected: IoKind) -> Result<(), FsoeError> {
        let role = match (expected, &item.kind) {
            (_, ItemKind::InputOutput { .. }) | (IoKind::Input, ItemKind::Input { .. }) => {
                return Ok(());
            }
            (IoKind::Input, ItemKind::Output) | (IoKind::InputOutput, ItemKind::Output) => {
                MapRole::Inputs
            }
            (IoKind::InputOutput, ItemKind::Input { .. }) => MapRole::Outputs,
        };
        error!("Safety item {} has the wrong kind for its function", item.name);
        Err(FsoeError::KindMismatch {
            item: item.name.clone(),
            role,
        })
    }

    fn missing_uid(
        kind: SafetyFunctionKind,
        instance: Option<u16>,
        dictionary: &SafetyItemDictionary,
        parameters: &[SafetyParameter],
    ) -> String {
        let io = expand(kind.io_template(), instance);
        if dictionary.get(&io).is_none() {
            return io;
        }
        kind.parameter_templates()
            .iter()
            .map(|template| expand(template, instance))
            .find(|uid| !parameters.iter().any(|parameter| &parameter.uid == uid))
            .unwrap_or(io)
    }

    /// Name of the instance, e.g. `SS1_2` or `STO`.
    pub fn name(&self) -> String {
        match self.instance {
            Some(instance) => format!("{}_{}", self.kind, instance),
            None => self.kind.to_string(),
        }
    }

    /// True if any I/O item is sent by the master.
    pub fn has_outputs(&self) -> bool {
        self.io.iter().any(|item| item.is_output())
    }

    /// I/O items the master sends.
    pub fn output_items(&self) -> impl Iterator<Item = &Arc<DictionaryItem>> {
        self.io.iter().filter(|item| item.is_output())
    }

    /// I/O items the slave sends.
    pub fn input_items(&self) -> impl Iterator<Item = &Arc<DictionaryItem>> {
        self.io.iter().filter(|item| item.is_input())
    }

    /// The parameters of this function, in declaration order.
    pub fn parameters_in<'a>(
        &'a self,
        parameters: &'a [SafetyParameter],
    ) -> impl Iterator<Item = &'a SafetyParameter> + 'a {
        self.parameters
            .iter()
            .filter_map(move |uid| parameters.iter().find(|parameter| &parameter.uid == uid))
    }
}

/// Instances of one kind, in discovery order (by instance number).
pub fn safety_functions_by_type(
    functions: &[SafetyFunction],
    kind: SafetyFunctionKind,
) -> impl Iterator<Item = &SafetyFunction> {
    functions.iter().filter(move |function| function.kind == kind)
}

/// Instance `instance` (from 1) of a kind, or its only instance when
/// `instance` is `None`.
pub fn function_instance(
    functions: &[SafetyFunction],
    kind: SafetyFunctionKind,
    instance: Option<u16>,
) -> Result<&SafetyFunction, FsoeError> {
    let of_kind: Vec<&SafetyFunction> = safety_functions_by_type(functions, kind).collect();
    let found = match instance {
        Some(instance) => usize::from(instance)
            .checked_sub(1)
            .and_then(|index| of_kind.get(index).copied()),
        None if of_kind.len() == 1 => of_kind.first().copied(),
        None => None,
    };
    found.ok_or(FsoeError::FunctionInstance {
        kind: kind.name(),
        instance,
        available: of_kind.len(),
    })
}

/// Parameters no safety function refers to.
pub fn unrelated_parameters<'a>(
    functions: &[SafetyFunction],
    parameters: &'a [SafetyParameter],
) -> Vec<&'a SafetyParameter> {
    parameters
        .iter()
        .filter(|parameter| {
            !functions
                .iter()
                .any(|function| function.parameters.contains(&parameter.uid))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::SafeValue;
    use crate::types::DataType;

    fn parameter(uid: &str) -> SafetyParameter {
        SafetyParameter::new(uid, SafeValue::UInt32(0))
    }

    fn base_items() -> Vec<DictionaryItem> {
        vec![
            DictionaryItem::input_output("FSOE_STO", 1, DataType::Bool),
            DictionaryItem::input("FSOE_SAFE_INPUTS_VALUE", 2, DataType::Bool),
        ]
    }

    fn base_parameters() -> Vec<SafetyParameter> {
        vec![parameter("FSOE_SAFE_INPUTS_MAP")]
    }

    #[test]
    fn test_indexed_instances_stop_at_first_gap() {
        let mut items = base_items();
        for i in 1..=3 {
            items.push(DictionaryItem::input_output(
                &format!("FSOE_SS1_{}", i),
                100 + i,
                DataType::Bool,
            ));
        }
        let dictionary = SafetyItemDictionary::new(items).unwrap();
        let mut parameters = base_parameters();
        // Instance 2 has no parameter, so instance 3 is never reached.
        parameters.push(parameter("FSOE_SS1_TIME_TO_STO_1"));
        parameters.push(parameter("FSOE_SS1_TIME_TO_STO_3"));

        let functions = SafetyFunction::for_dictionary(&dictionary, &parameters).unwrap();
        let ss1: Vec<_> = safety_functions_by_type(&functions, SafetyFunctionKind::Ss1).collect();
        assert_eq!(ss1.len(), 1);
        assert_eq!(ss1[0].name(), "SS1_1");
        assert_eq!(ss1[0].parameters, ["FSOE_SS1_TIME_TO_STO_1"]);

        let unrelated = unrelated_parameters(&functions, &parameters);
        assert_eq!(unrelated.len(), 1);
        assert_eq!(unrelated[0].uid, "FSOE_SS1_TIME_TO_STO_3");
    }

    #[test]
    fn test_mandatory_functions() {
        let dictionary = SafetyItemDictionary::new(base_items()).unwrap();
        let result = SafetyFunction::for_dictionary(&dictionary, &[]);
        assert_eq!(
            result,
            Err(FsoeError::ItemNotFound("FSOE_SAFE_INPUTS_MAP".into()))
        );

        let functions = SafetyFunction::for_dictionary(&dictionary, &base_parameters()).unwrap();
        assert_eq!(functions.len(), 2);
        let sto = function_instance(&functions, SafetyFunctionKind::Sto, None).unwrap();
        assert!(sto.has_outputs());
        let safe_inputs =
            function_instance(&functions, SafetyFunctionKind::SafeInputs, None).unwrap();
        assert!(!safe_inputs.has_outputs());
        assert_eq!(safe_inputs.input_items().count(), 1);
    }

    #[test]
    fn test_wrong_item_kind() {
        let mut items = base_items();
        items.push(DictionaryItem::input("FSOE_SAFE_HOMING", 300, DataType::Bool));
        let dictionary = SafetyItemDictionary::new(items).unwrap();
        let mut parameters = base_parameters();
        parameters.push(parameter("FSOE_SAFE_HOMING_REFERENCE"));

        let result = SafetyFunction::for_dictionary(&dictionary, &parameters);
        assert_eq!(
            result,
            Err(FsoeError::KindMismatch {
                item: "FSOE_SAFE_HOMING".into(),
                role: MapRole::Outputs
            })
        );
    }

    #[test]
    fn test_function_instance_lookup() {
        let mut items = base_items();
        let mut parameters = base_parameters();
        for i in 1..=2 {
            items.push(DictionaryItem::input_output(
                &format!("FSOE_SLS_CMD_{}", i),
                200 + i,
                DataType::Bool,
            ));
            parameters.push(parameter(&format!("FSOE_SLS_VELOCITY_LIMIT_{}", i)));
            parameters.push(parameter(&format!("FSOE_SLS_ERROR_REACTION_{}", i)));
        }
        let dictionary = SafetyItemDictionary::new(items).unwrap();
        let functions = SafetyFunction::for_dictionary(&dictionary, &parameters).unwrap();

        let second = function_instance(&functions, SafetyFunctionKind::Sls, Some(2)).unwrap();
        assert_eq!(second.instance, Some(2));
        assert_eq!(second.parameters_in(&parameters).count(), 2);
        assert_eq!(
            function_instance(&functions, SafetyFunctionKind::Sls, None),
            Err(FsoeError::FunctionInstance {
                kind: "SLS",
                instance: None,
                available: 2
            })
        );
        assert!(function_instance(&functions, SafetyFunctionKind::Sls, Some(3)).is_err());
        assert!(function_instance(&functions, SafetyFunctionKind::Sls, Some(0)).is_err());
        assert!(function_instance(&functions, SafetyFunctionKind::Sv, None).is_err());
    }
}
