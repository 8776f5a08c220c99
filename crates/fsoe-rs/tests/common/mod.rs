// crates/fsoe-rs/tests/common/mod.rs
//! A safety drive with two SS1, six SSR and four SLS instances, and the
//! registers its safety PDUs can map.

#![allow(dead_code)]

use fsoe_rs::frame::{MASTER_FRAME_ELEMENTS, SLAVE_FRAME_ELEMENTS};
use fsoe_rs::{
    DataType, DictionaryItem, Register, SafeValue, SafetyFunction, SafetyItemDictionary,
    SafetyParameter,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SAFE_INPUTS: &str = "FSOE_SAFE_INPUTS_VALUE";
pub const SAFE_POSITION: &str = "FSOE_SAFE_POSITION";
pub const SAFE_VELOCITY: &str = "FSOE_SAFE_VELOCITY";

/// Sends the test logs through the test harness.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

pub struct Drive {
    pub dictionary: Arc<SafetyItemDictionary>,
    pub registers: BTreeMap<String, Register>,
    pub parameters: Vec<SafetyParameter>,
}

impl Drive {
    pub fn new() -> Self {
        let mut items = Vec::new();
        let mut registers = BTreeMap::new();
        let mut parameters = Vec::new();

        let mut add = |item: fn(&str, u32, DataType) -> DictionaryItem,
                       name: &str,
                       index: u16,
                       sub_index: u8,
                       data_type: DataType| {
            let key = DictionaryItem::key_for_register(index, sub_index);
            items.push(item(name, key, data_type));
            registers.insert(name.to_string(), Register::new(name, index, sub_index));
        };

        add(DictionaryItem::input_output, "FSOE_STO", 0x6640, 0, DataType::Bool);
        add(DictionaryItem::input_output, "FSOE_SBC", 0x6680, 0, DataType::Bool);
        add(DictionaryItem::input, SAFE_INPUTS, 0x46D1, 0, DataType::Bool);
        add(DictionaryItem::input, SAFE_POSITION, 0x6648, 0, DataType::Int32);
        add(DictionaryItem::input, SAFE_VELOCITY, 0x6649, 0, DataType::Int32);
        for i in 1..=2u8 {
            add(DictionaryItem::input_output, &format!("FSOE_SS1_{i}"), 0x6650, i, DataType::Bool);
        }
        for i in 1..=6u8 {
            add(
                DictionaryItem::input_output,
                &format!("FSOE_SSR_COMMAND_{i}"),
                0x6D00,
                i,
                DataType::Bool,
            );
        }
        for i in 1..=4u8 {
            add(
                DictionaryItem::input_output,
                &format!("FSOE_SLS_CMD_{i}"),
                0x6D80,
                i,
                DataType::Bool,
            );
        }
        for i in 1..=9u8 {
            add(
                DictionaryItem::output,
                &format!("FSOE_USER_WORD_{i}"),
                0x2000,
                i,
                DataType::UInt16,
            );
        }
        add(DictionaryItem::output, "FSOE_USER_BYTE", 0x2001, 0, DataType::UInt8);
        add(DictionaryItem::input, "FSOE_USER_FEEDBACK", 0x2002, 0, DataType::UInt32);

        for elements in [&MASTER_FRAME_ELEMENTS, &SLAVE_FRAME_ELEMENTS] {
            let index = if elements.side == "master" { 0x6700 } else { 0x6710 };
            let mut frame = |uid: String, sub_index: u8| {
                registers.insert(uid.clone(), Register::new(&uid, index, sub_index));
            };
            frame(elements.command_uid.to_string(), 1);
            frame(elements.connection_id_uid.to_string(), 2);
            for slot in 0..8 {
                frame(elements.crc_uid(slot), 3 + slot as u8);
            }
        }

        let mut parameter = |uid: String, value: SafeValue| {
            parameters.push(SafetyParameter::new(&uid, value));
        };
        parameter("FSOE_SAFE_INPUTS_MAP".into(), SafeValue::UInt8(1));
        parameter("FSOE_SBC_BRAKE_TIME_DELAY".into(), SafeValue::UInt16(100));
        parameter("FSOE_POSITION_TOLERANCE".into(), SafeValue::UInt32(20));
        for i in 1..=2 {
            parameter(format!("FSOE_SS1_TIME_TO_STO_{i}"), SafeValue::UInt16(500));
        }
        for i in 1..=6 {
            parameter(format!("FSOE_SSR_UPPER_LIMIT_{i}"), SafeValue::Int32(1000));
            parameter(format!("FSOE_SSR_LOWER_LIMIT_{i}"), SafeValue::Int32(-1000));
            parameter(format!("FSOE_SSR_ERROR_REACTION_{i}"), SafeValue::UInt32(0x6640_0000));
        }
        for i in 1..=4 {
            parameter(format!("FSOE_SLS_VELOCITY_LIMIT_{i}"), SafeValue::UInt32(3000));
            parameter(format!("FSOE_SLS_ERROR_REACTION_{i}"), SafeValue::UInt32(0x6640_0000));
        }
        parameter("FSOE_USER_OVER_TEMPERATURE".into(), SafeValue::UInt16(90));

        let dictionary = SafetyItemDictionary::new(items).expect("valid dictionary");
        Self {
            dictionary: Arc::new(dictionary),
            registers,
            parameters,
        }
    }

    pub fn functions(&self) -> Vec<SafetyFunction> {
        SafetyFunction::for_dictionary(&self.dictionary, &self.parameters)
            .expect("safety functions")
    }

    pub fn item(&self, name: &str) -> Arc<DictionaryItem> {
        Arc::clone(self.dictionary.require(name).expect("item in dictionary"))
    }
}
