// crates/fsoe-rs/src/safety/parameter.rs

use crate::FsoeError;
use crate::dictionary::SafeValue;
use crate::types::DataType;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A configuration value of the safety application (limits, delays,
/// error reactions).
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyParameter {
    pub uid: String,
    data_type: DataType,
    value: SafeValue,
}

impl SafetyParameter {
    /// Creates a parameter holding `value`.
    pub fn new(uid: &str, value: SafeValue) -> Self {
        Self {
            uid: uid.to_string(),
            data_type: value.data_type(),
            value,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn get(&self) -> SafeValue {
        self.value
    }

    /// Writes a new value. It must be of the parameter's data type.
    pub fn set(&mut self, value: SafeValue) -> Result<(), FsoeError> {
        if value.data_type() != self.data_type {
            return Err(FsoeError::InvalidValue {
                name: self.uid.clone(),
                expected: self.data_type,
            });
        }
        self.value = value;
        Ok(())
    }
}

/// Serializes the parameter values in order into 16-bit little-endian words,
/// padding an odd byte count with a zero byte. This is the input of the
/// SRA CRC.
pub fn application_parameter_words<'a, I>(parameters: I) -> Vec<u16>
where
    I: IntoIterator<Item = &'a SafetyParameter>,
{
    let mut data: Vec<u8> = parameters
        .into_iter()
        .flat_map(|parameter| parameter.value.serialize())
        .collect();
    if data.len() % 2 != 0 {
        data.push(0);
    }
    data.chunks_exact(2)
        .map(|word| u16::from_le_bytes([word[0], word[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_checks_type() {
        let mut parameter = SafetyParameter::new("FSOE_SS1_TIME_TO_STO_1", SafeValue::UInt16(10));
        parameter.set(SafeValue::UInt16(250)).unwrap();
        assert_eq!(parameter.get(), SafeValue::UInt16(250));

        let result = parameter.set(SafeValue::UInt32(1));
        assert!(matches!(
            result,
            Err(FsoeError::InvalidValue { expected: DataType::UInt16, .. })
        ));
        assert_eq!(parameter.get(), SafeValue::UInt16(250));
    }

    #[test]
    fn test_application_parameter_words() {
        let parameters = [
            SafetyParameter::new("A", SafeValue::UInt8(0x12)),
            SafetyParameter::new("B", SafeValue::UInt32(0xAABB_CCDD)),
            SafetyParameter::new("C", SafeValue::Bool(true)),
            SafetyParameter::new("D", SafeValue::Int16(-2)),
        ];
        // 12 DD CC BB AA 01 FE FF
        assert_eq!(
            application_parameter_words(&parameters),
            [0xDD12, 0xBBCC, 0x01AA, 0xFFFE]
        );
        assert_eq!(application_parameter_words(&parameters[..1]), [0x0012]);
        assert!(application_parameter_words(core::iter::empty()).is_empty());
    }
}
