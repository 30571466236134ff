//! Attribute Index

use crate::{permission, property, uuid16};
use serde::{Deserialize, Serialize};

/// Number of attributes in the CrashBuddy service
pub const ATTRIBUTE_COUNT: usize = 14;

/// Position of each attribute within the service table
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeIndex {
    Service = 0,
    CharStatus,
    CharStatusValue,

    CharDataAvailable,
    CharDataAvailableValue,

    CharDataSize,
    CharDataSizeValue,

    CharSetThreshold,
    CharSetThresholdValue,

    CharSetEnableDebug,
    CharSetEnableDebugValue,

    CharCrashDataCharSize,
    CharCrashDataCharSizeValue,

    /// Start of the logged data points, served with long reads
    CharDataPointsInitial,
}

/// What an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Primary service declaration
    ServiceDeclaration,
    /// Characteristic declaration describing the following value
    CharacteristicDeclaration,
    /// Characteristic value
    Value,
}

impl AttributeIndex {
    /// All attributes in table order
    pub const ALL: [AttributeIndex; ATTRIBUTE_COUNT] = [
        AttributeIndex::Service,
        AttributeIndex::CharStatus,
        AttributeIndex::CharStatusValue,
        AttributeIndex::CharDataAvailable,
        AttributeIndex::CharDataAvailableValue,
        AttributeIndex::CharDataSize,
        AttributeIndex::CharDataSizeValue,
        AttributeIndex::CharSetThreshold,
        AttributeIndex::CharSetThresholdValue,
        AttributeIndex::CharSetEnableDebug,
        AttributeIndex::CharSetEnableDebugValue,
        AttributeIndex::CharCrashDataCharSize,
        AttributeIndex::CharCrashDataCharSizeValue,
        AttributeIndex::CharDataPointsInitial,
    ];

    /// Look up an attribute by table position
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Kind of attribute at this position
    pub fn kind(&self) -> AttributeKind {
        use AttributeIndex::*;
        match self {
            Service => AttributeKind::ServiceDeclaration,
            CharStatus | CharDataAvailable | CharDataSize | CharSetThreshold
            | CharSetEnableDebug | CharCrashDataCharSize => {
                AttributeKind::CharacteristicDeclaration
            }
            _ => AttributeKind::Value,
        }
    }

    /// 16-bit UUID of the attribute type
    pub fn uuid16(&self) -> u16 {
        use AttributeIndex::*;
        match self {
            Service => uuid16::PRIMARY_SERVICE,
            CharStatus | CharDataAvailable | CharDataSize | CharSetThreshold
            | CharSetEnableDebug | CharCrashDataCharSize => uuid16::CHARACTERISTIC,
            CharStatusValue => uuid16::STATUS,
            CharDataAvailableValue => uuid16::DATA_AVAILABLE,
            CharDataSizeValue => uuid16::DATA_SIZE,
            CharSetThresholdValue => uuid16::SET_THRESHOLD,
            CharSetEnableDebugValue => uuid16::SET_ENABLE_DEBUG,
            CharCrashDataCharSizeValue => uuid16::CRASH_DATA_CHAR_SIZE,
            CharDataPointsInitial => uuid16::DATA_POINTS,
        }
    }

    /// Characteristic properties advertised for the value
    pub fn properties(&self) -> u8 {
        use AttributeIndex::*;
        match self.value() {
            CharStatusValue | CharDataAvailableValue => property::READ | property::NOTIFY,
            CharSetThresholdValue | CharSetEnableDebugValue | CharCrashDataCharSizeValue => {
                property::READ | property::WRITE
            }
            _ => property::READ,
        }
    }

    /// Access permissions of this attribute
    pub fn permissions(&self) -> u8 {
        match self.kind() {
            AttributeKind::Value if self.properties() & property::WRITE != 0 => {
                permission::READABLE | permission::WRITABLE
            }
            _ => permission::READABLE,
        }
    }

    /// Value attribute described by a declaration (itself for values)
    pub fn value(&self) -> AttributeIndex {
        match self.kind() {
            AttributeKind::CharacteristicDeclaration => Self::ALL[*self as usize + 1],
            _ => *self,
        }
    }
}
