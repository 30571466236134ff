//! Attribute Table and Handle Assignment

use crate::attribute::{AttributeIndex, ATTRIBUTE_COUNT};
use crate::GattError;
use tracing::debug;
use uuid::Uuid;

/// Bluetooth base UUID (0000xxxx-0000-1000-8000-00805F9B34FB)
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Expand a 16-bit UUID onto the Bluetooth base UUID
pub(crate) fn expand_uuid16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// One registered attribute
#[derive(Debug, Clone)]
pub struct AttributeEntry {
    /// Position in the service
    pub index: AttributeIndex,
    /// Assigned handle
    pub handle: u16,
    /// Full attribute type UUID
    pub uuid: Uuid,
    /// Access permissions
    pub permissions: u8,
}

/// Attribute table with consecutive handles
#[derive(Debug, Clone)]
pub struct AttributeTable {
    start_handle: u16,
    entries: Vec<AttributeEntry>,
}

impl AttributeTable {
    /// Register the service starting at `start_handle`
    pub fn new(start_handle: u16) -> Result<Self, GattError> {
        let last = start_handle as usize + ATTRIBUTE_COUNT - 1;
        if start_handle == 0 || last > u16::MAX as usize {
            return Err(GattError::InvalidHandleRange(start_handle));
        }

        let entries = AttributeIndex::ALL
            .iter()
            .map(|&index| AttributeEntry {
                index,
                handle: start_handle + index as u16,
                uuid: expand_uuid16(index.uuid16()),
                permissions: index.permissions(),
            })
            .collect();

        debug!(
            "Attribute table registered at handles 0x{:04X}..=0x{:04X}",
            start_handle, last
        );

        Ok(Self {
            start_handle,
            entries,
        })
    }

    /// Handle assigned to an attribute
    pub fn handle_of(&self, index: AttributeIndex) -> u16 {
        self.start_handle + index as u16
    }

    /// Attribute registered at a handle
    pub fn index_of(&self, handle: u16) -> Result<AttributeIndex, GattError> {
        handle
            .checked_sub(self.start_handle)
            .and_then(|offset| u8::try_from(offset).ok())
            .and_then(AttributeIndex::from_u8)
            .ok_or(GattError::UnknownHandle(handle))
    }

    /// Entry for an attribute
    pub fn entry(&self, index: AttributeIndex) -> &AttributeEntry {
        &self.entries[index as usize]
    }

    /// All entries in handle order
    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_consecutive() {
        let table = AttributeTable::new(0x0028).unwrap();
        assert_eq!(table.handle_of(AttributeIndex::Service), 0x0028);
        assert_eq!(table.handle_of(AttributeIndex::CharDataPointsInitial), 0x0035);
        assert_eq!(
            table.index_of(0x002A).unwrap(),
            AttributeIndex::CharStatusValue
        );
        assert_eq!(table.entries().len(), ATTRIBUTE_COUNT);
    }

    #[test]
    fn test_unknown_handles() {
        let table = AttributeTable::new(0x0010).unwrap();
        assert_eq!(table.index_of(0x000F), Err(GattError::UnknownHandle(0x000F)));
        assert_eq!(table.index_of(0x001E), Err(GattError::UnknownHandle(0x001E)));
        assert_eq!(table.index_of(0x0110), Err(GattError::UnknownHandle(0x0110)));
    }

    #[test]
    fn test_handle_range_checked() {
        assert!(AttributeTable::new(0).is_err());
        assert!(AttributeTable::new(0xFFF5).is_err());
        assert!(AttributeTable::new(0xFFF2).is_ok());
    }

    proptest::proptest! {
        #[test]
        fn handle_lookup_is_inverse(start in 1u16..=0xFFF2, position in 0u8..ATTRIBUTE_COUNT as u8) {
            let table = AttributeTable::new(start).unwrap();
            let index = AttributeIndex::from_u8(position).unwrap();
            proptest::prop_assert_eq!(table.index_of(table.handle_of(index)), Ok(index));
            proptest::prop_assert_eq!(table.entry(index).handle, table.handle_of(index));
        }
    }

    #[test]
    fn test_uuid_expansion() {
        let uuid = expand_uuid16(0x2800);
        assert_eq!(
            uuid.to_string(),
            "00002800-0000-1000-8000-00805f9b34fb"
        );
        let table = AttributeTable::new(1).unwrap();
        assert_eq!(
            table.entry(AttributeIndex::CharStatusValue).uuid,
            expand_uuid16(0xFF01)
        );
    }
}
