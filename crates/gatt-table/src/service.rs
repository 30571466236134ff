//! CrashBuddy Service State and Attribute Access

use crate::attribute::{AttributeIndex, AttributeKind};
use crate::table::AttributeTable;
use crate::{permission, GattError, MAX_ATTRIBUTE_LEN};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Device state reported through the status characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Powered, not logging
    Idle,
    /// Logging samples into the ring
    Recording,
    /// Threshold exceeded, crash window frozen
    CrashDetected,
}

/// Status characteristic payload (postcard encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: DeviceStatus,
    pub data_available: bool,
    pub records_held: u32,
    pub record_size: u16,
}

/// Value pushed to subscribed clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub handle: u16,
    pub value: Vec<u8>,
}

/// Writable service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashServiceConfig {
    /// Crash threshold in milli-g
    pub threshold_milli_g: u16,
    /// Bytes returned per data points read
    pub char_size: u16,
    /// Verbose debug output
    pub enable_debug: bool,
}

impl Default for CrashServiceConfig {
    fn default() -> Self {
        Self {
            threshold_milli_g: 4000,
            char_size: 240,
            enable_debug: false,
        }
    }
}

/// Crash data GATT service
pub struct CrashService {
    table: AttributeTable,
    config: CrashServiceConfig,
    status: DeviceStatus,
    data_available: bool,
}

impl CrashService {
    /// Create the service over a registered table
    pub fn new(table: AttributeTable, config: CrashServiceConfig) -> Result<Self, GattError> {
        check_char_size(config.char_size as usize)?;
        info!(
            "Crash service ready: threshold {} mg, {} bytes per read",
            config.threshold_milli_g, config.char_size
        );
        Ok(Self {
            table,
            config,
            status: DeviceStatus::Idle,
            data_available: false,
        })
    }

    /// Serve a client read of `handle` starting at byte `offset`
    pub fn read(
        &self,
        handle: u16,
        offset: usize,
        ring: &RingBuffer<'_>,
    ) -> Result<Vec<u8>, GattError> {
        let index = self.table.index_of(handle)?;
        if self.table.entry(index).permissions & permission::READABLE == 0 {
            return Err(GattError::ReadNotPermitted(handle));
        }

        if index == AttributeIndex::CharDataPointsInitial {
            return self.read_data_points(offset, ring);
        }

        let value = self.value_of(index, ring)?;
        if offset > value.len() {
            return Err(GattError::InvalidOffset(offset));
        }
        Ok(value[offset..].to_vec())
    }

    /// Apply a client write to `handle`
    pub fn write(&mut self, handle: u16, value: &[u8]) -> Result<(), GattError> {
        let index = self.table.index_of(handle)?;
        if self.table.entry(index).permissions & permission::WRITABLE == 0 {
            return Err(GattError::WriteNotPermitted(handle));
        }

        match index {
            AttributeIndex::CharSetThresholdValue => {
                self.config.threshold_milli_g = u16::from_le_bytes(fixed(value)?);
                info!("Crash threshold set to {} mg", self.config.threshold_milli_g);
            }
            AttributeIndex::CharSetEnableDebugValue => {
                let flag = fixed::<1>(value)?[0];
                self.config.enable_debug = flag != 0;
                info!("Debug output {}", if flag != 0 { "enabled" } else { "disabled" });
            }
            AttributeIndex::CharCrashDataCharSizeValue => {
                let size = u16::from_le_bytes(fixed(value)?);
                check_char_size(size as usize)?;
                self.config.char_size = size;
                info!("Data points read size set to {} bytes", size);
            }
            _ => return Err(GattError::WriteNotPermitted(handle)),
        }
        Ok(())
    }

    /// Build a notification carrying the current value of `index`
    pub fn notification(
        &self,
        index: AttributeIndex,
        ring: &RingBuffer<'_>,
    ) -> Result<Notification, GattError> {
        Ok(Notification {
            handle: self.table.handle_of(index),
            value: self.value_of(index, ring)?,
        })
    }

    /// Status report for the current state
    pub fn status_report(&self, ring: &RingBuffer<'_>) -> StatusReport {
        StatusReport {
            status: self.status,
            data_available: self.data_available,
            records_held: ring.len() as u32,
            record_size: ring.record_size() as u16,
        }
    }

    /// Update the device status
    pub fn set_status(&mut self, status: DeviceStatus) {
        if self.status != status {
            debug!("Status {:?} -> {:?}", self.status, status);
            self.status = status;
        }
    }

    /// Update the data available flag
    pub fn set_data_available(&mut self, available: bool) {
        self.data_available = available;
    }

    /// Current device status
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    /// Whether crash data is available
    pub fn data_available(&self) -> bool {
        self.data_available
    }

    /// Crash threshold in milli-g
    pub fn threshold_milli_g(&self) -> u16 {
        self.config.threshold_milli_g
    }

    /// Whether debug output is enabled
    pub fn debug_enabled(&self) -> bool {
        self.config.enable_debug
    }

    /// Bytes per data points read
    pub fn char_size(&self) -> u16 {
        self.config.char_size
    }

    /// Registered attribute table
    pub fn table(&self) -> &AttributeTable {
        &self.table
    }

    /// Full value of a non data points attribute
    fn value_of(
        &self,
        index: AttributeIndex,
        ring: &RingBuffer<'_>,
    ) -> Result<Vec<u8>, GattError> {
        let value = match index.kind() {
            AttributeKind::ServiceDeclaration => {
                crate::uuid16::CRASH_SERVICE.to_le_bytes().to_vec()
            }
            AttributeKind::CharacteristicDeclaration => {
                let target = index.value();
                let mut decl = vec![index.properties()];
                decl.extend_from_slice(&self.table.handle_of(target).to_le_bytes());
                decl.extend_from_slice(&target.uuid16().to_le_bytes());
                decl
            }
            AttributeKind::Value => match index {
                AttributeIndex::CharStatusValue => postcard::to_allocvec(&self.status_report(ring))
                    .map_err(|e| GattError::Encode(e.to_string()))?,
                AttributeIndex::CharDataAvailableValue => vec![self.data_available as u8],
                AttributeIndex::CharDataSizeValue => {
                    ((ring.len() * ring.record_size()) as u32).to_le_bytes().to_vec()
                }
                AttributeIndex::CharSetThresholdValue => {
                    self.config.threshold_milli_g.to_le_bytes().to_vec()
                }
                AttributeIndex::CharSetEnableDebugValue => vec![self.config.enable_debug as u8],
                AttributeIndex::CharCrashDataCharSizeValue => {
                    self.config.char_size.to_le_bytes().to_vec()
                }
                _ => {
                    let per_read = self.records_per_read(ring.record_size());
                    let mut window = vec![0u8; per_read * ring.record_size()];
                    let copied = ring.pop_latest(per_read, &mut window)?;
                    window.truncate(copied * ring.record_size());
                    window
                }
            },
        };
        Ok(value)
    }

    /// Records served per data points read, at least one
    fn records_per_read(&self, record_size: usize) -> usize {
        (self.config.char_size as usize / record_size).max(1)
    }

    /// Map a long-read byte offset onto a window of valid records
    fn read_data_points(&self, offset: usize, ring: &RingBuffer<'_>) -> Result<Vec<u8>, GattError> {
        let record_size = ring.record_size();
        if offset % record_size != 0 {
            return Err(GattError::InvalidOffset(offset));
        }

        let first = offset / record_size;
        let held = ring.len();
        if first >= held {
            return Ok(Vec::new());
        }

        let count = self.records_per_read(record_size).min(held - first);
        let mut value = vec![0u8; count * record_size];
        ring.pop(ring.oldest_offset() + first, count, &mut value)?;

        debug!(
            "Data points read: offset {} -> records {}..{} of {}",
            offset,
            first,
            first + count,
            held
        );
        Ok(value)
    }
}

/// Interpret a written value as exactly `N` bytes
fn fixed<const N: usize>(value: &[u8]) -> Result<[u8; N], GattError> {
    value.try_into().map_err(|_| GattError::InvalidLength {
        expected: N,
        actual: value.len(),
    })
}

fn check_char_size(size: usize) -> Result<(), GattError> {
    if size == 0 || size > MAX_ATTRIBUTE_LEN {
        return Err(GattError::ValueOutOfRange {
            value: size,
            min: 1,
            max: MAX_ATTRIBUTE_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u16 = 0x0028;

    fn service(char_size: u16) -> CrashService {
        let table = AttributeTable::new(START).unwrap();
        CrashService::new(
            table,
            CrashServiceConfig {
                char_size,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn handle(index: AttributeIndex) -> u16 {
        START + index as u16
    }

    fn fill(ring: &mut RingBuffer<'_>, pushes: u8) {
        for n in 0..pushes {
            ring.push(&[n; 4]).unwrap();
        }
    }

    #[test]
    fn test_status_report_round_trip() {
        let mut storage = [0u8; 16];
        let mut ring = RingBuffer::over(&mut storage, 4).unwrap();
        fill(&mut ring, 3);

        let mut svc = service(8);
        svc.set_status(DeviceStatus::CrashDetected);
        svc.set_data_available(true);

        let bytes = svc.read(handle(AttributeIndex::CharStatusValue), 0, &ring).unwrap();
        let report: StatusReport = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(
            report,
            StatusReport {
                status: DeviceStatus::CrashDetected,
                data_available: true,
                records_held: 3,
                record_size: 4,
            }
        );
    }

    #[test]
    fn test_characteristic_declaration_value() {
        let mut storage = [0u8; 16];
        let ring = RingBuffer::over(&mut storage, 4).unwrap();
        let svc = service(8);

        let decl = svc.read(handle(AttributeIndex::CharSetThreshold), 0, &ring).unwrap();
        let value_handle = handle(AttributeIndex::CharSetThresholdValue).to_le_bytes();
        let uuid = crate::uuid16::SET_THRESHOLD.to_le_bytes();
        assert_eq!(decl, vec![0x0A, value_handle[0], value_handle[1], uuid[0], uuid[1]]);

        let svc_decl = svc.read(handle(AttributeIndex::Service), 0, &ring).unwrap();
        assert_eq!(svc_decl, vec![0xFF, 0x00]);
    }

    #[test]
    fn test_data_size_counts_valid_bytes() {
        let mut storage = [0u8; 16];
        let mut ring = RingBuffer::over(&mut storage, 4).unwrap();
        fill(&mut ring, 2);
        let svc = service(8);
        let bytes = svc.read(handle(AttributeIndex::CharDataSizeValue), 0, &ring).unwrap();
        assert_eq!(bytes, 8u32.to_le_bytes().to_vec());

        fill(&mut ring, 9);
        let bytes = svc.read(handle(AttributeIndex::CharDataSizeValue), 0, &ring).unwrap();
        assert_eq!(bytes, 16u32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_data_points_long_read_after_wrap() {
        let mut storage = [0u8; 16];
        let mut ring = RingBuffer::over(&mut storage, 4).unwrap();
        fill(&mut ring, 6);
        let svc = service(8);
        let h = handle(AttributeIndex::CharDataPointsInitial);

        assert_eq!(svc.read(h, 0, &ring).unwrap(), vec![2, 2, 2, 2, 3, 3, 3, 3]);
        assert_eq!(svc.read(h, 8, &ring).unwrap(), vec![4, 4, 4, 4, 5, 5, 5, 5]);
        assert!(svc.read(h, 16, &ring).unwrap().is_empty());
        assert_eq!(svc.read(h, 6, &ring), Err(GattError::InvalidOffset(6)));
    }

    #[test]
    fn test_data_points_partial_fill() {
        let mut storage = [0u8; 16];
        let mut ring = RingBuffer::over(&mut storage, 4).unwrap();
        fill(&mut ring, 3);
        let svc = service(8);
        let h = handle(AttributeIndex::CharDataPointsInitial);

        assert_eq!(svc.read(h, 0, &ring).unwrap(), vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(svc.read(h, 8, &ring).unwrap(), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_small_char_size_serves_one_record() {
        let mut storage = [0u8; 16];
        let mut ring = RingBuffer::over(&mut storage, 4).unwrap();
        fill(&mut ring, 3);
        let svc = service(2);
        let h = handle(AttributeIndex::CharDataPointsInitial);

        assert_eq!(svc.read(h, 0, &ring).unwrap(), vec![0, 0, 0, 0]);
        let note = svc
            .notification(AttributeIndex::CharDataPointsInitial, &ring)
            .unwrap();
        assert_eq!(note.value, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_writes_update_settings() {
        let mut storage = [0u8; 16];
        let ring = RingBuffer::over(&mut storage, 4).unwrap();
        let mut svc = service(8);

        svc.write(handle(AttributeIndex::CharSetThresholdValue), &2500u16.to_le_bytes())
            .unwrap();
        svc.write(handle(AttributeIndex::CharSetEnableDebugValue), &[1]).unwrap();
        svc.write(handle(AttributeIndex::CharCrashDataCharSizeValue), &[20, 0])
            .unwrap();

        assert_eq!(svc.threshold_milli_g(), 2500);
        assert!(svc.debug_enabled());
        assert_eq!(svc.char_size(), 20);
        assert_eq!(
            svc.read(handle(AttributeIndex::CharSetThresholdValue), 0, &ring).unwrap(),
            2500u16.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_write_errors() {
        let mut svc = service(8);
        assert_eq!(
            svc.write(handle(AttributeIndex::CharStatusValue), &[1]),
            Err(GattError::WriteNotPermitted(handle(AttributeIndex::CharStatusValue)))
        );
        assert_eq!(
            svc.write(handle(AttributeIndex::CharSetThresholdValue), &[1, 2, 3]),
            Err(GattError::InvalidLength { expected: 2, actual: 3 })
        );
        let err = svc
            .write(handle(AttributeIndex::CharCrashDataCharSizeValue), &0u16.to_le_bytes())
            .unwrap_err();
        assert_eq!(err.att_code(), 0x13);
        assert_eq!(svc.write(0x0001, &[0]), Err(GattError::UnknownHandle(0x0001)));
    }

    #[test]
    fn test_read_offset_past_value() {
        let mut storage = [0u8; 16];
        let ring = RingBuffer::over(&mut storage, 4).unwrap();
        let svc = service(8);
        let h = handle(AttributeIndex::CharSetThresholdValue);
        assert_eq!(svc.read(h, 1, &ring).unwrap().len(), 1);
        assert_eq!(svc.read(h, 2, &ring).unwrap().len(), 0);
        assert_eq!(svc.read(h, 3, &ring), Err(GattError::InvalidOffset(3)));
    }

    #[test]
    fn test_notification_targets_value_handle() {
        let mut storage = [0u8; 16];
        let ring = RingBuffer::over(&mut storage, 4).unwrap();
        let mut svc = service(8);
        svc.set_data_available(true);
        let note = svc
            .notification(AttributeIndex::CharDataAvailableValue, &ring)
            .unwrap();
        assert_eq!(note.handle, handle(AttributeIndex::CharDataAvailableValue));
        assert_eq!(note.value, vec![1]);
    }
}
