//! Crash recorder: feeds samples into the ring and drives the GATT state

use crate::sample::CrashSample;
use gatt_table::{AttributeIndex, CrashService, DeviceStatus, GattError, Notification};
use ring_buffer::{RecordRing, RingBuffer, RingBufferError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Recorder errors
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Ring buffer error: {0}")]
    Ring(#[from] RingBufferError),

    #[error("GATT error: {0}")]
    Gatt(#[from] GattError),
}

/// What happened to a recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Sample logged
    Recorded,
    /// Sample logged and crossed the crash threshold
    CrashDetected,
    /// Sample logged and completed the post-crash window
    Frozen,
    /// Window already frozen, sample dropped
    Ignored,
}

/// Producer side of the crash log.
///
/// Ring and service sit behind async mutexes shared with every
/// [`GattHandle`], so the sampling loop and the BLE handlers never touch the
/// buffer concurrently. Locks are always taken ring first, then service.
pub struct Recorder {
    ring: Arc<Mutex<RecordRing<'static, CrashSample>>>,
    service: Arc<Mutex<CrashService>>,
    post_crash_samples: u32,
    remaining: Option<u32>,
    frozen: bool,
    pending: Vec<Notification>,
}

impl Recorder {
    /// Create a recorder over a ring sized for `CrashSample` records
    pub fn new(
        ring: RingBuffer<'static>,
        service: CrashService,
        post_crash_samples: u32,
    ) -> Result<Self, RecorderError> {
        let ring = RecordRing::from_ring(ring)?;
        info!(
            "Recorder ready: {} samples of history, {} post-crash",
            ring.inner().capacity_records(),
            post_crash_samples
        );
        Ok(Self {
            ring: Arc::new(Mutex::new(ring)),
            service: Arc::new(Mutex::new(service)),
            post_crash_samples,
            remaining: None,
            frozen: false,
            pending: Vec::new(),
        })
    }

    /// Log one sample and update crash state
    pub async fn record(&mut self, sample: &CrashSample) -> Result<RecordOutcome, RecorderError> {
        if self.frozen {
            return Ok(RecordOutcome::Ignored);
        }

        let mut ring = self.ring.lock().await;
        ring.push_record(sample)?;
        let ring_view = ring.inner();
        let mut service = self.service.lock().await;

        if service.status() == DeviceStatus::Idle {
            service.set_status(DeviceStatus::Recording);
        }

        let outcome = match self.remaining {
            None if sample.g_force_milli() >= service.threshold_milli_g() as u32 => {
                warn!(
                    "Crash detected at {} ms: {} mg (threshold {} mg)",
                    sample.timestamp_ms,
                    sample.g_force_milli(),
                    service.threshold_milli_g()
                );
                service.set_status(DeviceStatus::CrashDetected);
                self.pending
                    .push(service.notification(AttributeIndex::CharStatusValue, ring_view)?);
                self.remaining = Some(self.post_crash_samples);
                RecordOutcome::CrashDetected
            }
            None => RecordOutcome::Recorded,
            Some(left) => {
                self.remaining = Some(left.saturating_sub(1));
                RecordOutcome::Recorded
            }
        };

        if self.remaining == Some(0) {
            self.frozen = true;
            service.set_data_available(true);
            self.pending
                .push(service.notification(AttributeIndex::CharDataAvailableValue, ring_view)?);
            info!("Crash window frozen with {} samples", ring_view.len());
            return Ok(RecordOutcome::Frozen);
        }

        if service.debug_enabled() {
            debug!("Sample {:?} logged, cursor {}", sample, ring_view.get_index());
        }
        Ok(outcome)
    }

    /// Client-facing handle sharing this recorder's ring and service
    pub fn gatt(&self) -> GattHandle {
        GattHandle {
            ring: Arc::clone(&self.ring),
            service: Arc::clone(&self.service),
        }
    }

    /// Drain notifications queued for subscribed clients
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Whether the crash window is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Decode the newest `count` logged samples, oldest first
    pub async fn latest(&self, count: usize) -> Result<Vec<CrashSample>, RecorderError> {
        Ok(self.ring.lock().await.latest(count)?)
    }
}

/// BLE side of the crash log, cheap to clone into connection tasks
#[derive(Clone)]
pub struct GattHandle {
    ring: Arc<Mutex<RecordRing<'static, CrashSample>>>,
    service: Arc<Mutex<CrashService>>,
}

impl GattHandle {
    /// Serve a client read
    pub async fn serve_read(&self, handle: u16, offset: usize) -> Result<Vec<u8>, GattError> {
        let ring = self.ring.lock().await;
        let service = self.service.lock().await;
        service.read(handle, offset, ring.inner())
    }

    /// Apply a client write
    pub async fn serve_write(&self, handle: u16, value: &[u8]) -> Result<(), GattError> {
        self.service.lock().await.write(handle, value)
    }

    /// Handle of an attribute in the service table
    pub async fn handle_of(&self, index: AttributeIndex) -> u16 {
        self.service.lock().await.table().handle_of(index)
    }
}
