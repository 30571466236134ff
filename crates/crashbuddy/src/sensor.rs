//! Simulated IMU sampling service

use crate::config::CrashBuddyConfig;
use crate::sample::CrashSample;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Samples the impact spike lasts
const IMPACT_SAMPLES: u32 = 4;

/// Deterministic IMU stream: 1 g at rest with small vibration, plus an
/// optional impact spike
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    tick: u32,
    period_ms: u32,
    impact_at: Option<u32>,
    impact_milli_g: i16,
}

impl SensorSimulator {
    /// Create a simulator from the firmware config
    pub fn new(config: &CrashBuddyConfig) -> Self {
        Self {
            tick: 0,
            period_ms: (1000 / config.sample_rate_hz.max(1)).max(1),
            impact_at: config.impact_at_sample,
            impact_milli_g: config.impact_milli_g,
        }
    }

    /// Produce the next sample
    pub fn next_sample(&mut self) -> CrashSample {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let wobble = (tick % 7) as i16 * 3 - 9;
        let mut sample = CrashSample {
            timestamp_ms: tick.wrapping_mul(self.period_ms),
            accel: [wobble, -wobble, 1000 + wobble],
            gyro: [0, wobble * 2, 0],
        };

        if let Some(at) = self.impact_at {
            if (at..at.saturating_add(IMPACT_SAMPLES)).contains(&tick) {
                // Decaying frontal hit with some yaw
                let step = (tick - at) as i16;
                sample.accel[0] = self.impact_milli_g.saturating_neg() / (step + 1);
                sample.gyro[2] = 1800 / (step + 1);
            }
        }
        sample
    }
}

/// Async sampling task delivering samples over a channel
pub struct SensorService {
    receiver: mpsc::Receiver<CrashSample>,
}

impl SensorService {
    /// Spawn the sampler; it stops after `max_samples` (0 = unlimited)
    /// or when the service is dropped
    pub fn spawn(mut simulator: SensorSimulator, sample_rate_hz: u32, max_samples: u32) -> Self {
        let (tx, rx) = mpsc::channel::<CrashSample>(64);
        let period = Duration::from_micros(1_000_000 / sample_rate_hz.max(1) as u64);

        tokio::spawn(async move {
            info!("Sensor sampling at {} Hz", sample_rate_hz);
            let mut interval = tokio::time::interval(period);
            let mut sent = 0u32;

            while max_samples == 0 || sent < max_samples {
                interval.tick().await;
                if tx.send(simulator.next_sample()).await.is_err() {
                    debug!("Sample receiver dropped");
                    break;
                }
                sent += 1;
            }
            debug!("Sensor sampling stopped after {} samples", sent);
        });

        Self { receiver: rx }
    }

    /// Receive the next sample
    pub async fn next(&mut self) -> Option<CrashSample> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(impact: Option<u32>) -> CrashBuddyConfig {
        CrashBuddyConfig {
            sample_rate_hz: 100,
            impact_at_sample: impact,
            impact_milli_g: 8000,
            ..Default::default()
        }
    }

    #[test]
    fn test_resting_samples_near_one_g() {
        let mut sim = SensorSimulator::new(&config(None));
        for i in 0..50 {
            let sample = sim.next_sample();
            assert_eq!(sample.timestamp_ms, i * 10);
            assert!((980..=1020).contains(&sample.g_force_milli()));
        }
    }

    #[test]
    fn test_impact_spike() {
        let mut sim = SensorSimulator::new(&config(Some(3)));
        let samples: Vec<_> = (0..8).map(|_| sim.next_sample()).collect();
        assert!(samples[3].g_force_milli() >= 8000);
        assert!(samples[4].g_force_milli() > samples[5].g_force_milli());
        assert!(samples[7].g_force_milli() < 1100);
    }

    #[test]
    fn test_extreme_impact_settings_saturate() {
        let mut sim = SensorSimulator::new(&CrashBuddyConfig {
            impact_at_sample: Some(u32::MAX - 1),
            impact_milli_g: i16::MIN,
            ..config(None)
        });
        sim.tick = u32::MAX - 2;

        assert_eq!(sim.next_sample().accel[0], -6);
        let hit = sim.next_sample();
        assert_eq!(hit.accel[0], i16::MAX);
        // Spike window ends at the last representable tick
        assert_eq!(sim.next_sample().accel[0], 0);
        // Tick counter wraps back to zero
        assert_eq!(sim.next_sample().timestamp_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_stops_after_budget() {
        let mut service = SensorService::spawn(SensorSimulator::new(&config(None)), 100, 5);
        let mut received = 0;
        while let Some(sample) = service.next().await {
            assert_eq!(sample.timestamp_ms, received * 10);
            received += 1;
        }
        assert_eq!(received, 5);
    }
}
