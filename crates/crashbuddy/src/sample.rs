//! Crash log sample record

use ring_buffer::Record;

/// One IMU reading as stored in the crash log (16 bytes, little-endian)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrashSample {
    /// Milliseconds since boot
    pub timestamp_ms: u32,
    /// Acceleration x/y/z (milli-g)
    pub accel: [i16; 3],
    /// Angular velocity x/y/z (deci-degrees per second)
    pub gyro: [i16; 3],
}

impl CrashSample {
    /// Total acceleration magnitude (milli-g)
    pub fn g_force_milli(&self) -> u32 {
        let sum: f64 = self.accel.iter().map(|&a| (a as f64) * (a as f64)).sum();
        sum.sqrt().round() as u32
    }
}

impl Record for CrashSample {
    const SIZE: usize = 16;

    fn encode(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        for (i, v) in self.accel.iter().chain(self.gyro.iter()).enumerate() {
            let at = 4 + i * 2;
            out[at..at + 2].copy_from_slice(&v.to_le_bytes());
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        let word = |at: usize| i16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            timestamp_ms: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            accel: [word(4), word(6), word(8)],
            gyro: [word(10), word(12), word(14)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let sample = CrashSample {
            timestamp_ms: 0x0403_0201,
            accel: [1, -1, 1000],
            gyro: [0, 0, -300],
        };
        let mut bytes = [0u8; CrashSample::SIZE];
        sample.encode(&mut bytes);
        assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[6..8], &[0xFF, 0xFF]);
        assert_eq!(CrashSample::decode(&bytes), sample);
    }

    #[test]
    fn test_g_force_at_rest() {
        let sample = CrashSample {
            accel: [0, 0, 1000],
            ..Default::default()
        };
        assert_eq!(sample.g_force_milli(), 1000);

        let impact = CrashSample {
            accel: [-3000, 4000, 0],
            ..Default::default()
        };
        assert_eq!(impact.g_force_milli(), 5000);
    }
}
