//! Per-block level metering.
//!
//! [`BlockMeter`] accumulates peak and mean-square over whatever samples it
//! is fed, and [`BlockMeter::take`] returns the reading and starts over.
//! Accumulation is a compare and a multiply-add per sample.

use strata_core::linear_to_db;

/// Floor reported for silence, dB.
pub const METER_FLOOR_DB: f64 = -144.0;

/// Peak and RMS of one block, in dBFS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    /// Largest absolute sample.
    pub peak_db: f64,
    /// Root-mean-square level.
    pub rms_db: f64,
}

impl Default for LevelReading {
    fn default() -> Self {
        Self::SILENT
    }
}

impl LevelReading {
    /// Reading for a block of zeros.
    pub const SILENT: Self = Self {
        peak_db: METER_FLOOR_DB,
        rms_db: METER_FLOOR_DB,
    };
}

/// Stereo peak/RMS accumulator.
#[derive(Debug, Clone, Default)]
pub struct BlockMeter {
    peak: f64,
    sum_squares: f64,
    samples: usize,
}

impl BlockMeter {
    /// Creates an empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one stereo frame. Both channels count toward the same reading.
    #[inline]
    pub fn accumulate(&mut self, left: f64, right: f64) {
        let (al, ar) = (left.abs(), right.abs());
        if al > self.peak {
            self.peak = al;
        }
        if ar > self.peak {
            self.peak = ar;
        }
        self.sum_squares += left * left + right * right;
        self.samples += 2;
    }

    /// Adds a block of `f32` channels.
    pub fn accumulate_block(&mut self, left: &[f32], right: &[f32]) {
        for (&l, &r) in left.iter().zip(right) {
            self.accumulate(f64::from(l), f64::from(r));
        }
    }

    /// Returns the reading since the last call and clears the accumulator.
    pub fn take(&mut self) -> LevelReading {
        let reading = self.peek();
        *self = Self::default();
        reading
    }

    /// Current reading without clearing.
    pub fn peek(&self) -> LevelReading {
        if self.samples == 0 {
            return LevelReading::SILENT;
        }
        let rms = libm::sqrt(self.sum_squares / self.samples as f64);
        LevelReading {
            peak_db: linear_to_db(self.peak).max(METER_FLOOR_DB),
            rms_db: linear_to_db(rms).max(METER_FLOOR_DB),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_reads_floor() {
        let mut meter = BlockMeter::new();
        assert_eq!(meter.take(), LevelReading::SILENT);
        meter.accumulate(0.0, 0.0);
        assert_eq!(meter.take(), LevelReading::SILENT);
    }

    #[test]
    fn test_full_scale_square() {
        let mut meter = BlockMeter::new();
        for i in 0..100 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            meter.accumulate(x, x);
        }
        let r = meter.take();
        assert!(r.peak_db.abs() < 1e-9);
        assert!(r.rms_db.abs() < 1e-9);
    }

    #[test]
    fn test_sine_rms_is_3db_below_peak() {
        let mut meter = BlockMeter::new();
        let left: Vec<f32> = (0..4800)
            .map(|n| (core::f32::consts::TAU * 1000.0 * n as f32 / 48000.0).sin() * 0.5)
            .collect();
        meter.accumulate_block(&left, &left);
        let r = meter.take();
        assert!((r.peak_db - (-6.02)).abs() < 0.01, "peak {}", r.peak_db);
        assert!((r.peak_db - r.rms_db - 3.01).abs() < 0.02, "rms {}", r.rms_db);
    }

    #[test]
    fn test_take_clears() {
        let mut meter = BlockMeter::new();
        meter.accumulate(0.5, 0.5);
        let _ = meter.take();
        assert_eq!(meter.peek(), LevelReading::SILENT);
    }
}
