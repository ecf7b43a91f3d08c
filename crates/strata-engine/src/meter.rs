//! Metering transport from the audio thread.

use crossbeam_channel::Receiver;

/// Levels of one processed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSnapshot {
    /// Input peak level in dBFS.
    pub input_peak_db: f64,
    /// Input RMS level in dBFS.
    pub input_rms_db: f64,
    /// Output peak level in dBFS.
    pub output_peak_db: f64,
    /// Output RMS level in dBFS.
    pub output_rms_db: f64,
    /// Compressor gain reduction in dB (positive), 0 when bypassed.
    pub gain_reduction_db: f64,
    /// Number of blocks processed before this one.
    pub block_index: u64,
}

/// Reader half of the metering channel.
///
/// Snapshots are published with `try_send` and dropped when the channel is
/// full, so a slow reader only ever misses readings.
#[derive(Debug, Clone)]
pub struct MeterReader {
    rx: Receiver<MeterSnapshot>,
}

impl MeterReader {
    pub(crate) fn new(rx: Receiver<MeterSnapshot>) -> Self {
        Self { rx }
    }

    /// Most recent snapshot, discarding older ones.
    pub fn latest(&self) -> Option<MeterSnapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }
}
