//! Strata Engine - control plane to audio thread hand-off
//!
//! Splits a channel strip into three handles:
//!
//! - [`Controller`] - owns the settings, designs coefficients, sends snapshots
//! - [`Processor`] - runs on the audio thread, never allocates or blocks
//! - [`MeterReader`] - receives per-block level readings
//!
//! The handles talk over bounded `crossbeam-channel` queues. Snapshots are
//! boxed on the control thread and boxed memory travels back on a return
//! queue to be freed there, so the audio thread never touches the allocator.
//!
//! ## Example
//!
//! ```rust
//! use strata_effects::eq::BandParams;
//!
//! let (mut controller, mut processor, meters) = strata_engine::engine(48000.0, 256).unwrap();
//!
//! controller
//!     .params_mut()
//!     .eq
//!     .add_band(BandParams::bell(2500.0, 4.0, 1.2))
//!     .unwrap();
//! controller.commit().unwrap();
//!
//! let mut left = [0.25f32; 256];
//! let mut right = [0.25f32; 256];
//! processor.process_block(&mut left, &mut right);
//!
//! let reading = meters.latest().unwrap();
//! assert_eq!(reading.block_index, 0);
//! ```

mod command;
mod controller;
mod error;
mod meter;
mod processor;

pub use controller::Controller;
pub use error::EngineError;
pub use meter::{MeterReader, MeterSnapshot};
pub use processor::{BYPASS_FADE_MS, Processor};

use crossbeam_channel::bounded;
use strata_effects::StripParams;

use command::Reconfiguration;

/// Commands the processor can have queued at once.
pub const COMMAND_CAPACITY: usize = 16;

/// Meter readings kept for a slow reader.
pub const METER_CAPACITY: usize = 8;

// Every command retires at most one box, and the controller drains the
// return queue before each send.
const RETIRE_CAPACITY: usize = 2 * COMMAND_CAPACITY + 2;

/// Builds an engine running the default strip: flat EQ, compressor and
/// reverb switched off.
pub fn engine(
    sample_rate: f64,
    max_block: usize,
) -> Result<(Controller, Processor, MeterReader), EngineError> {
    with_params(StripParams::default(), sample_rate, max_block)
}

/// Builds an engine starting from `params`.
pub fn with_params(
    params: StripParams,
    sample_rate: f64,
    max_block: usize,
) -> Result<(Controller, Processor, MeterReader), EngineError> {
    controller::check_config(sample_rate, max_block)?;
    let design = params.design(sample_rate)?;

    let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
    let (retire_tx, retire_rx) = bounded(RETIRE_CAPACITY);
    let (meter_tx, meter_rx) = bounded(METER_CAPACITY);

    let processor = Processor::new(
        Reconfiguration::new(&design, max_block),
        command_rx,
        retire_tx,
        meter_tx,
    );
    let controller = Controller::new(params, sample_rate, max_block, command_tx, retire_rx);

    tracing::info!(sample_rate, max_block, "engine created");
    Ok((controller, processor, MeterReader::new(meter_rx)))
}
