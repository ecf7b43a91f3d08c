//! Audio-thread half of the engine.

use crossbeam_channel::{Receiver, Sender};
use strata_core::{Effect, LinearRamp, sanitize};
use strata_effects::{BlockMeter, StripDesign};

use crate::command::{Command, Reconfiguration, Retired};
use crate::meter::MeterSnapshot;

/// Bypass crossfade length.
pub const BYPASS_FADE_MS: f64 = 5.0;

/// Real-time processor.
///
/// Owns the working copy of the strip. Commands from the
/// [`Controller`](crate::Controller) are only looked at when a block starts,
/// so every block is processed with one consistent set of coefficients.
/// [`process_block`](Self::process_block) never allocates, never blocks and
/// never frees memory.
pub struct Processor {
    state: Reconfiguration,
    bypass_fade: LinearRamp,
    commands: Receiver<Command>,
    retired: Sender<Retired>,
    meters: Sender<MeterSnapshot>,
    input_meter: BlockMeter,
    output_meter: BlockMeter,
    block_index: u64,
}

impl Processor {
    pub(crate) fn new(
        state: Reconfiguration,
        commands: Receiver<Command>,
        retired: Sender<Retired>,
        meters: Sender<MeterSnapshot>,
    ) -> Self {
        let bypass_fade = LinearRamp::with_config(1.0, state.sample_rate, BYPASS_FADE_MS);
        Self {
            state,
            bypass_fade,
            commands,
            retired,
            meters,
            input_meter: BlockMeter::new(),
            output_meter: BlockMeter::new(),
            block_index: 0,
        }
    }

    /// Sample rate currently being processed.
    pub fn sample_rate(&self) -> f64 {
        self.state.sample_rate
    }

    /// Largest block processed in one pass; longer buffers are split.
    pub fn max_block(&self) -> usize {
        self.state.max_block
    }

    /// Latency the strip adds, in samples.
    pub fn latency_samples(&self) -> usize {
        self.state.strip.latency_samples()
    }

    /// Number of blocks processed so far.
    pub fn block_index(&self) -> u64 {
        self.block_index
    }

    /// Processes one buffer in place.
    ///
    /// Non-finite input samples are replaced by silence. Channels of unequal
    /// length are processed up to the shorter one.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_commands();

        let frames = left.len().min(right.len());
        let mut start = 0;
        while start < frames {
            let end = (start + self.state.max_block).min(frames);
            self.process_chunk(&mut left[start..end], &mut right[start..end]);
            start = end;
        }

        self.publish_meters();
        self.block_index += 1;
    }

    fn process_chunk(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len();
        let state = &mut self.state;
        let dry_left = &mut state.dry_left[..n];
        let dry_right = &mut state.dry_right[..n];

        for i in 0..n {
            let (l, r) = (sanitize(left[i]), sanitize(right[i]));
            left[i] = l;
            right[i] = r;
            dry_left[i] = l;
            dry_right[i] = r;
        }
        self.input_meter.accumulate_block(dry_left, dry_right);

        // The strip keeps running while bypassed so its tails and lookahead
        // follow the input and nothing stale comes back on un-bypass.
        state.strip.process_block_stereo(left, right);

        let fade = &mut self.bypass_fade;
        if !fade.is_settled() {
            for i in 0..n {
                let g = fade.advance() as f32;
                left[i] = dry_left[i] + (left[i] - dry_left[i]) * g;
                right[i] = dry_right[i] + (right[i] - dry_right[i]) * g;
            }
        } else if fade.get() <= 0.0 {
            left.copy_from_slice(dry_left);
            right.copy_from_slice(dry_right);
        }

        self.output_meter.accumulate_block(left, right);
    }

    fn drain_commands(&mut self) {
        let mut pending: Option<Box<StripDesign>> = None;

        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Snapshot(design) => {
                    if let Some(stale) = pending.replace(design) {
                        self.retire(Retired::Snapshot(stale));
                    }
                }
                Command::Bypass(bypassed) => {
                    self.bypass_fade
                        .set_target(if bypassed { 0.0 } else { 1.0 });
                }
                Command::Reconfigure(mut next) => {
                    core::mem::swap(&mut self.state, &mut *next);
                    self.bypass_fade.set_sample_rate(self.state.sample_rate);
                    self.bypass_fade.snap_to_target();
                    self.input_meter = BlockMeter::new();
                    self.output_meter = BlockMeter::new();
                    self.retire(Retired::Reconfiguration(next));
                }
            }
        }

        if let Some(design) = pending {
            // Snapshots designed for a previous rate are superseded by the
            // design that came with the reconfiguration.
            if design.sample_rate == self.state.sample_rate {
                self.state.strip.apply(&design);
            }
            self.retire(Retired::Snapshot(design));
        }
    }

    fn retire(&self, item: Retired) {
        // The retire channel holds more than the command queue can deliver
        // between two controller calls, so this only fails once the
        // controller is gone.
        let _ = self.retired.try_send(item);
    }

    fn publish_meters(&mut self) {
        let input = self.input_meter.take();
        let output = self.output_meter.take();
        let gain_reduction_db = if self.bypass_fade.is_settled() && self.bypass_fade.get() <= 0.0
        {
            0.0
        } else {
            self.state.strip.gain_reduction_db()
        };
        let _ = self.meters.try_send(MeterSnapshot {
            input_peak_db: input.peak_db,
            input_rms_db: input.rms_db,
            output_peak_db: output.peak_db,
            output_rms_db: output.rms_db,
            gain_reduction_db,
            block_index: self.block_index,
        });
    }
}
