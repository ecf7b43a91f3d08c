//! Control-plane half of the engine.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use strata_effects::StripParams;

use crate::command::{Command, Reconfiguration, Retired};
use crate::error::EngineError;

/// Control-plane handle.
///
/// Owns the authoritative [`StripParams`]. Edits go through
/// [`params_mut`](Self::params_mut) and reach the audio thread on
/// [`commit`](Self::commit), which does all coefficient design here and
/// sends the finished snapshot across. Memory the processor is done with
/// comes back and is freed on this thread.
pub struct Controller {
    params: StripParams,
    sample_rate: f64,
    max_block: usize,
    bypassed: bool,
    commands: Sender<Command>,
    retired: Receiver<Retired>,
}

impl Controller {
    pub(crate) fn new(
        params: StripParams,
        sample_rate: f64,
        max_block: usize,
        commands: Sender<Command>,
        retired: Receiver<Retired>,
    ) -> Self {
        Self {
            params,
            sample_rate,
            max_block,
            bypassed: false,
            commands,
            retired,
        }
    }

    /// Current settings.
    pub fn params(&self) -> &StripParams {
        &self.params
    }

    /// Mutable access to the settings. Nothing reaches the audio thread
    /// until [`commit`](Self::commit).
    pub fn params_mut(&mut self) -> &mut StripParams {
        &mut self.params
    }

    /// Replaces the settings wholesale and commits them.
    ///
    /// On error the previous settings are kept.
    pub fn load(&mut self, params: StripParams) -> Result<(), EngineError> {
        let previous = core::mem::replace(&mut self.params, params);
        self.commit().inspect_err(|_| self.params = previous)
    }

    /// Sample rate snapshots are designed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Maximum block size the processor is prepared for.
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Whether the last bypass request was to bypass.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Designs the current settings and sends them to the processor.
    ///
    /// Invalid settings leave the running snapshot untouched. A full queue
    /// returns [`EngineError::QueueFull`]; the settings stay pending and the
    /// next successful commit carries them.
    pub fn commit(&mut self) -> Result<(), EngineError> {
        self.collect_garbage();
        let design = self.params.design(self.sample_rate).inspect_err(|e| {
            tracing::warn!(error = %e, "commit: strip settings rejected");
        })?;
        self.send(Command::Snapshot(Box::new(design)))?;
        tracing::debug!(
            sample_rate = self.sample_rate,
            bands = self.params.eq.len(),
            "commit: snapshot queued"
        );
        Ok(())
    }

    /// Fades the strip out (`true`) or back in over a few milliseconds.
    pub fn set_bypass(&mut self, bypassed: bool) -> Result<(), EngineError> {
        self.collect_garbage();
        self.send(Command::Bypass(bypassed))?;
        self.bypassed = bypassed;
        tracing::debug!(bypassed, "set_bypass");
        Ok(())
    }

    /// Re-initialises the processor for a new sample rate or block size.
    ///
    /// A fresh strip is allocated and designed here; the processor swaps it
    /// in at its next block. All filter, envelope and delay state restarts
    /// from silence.
    pub fn reconfigure(&mut self, sample_rate: f64, max_block: usize) -> Result<(), EngineError> {
        check_config(sample_rate, max_block)?;
        self.collect_garbage();
        let design = self.params.design(sample_rate)?;
        let next = Reconfiguration::new(&design, max_block);
        self.send(Command::Reconfigure(Box::new(next)))?;
        tracing::info!(
            from = self.sample_rate,
            to = sample_rate,
            max_block,
            "reconfigure"
        );
        self.sample_rate = sample_rate;
        self.max_block = max_block;
        Ok(())
    }

    /// Frees everything the processor has handed back. Returns the number of
    /// items freed.
    ///
    /// Called by every sending method; call it directly when idle for long
    /// stretches.
    pub fn collect_garbage(&mut self) -> usize {
        let mut freed = 0;
        while let Ok(item) = self.retired.try_recv() {
            match item {
                Retired::Snapshot(design) => drop(design),
                Retired::Reconfiguration(state) => drop(state),
            }
            freed += 1;
        }
        if freed > 0 {
            tracing::trace!(freed, "collect_garbage");
        }
        freed
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::warn!("command queue full");
                EngineError::QueueFull
            }
            TrySendError::Disconnected(_) => EngineError::Disconnected,
        })
    }
}

/// Rejects rates and block sizes the processor cannot run with.
pub(crate) fn check_config(sample_rate: f64, max_block: usize) -> Result<(), EngineError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(EngineError::InvalidSampleRate(sample_rate));
    }
    if max_block == 0 {
        return Err(EngineError::InvalidBlockSize(max_block));
    }
    Ok(())
}
