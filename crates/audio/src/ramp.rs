//! Per-voice gain ramps.
//!
//! Each voice has at most one ramp. Starting a new ramp replaces the old
//! one in place, so a superseded ramp never runs another step.

use crate::voice::VoiceBank;
use crate::VoiceId;
use std::collections::BTreeMap;
use tracing::trace;

/// One gain interpolation in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampTask {
    /// Gain sampled when the ramp started
    pub start: f32,
    /// Gain the ramp ends on
    pub target: f32,
    /// Interpolation parameter in `[0, 1]`
    pub t: f32,
}

impl RampTask {
    /// Gain at the current parameter.
    pub fn gain(&self) -> f32 {
        if self.t >= 1.0 {
            self.target
        } else {
            self.start + (self.target - self.start) * smoothstep(self.t)
        }
    }

    fn is_done(&self) -> bool {
        self.t >= 1.0
    }
}

/// Drives every active ramp once per tick.
#[derive(Debug)]
pub struct RampScheduler {
    rate: f32,
    tasks: BTreeMap<VoiceId, RampTask>,
}

impl RampScheduler {
    /// Scheduler whose ramps complete after `1 / rate` seconds.
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            tasks: BTreeMap::new(),
        }
    }

    /// Ramp `voice` from its current gain to `target`, replacing any ramp
    /// already running for it.
    pub fn ramp_to(&mut self, bank: &VoiceBank, voice: VoiceId, target: f32) {
        let task = RampTask {
            start: bank.gain(voice),
            target,
            t: 0.0,
        };
        if let Some(old) = self.tasks.insert(voice, task) {
            trace!(?voice, old = old.target, new = target, "ramp superseded");
        }
    }

    /// Like [`ramp_to`](Self::ramp_to), but keeps a ramp already heading to
    /// `target` and skips voices already sitting on it.
    ///
    /// Per-tick callers use this so an unchanged target still completes.
    pub fn retarget(&mut self, bank: &VoiceBank, voice: VoiceId, target: f32) -> bool {
        let current = match self.tasks.get(&voice) {
            Some(task) => task.target,
            None => bank.gain(voice),
        };
        if (current - target).abs() <= f32::EPSILON {
            return false;
        }
        self.ramp_to(bank, voice, target);
        true
    }

    /// Drop the ramp for `voice`, leaving its gain where it is.
    pub fn cancel(&mut self, voice: VoiceId) -> Option<RampTask> {
        self.tasks.remove(&voice)
    }

    /// Drop every ramp.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// The ramp running for `voice`, if any.
    pub fn task(&self, voice: VoiceId) -> Option<&RampTask> {
        self.tasks.get(&voice)
    }

    /// Number of ramps in flight.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    /// Step every ramp by `dt` seconds and push gains to the bank.
    ///
    /// Returns the voices whose ramp finished on this step.
    pub fn advance(&mut self, bank: &mut VoiceBank, dt: f32) -> Vec<VoiceId> {
        let step = dt.max(0.0) * self.rate;
        let mut finished = Vec::new();
        self.tasks.retain(|&voice, task| {
            task.t = (task.t + step).min(1.0);
            bank.set_gain(voice, task.gain());
            if task.is_done() {
                finished.push(voice);
                false
            } else {
                true
            }
        });
        finished
    }
}

/// Ease-in/ease-out curve on `[0, 1]`.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
