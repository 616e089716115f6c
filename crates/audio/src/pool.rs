//! Fixed pool of one-shot voices with duplicate suppression.

use crate::tracker::{DuplicateTracker, PlaybackRecord};
use crate::voice::{Bus, VoiceBank, VoiceState};
use crate::{ClipCatalog, ClipHandle, VoiceId};
use tracing::trace;

/// How a trigger treats a clip that is already playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayMode {
    /// Suppress the trigger if the clip already plays in non-duplicate mode.
    pub non_duplicate: bool,
    /// When suppressed, make the existing voice louder instead.
    pub louden_duplicates: bool,
}

impl PlayMode {
    /// Every trigger gets its own voice.
    pub const OVERLAP: Self = Self {
        non_duplicate: false,
        louden_duplicates: false,
    };

    /// Repeats are dropped while the clip plays.
    pub const UNIQUE: Self = Self {
        non_duplicate: true,
        louden_duplicates: false,
    };

    /// Repeats raise the gain of the voice already playing the clip.
    pub const LOUDEN: Self = Self {
        non_duplicate: true,
        louden_duplicates: true,
    };
}

/// Result of a single trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// A free voice picked up the clip.
    Started(VoiceId),
    /// Duplicate folded into the existing voice, now at `gain`.
    Loudened {
        /// Voice already playing the clip
        voice: VoiceId,
        /// New engine-side gain
        gain: f32,
    },
    /// Duplicate dropped without touching anything.
    Suppressed,
    /// Every voice was busy.
    Dropped,
}

/// Fixed set of one-shot voice slots, scanned first-fit.
#[derive(Debug)]
pub struct VoicePool {
    slots: Vec<VoiceId>,
    tracker: DuplicateTracker,
    louden_step: f32,
}

impl VoicePool {
    /// Allocate `size` SFX voices from `bank`.
    pub fn new(bank: &mut VoiceBank, size: usize, louden_step: f32) -> Self {
        let slots = (0..size).map(|_| bank.allocate(Bus::Sfx)).collect();
        Self {
            slots,
            tracker: DuplicateTracker::new(),
            louden_step,
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Voices owned by the pool, in scan order.
    pub fn slots(&self) -> &[VoiceId] {
        &self.slots
    }

    /// Record for a clip playing in non-duplicate mode.
    pub fn record(&self, clip: ClipHandle) -> Option<PlaybackRecord> {
        self.tracker.get(clip)
    }

    /// Number of clips with a live record.
    pub fn tracked_clips(&self) -> usize {
        self.tracker.len()
    }

    /// Trigger `clip` at `pitch`.
    pub fn play(
        &mut self,
        bank: &mut VoiceBank,
        catalog: &ClipCatalog,
        clip: ClipHandle,
        pitch: f32,
        mode: PlayMode,
    ) -> PlayOutcome {
        if mode.non_duplicate {
            if let Some(record) = self.tracker.get(clip) {
                if !mode.louden_duplicates {
                    trace!(%clip, "duplicate suppressed");
                    return PlayOutcome::Suppressed;
                }
                let replays = self.tracker.bump(clip).map_or(record.replays, |r| r.replays);
                let base = catalog.default_gain(clip);
                let gain = (base + self.louden_step * replays as f32).clamp(0.0, 1.0);
                bank.set_gain(record.voice, gain);
                trace!(%clip, replays, gain, "duplicate loudened");
                return PlayOutcome::Loudened {
                    voice: record.voice,
                    gain,
                };
            }
        }

        let Some(slot) = self.slots.iter().copied().find(|&id| !bank.is_playing(id)) else {
            trace!(%clip, "voice pool exhausted, dropping");
            return PlayOutcome::Dropped;
        };

        // A slot can finish and be reused before the next reap.
        self.finish(bank, slot);

        let gain = catalog.default_gain(clip);
        bank.start(slot, clip, gain, pitch, false);
        if mode.non_duplicate {
            self.tracker.insert(clip, slot);
        }
        PlayOutcome::Started(slot)
    }

    /// Completion watcher: reclaim slots whose playback has ended.
    ///
    /// Called once per tick, so a record outlives its playback by at most one
    /// tick.
    pub fn reap(&mut self, bank: &mut VoiceBank) -> usize {
        let mut reaped = 0;
        for i in 0..self.slots.len() {
            let slot = self.slots[i];
            if !bank.is_playing(slot) && self.finish(bank, slot) {
                reaped += 1;
            }
        }
        reaped
    }

    /// Voices currently playing a one-shot.
    pub fn active_count(&self, bank: &VoiceBank) -> usize {
        self.slots.iter().filter(|&&id| bank.is_playing(id)).count()
    }

    /// Stop every slot and forget all records.
    pub fn stop_all(&mut self, bank: &mut VoiceBank) {
        for &slot in &self.slots {
            bank.stop(slot);
        }
        self.tracker.clear();
    }

    fn finish(&mut self, bank: &mut VoiceBank, slot: VoiceId) -> bool {
        let Some(voice) = bank.voice(slot) else {
            return false;
        };
        if voice.state() != VoiceState::OneShot {
            return false;
        }
        if let Some(clip) = voice.clip() {
            if self.tracker.release(clip, slot) {
                trace!(%clip, ?slot, "playback record released");
            }
        }
        bank.mark_idle(slot);
        true
    }
}
