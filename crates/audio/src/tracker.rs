//! In-flight records for clips played in non-duplicate mode.

use crate::{ClipHandle, VoiceId};
use std::collections::HashMap;

/// Links a clip to the voice currently playing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackRecord {
    /// Voice holding the clip
    pub voice: VoiceId,
    /// Suppressed repeats since the clip started
    pub replays: u32,
}

/// Clip -> record map. A clip is present only while its voice plays.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    records: HashMap<ClipHandle, PlaybackRecord>,
}

impl DuplicateTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `clip`, if it is playing in non-duplicate mode.
    pub fn get(&self, clip: ClipHandle) -> Option<PlaybackRecord> {
        self.records.get(&clip).copied()
    }

    /// Start tracking `clip` on `voice` with zero replays.
    pub fn insert(&mut self, clip: ClipHandle, voice: VoiceId) {
        self.records
            .insert(clip, PlaybackRecord { voice, replays: 0 });
    }

    /// Count one suppressed repeat and return the updated record.
    pub fn bump(&mut self, clip: ClipHandle) -> Option<PlaybackRecord> {
        let record = self.records.get_mut(&clip)?;
        record.replays = record.replays.saturating_add(1);
        Some(*record)
    }

    /// Drop the record for `clip` if it still belongs to `voice`.
    ///
    /// A clip may be replayed on another voice in duplicate mode; that voice
    /// finishing must not release the non-duplicate record.
    pub fn release(&mut self, clip: ClipHandle, voice: VoiceId) -> bool {
        match self.records.get(&clip) {
            Some(record) if record.voice == voice => {
                self.records.remove(&clip);
                true
            }
            _ => false,
        }
    }

    /// Number of tracked clips.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
