//! Voices and the bank that routes them to the output backend.

use crate::{AudioSettings, ClipHandle, OutputBackend};
use tracing::trace;

/// Index of a voice in the [`VoiceBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub usize);

/// Which volume setting scales a voice on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// One-shot effects
    Sfx,
    /// Positional loops and emitters
    Ambient,
}

/// Lifecycle of a voice as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// Nothing assigned, or the last one-shot has been reaped
    #[default]
    Idle,
    /// One-shot started; waiting for the backend to report it finished
    OneShot,
    /// Continuous loop
    Looping,
}

/// One playback channel.
#[derive(Debug, Clone)]
pub struct Voice {
    id: VoiceId,
    bus: Bus,
    clip: Option<ClipHandle>,
    gain: f32,
    pitch: f32,
    state: VoiceState,
}

impl Voice {
    /// Slot index of this voice.
    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// Clip last assigned, if any.
    pub fn clip(&self) -> Option<ClipHandle> {
        self.clip
    }

    /// Engine-side gain, before volume settings.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Playback rate last assigned.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Output bus.
    pub fn bus(&self) -> Bus {
        self.bus
    }
}

/// Every voice the engine owns, plus the backend they play through.
///
/// Voices are allocated once during init and never freed. Gains stored here
/// are engine-side values; the bank multiplies in [`AudioSettings`] whenever
/// it talks to the backend.
pub struct VoiceBank {
    voices: Vec<Voice>,
    backend: Box<dyn OutputBackend>,
    settings: AudioSettings,
}

impl VoiceBank {
    /// Empty bank routed to `backend`.
    pub fn new(backend: Box<dyn OutputBackend>, settings: AudioSettings) -> Self {
        Self {
            voices: Vec::new(),
            backend,
            settings,
        }
    }

    /// Allocate a new idle voice.
    pub fn allocate(&mut self, bus: Bus) -> VoiceId {
        let id = VoiceId(self.voices.len());
        self.voices.push(Voice {
            id,
            bus,
            clip: None,
            gain: 0.0,
            pitch: 1.0,
            state: VoiceState::Idle,
        });
        id
    }

    /// Number of allocated voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether no voices have been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Look up a voice.
    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id.0)
    }

    /// Engine-side gain of a voice (0 for unknown ids).
    pub fn gain(&self, id: VoiceId) -> f32 {
        self.voice(id).map(Voice::gain).unwrap_or(0.0)
    }

    /// Whether the backend still reports the voice as playing.
    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.backend.is_playing(id)
    }

    /// Assign a clip and start playback.
    pub fn start(&mut self, id: VoiceId, clip: ClipHandle, gain: f32, pitch: f32, looping: bool) {
        let Some(voice) = self.voices.get_mut(id.0) else {
            return;
        };
        voice.clip = Some(clip);
        voice.gain = gain;
        voice.pitch = pitch;
        voice.state = if looping {
            VoiceState::Looping
        } else {
            VoiceState::OneShot
        };
        let output = gain * self.settings.effective_volume(voice.bus);
        trace!(?id, %clip, gain, pitch, looping, "voice start");
        self.backend.start(id, clip, output, pitch, looping);
    }

    /// Set engine-side gain and push it to the backend.
    pub fn set_gain(&mut self, id: VoiceId, gain: f32) {
        let Some(voice) = self.voices.get_mut(id.0) else {
            return;
        };
        voice.gain = gain;
        let output = gain * self.settings.effective_volume(voice.bus);
        self.backend.set_gain(id, output);
    }

    /// Stop playback and mark the voice idle.
    pub fn stop(&mut self, id: VoiceId) {
        self.backend.stop(id);
        self.mark_idle(id);
    }

    /// Mark a voice idle after its playback ended. The clip stays recorded.
    pub fn mark_idle(&mut self, id: VoiceId) {
        if let Some(voice) = self.voices.get_mut(id.0) {
            voice.state = VoiceState::Idle;
        }
    }

    /// Advance backend time.
    pub fn advance(&mut self, dt: f32) {
        self.backend.advance(dt);
    }

    /// Current volume settings.
    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// Replace volume settings and re-push every voice's output gain.
    pub fn set_settings(&mut self, settings: AudioSettings) {
        self.settings = settings;
        for voice in &self.voices {
            let output = voice.gain * self.settings.effective_volume(voice.bus);
            self.backend.set_gain(voice.id, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedBackend;

    fn bank() -> VoiceBank {
        VoiceBank::new(Box::new(SimulatedBackend::new()), AudioSettings::default())
    }

    #[test]
    fn test_allocation_is_sequential() {
        let mut bank = bank();
        assert!(bank.is_empty());
        assert_eq!(bank.allocate(Bus::Sfx), VoiceId(0));
        assert_eq!(bank.allocate(Bus::Ambient), VoiceId(1));
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.voice(VoiceId(1)).unwrap().bus(), Bus::Ambient);
    }

    #[test]
    fn test_start_and_stop_track_state() {
        let mut bank = bank();
        let id = bank.allocate(Bus::Sfx);
        bank.start(id, ClipHandle(5), 0.8, 1.2, false);

        let voice = bank.voice(id).unwrap();
        assert_eq!(voice.state(), VoiceState::OneShot);
        assert_eq!(voice.clip(), Some(ClipHandle(5)));
        assert_eq!(voice.pitch(), 1.2);
        assert!(bank.is_playing(id));

        bank.stop(id);
        assert_eq!(bank.voice(id).unwrap().state(), VoiceState::Idle);
        assert!(!bank.is_playing(id));
    }

    #[test]
    fn test_unknown_voice_is_ignored() {
        let mut bank = bank();
        bank.set_gain(VoiceId(9), 1.0);
        bank.start(VoiceId(9), ClipHandle(1), 1.0, 1.0, false);
        assert_eq!(bank.gain(VoiceId(9)), 0.0);
        assert!(!bank.is_playing(VoiceId(9)));
    }
}
