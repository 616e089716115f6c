//! Audio manager: the surface gameplay code talks to.

use crate::config::{EngineConfig, EngineError, ResolvedBindings};
use crate::pool::{PlayMode, PlayOutcome, VoicePool};
use crate::positional::{ChannelKind, EntityRef, PositionalParams, PositionalSet};
use crate::ramp::RampScheduler;
use crate::tracker::PlaybackRecord;
use crate::voice::{Voice, VoiceBank};
use crate::{AudioSettings, ClipCatalog, ClipHandle, OutputBackend, SimulatedBackend, VoiceId};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything that exists only after [`AudioManager::init`].
struct Mixer {
    pool: VoicePool,
    positional: PositionalSet,
    ramps: RampScheduler,
    bindings: ResolvedBindings,
}

/// Voice pool, positional channels and gain ramps behind one handle.
///
/// All calls happen on the update thread. Nothing here fails at runtime:
/// busy pools drop triggers, missing clips are skipped, and every call made
/// before [`init`](Self::init) is a no-op.
pub struct AudioManager {
    config: EngineConfig,
    catalog: Arc<ClipCatalog>,
    bank: VoiceBank,
    rng: StdRng,
    mixer: Option<Mixer>,
}

impl AudioManager {
    /// Create a manager routed to `backend`. Call [`init`](Self::init) before use.
    pub fn new(
        config: EngineConfig,
        catalog: Arc<ClipCatalog>,
        backend: Box<dyn OutputBackend>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            catalog,
            bank: VoiceBank::new(backend, AudioSettings::default()),
            rng,
            mixer: None,
        }
    }

    /// Create a manager on a [`SimulatedBackend`] with default config and an
    /// empty catalog.
    ///
    /// Useful for testing or headless operation.
    pub fn stub() -> Self {
        Self::new(
            EngineConfig::default(),
            Arc::new(ClipCatalog::empty()),
            Box::new(SimulatedBackend::new()),
        )
    }

    /// Allocate the voice pool and positional channels and start the loops.
    ///
    /// Calling it again is a no-op. On error the manager stays uninitialized.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.mixer.is_some() {
            debug!("Audio manager already initialized");
            return Ok(());
        }
        self.config.validate()?;
        let bindings = self.config.bindings.resolve(&self.catalog)?;

        let pool = VoicePool::new(&mut self.bank, self.config.pool_size, self.config.louden_step);
        let params = PositionalParams {
            max_radius: self.config.max_radius,
            reduced_multiplier: self.config.reduced_multiplier,
            ambient_metric_max: self.config.ambient_metric_max,
        };
        let positional = PositionalSet::new(&mut self.bank, params, |kind| bindings.channel(kind));
        positional.start_loops(&mut self.bank);

        debug!(
            pool = pool.size(),
            voices = self.bank.len(),
            clips = self.catalog.len(),
            "Audio manager initialized"
        );
        self.mixer = Some(Mixer {
            pool,
            positional,
            ramps: RampScheduler::new(self.config.ramp_rate),
            bindings,
        });
        Ok(())
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.mixer.is_some()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clip catalog.
    pub fn catalog(&self) -> &ClipCatalog {
        &self.catalog
    }

    /// Get the current audio settings.
    pub fn settings(&self) -> &AudioSettings {
        self.bank.settings()
    }

    /// Update audio settings; live voices pick them up immediately.
    pub fn update_settings(&mut self, settings: AudioSettings) {
        self.bank.set_settings(settings);
    }

    /// Play `clip` on a free pool voice at `pitch`.
    pub fn play_pitched(&mut self, clip: ClipHandle, pitch: f32, mode: PlayMode) {
        let Some(mixer) = self.mixer.as_mut() else {
            trace!(%clip, "audio not initialized, ignoring play");
            return;
        };
        let outcome = mixer
            .pool
            .play(&mut self.bank, &self.catalog, clip, pitch, mode);
        trace!(%clip, pitch, ?outcome, "play");
    }

    /// Play `clip` at a random pitch from the configured window.
    pub fn play_random(&mut self, clip: ClipHandle, mode: PlayMode) {
        if self.mixer.is_none() {
            return;
        }
        let pitch = self.random_pitch();
        self.play_pitched(clip, pitch, mode);
    }

    /// Play a clip by catalog name.
    pub fn play_named(&mut self, name: &str, pitch: f32, mode: PlayMode) {
        match self.catalog.handle(name) {
            Some(clip) => self.play_pitched(clip, pitch, mode),
            None => debug!("Clip not in catalog: {name}"),
        }
    }

    /// Track `entity` on `kind`'s channel.
    pub fn init_positional_channel(&mut self, kind: ChannelKind, entity: EntityRef) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.positional.register(kind, entity);
        }
    }

    /// Retarget every positional channel for the listener at `listener`.
    ///
    /// Call once per simulation tick.
    pub fn update_positional_voices(&mut self, listener: Vec3) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer
                .positional
                .update_all(&self.bank, &mut mixer.ramps, listener);
        }
    }

    /// Silence every positional channel now and drop all tracked entities.
    pub fn clear_positional_voices(&mut self) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer
                .positional
                .clear_all(&mut self.bank, &mut mixer.ramps);
        }
    }

    /// Remap `kind`'s multiplier from a large-range world metric.
    pub fn set_channel_multiplier(&mut self, kind: ChannelKind, metric: f32) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer
                .positional
                .set_multiplier_from_metric(&self.bank, &mut mixer.ramps, kind, metric);
        }
    }

    /// Fire the bound clip of a non-looping channel on its own voice.
    ///
    /// The song channel plays a note instead; looping channels ignore this.
    pub fn play_channel_one_shot(&mut self, kind: ChannelKind) {
        if kind == ChannelKind::Song {
            self.play_note();
            return;
        }
        let pitch = self.random_pitch();
        let Some(mixer) = self.mixer.as_ref() else {
            return;
        };
        if kind.loops() {
            trace!(?kind, "looping channel ignores one-shots");
            return;
        }
        let channel = mixer.positional.channel(kind);
        let Some(clip) = channel.clip() else {
            debug!(?kind, "No clip bound for channel one-shot");
            return;
        };
        let voice = channel.voice();
        let gain = self.bank.gain(voice);
        self.bank.start(voice, clip, gain, pitch, false);
    }

    /// Play one of the song variants at a random pitch on the song voice.
    pub fn play_note(&mut self) {
        let Some(mixer) = self.mixer.as_ref() else {
            return;
        };
        let variants = mixer.bindings.song();
        if variants.is_empty() {
            debug!("No song variants bound");
            return;
        }
        let clip = variants[self.rng.gen_range(0..variants.len())];
        let voice = mixer.positional.channel(ChannelKind::Song).voice();
        let pitch = self.random_pitch();
        let gain = self.bank.gain(voice);
        self.bank.start(voice, clip, gain, pitch, false);
    }

    /// Play the ground effect for an impact at `source`.
    ///
    /// Gain comes from the source/listener distance rather than tracked
    /// entities; the ground voice ramps to it while the clip starts.
    pub fn play_ground_effect(&mut self, source: Vec3, listener: Vec3) {
        let pitch = self.random_pitch();
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        let voice = mixer.positional.ground_voice();
        let gain = mixer.positional.instant_gain(source, listener);
        mixer.ramps.ramp_to(&self.bank, voice, gain);
        match mixer.bindings.ground() {
            Some(clip) => {
                let current = self.bank.gain(voice);
                self.bank.start(voice, clip, current, pitch, false);
            }
            None => debug!("No ground clip bound"),
        }
    }

    /// Advance one tick: backend time, ramps, then completion watchers.
    pub fn tick(&mut self, dt: f32) {
        self.bank.advance(dt);
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        mixer.ramps.advance(&mut self.bank, dt);
        let reaped = mixer.pool.reap(&mut self.bank) + mixer.positional.reap(&mut self.bank);
        if reaped > 0 {
            trace!(reaped, "one-shot voices idled");
        }
    }

    /// Stop every one-shot pool voice and forget duplicate records.
    pub fn stop_all_one_shots(&mut self) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.pool.stop_all(&mut self.bank);
        }
    }

    /// Look up any voice.
    pub fn voice(&self, voice: VoiceId) -> Option<&Voice> {
        self.bank.voice(voice)
    }

    /// Engine-side gain of any voice.
    pub fn voice_gain(&self, voice: VoiceId) -> f32 {
        self.bank.gain(voice)
    }

    /// Whether a voice is audible right now.
    pub fn is_voice_playing(&self, voice: VoiceId) -> bool {
        self.bank.is_playing(voice)
    }

    /// Current gain of a positional channel.
    pub fn channel_gain(&self, kind: ChannelKind) -> f32 {
        self.mixer
            .as_ref()
            .map(|m| self.bank.gain(m.positional.channel(kind).voice()))
            .unwrap_or(0.0)
    }

    /// Current multiplier of a positional channel.
    pub fn channel_multiplier(&self, kind: ChannelKind) -> f32 {
        self.mixer
            .as_ref()
            .map(|m| m.positional.channel(kind).multiplier())
            .unwrap_or(0.0)
    }

    /// Voice dedicated to a positional channel.
    pub fn channel_voice(&self, kind: ChannelKind) -> Option<VoiceId> {
        self.mixer
            .as_ref()
            .map(|m| m.positional.channel(kind).voice())
    }

    /// Number of entities (live or destroyed) tracked by a channel.
    pub fn tracked_entities(&self, kind: ChannelKind) -> usize {
        self.mixer
            .as_ref()
            .map(|m| m.positional.channel(kind).entities().len())
            .unwrap_or(0)
    }

    /// Voice used for ground effects.
    pub fn ground_voice(&self) -> Option<VoiceId> {
        self.mixer.as_ref().map(|m| m.positional.ground_voice())
    }

    /// Pool voices currently playing.
    pub fn active_one_shots(&self) -> usize {
        self.mixer
            .as_ref()
            .map(|m| m.pool.active_count(&self.bank))
            .unwrap_or(0)
    }

    /// Pool voices in scan order.
    pub fn pool_voices(&self) -> &[VoiceId] {
        self.mixer.as_ref().map(|m| m.pool.slots()).unwrap_or(&[])
    }

    /// Duplicate record for a clip, if it plays in non-duplicate mode.
    pub fn playback_record(&self, clip: ClipHandle) -> Option<PlaybackRecord> {
        self.mixer.as_ref().and_then(|m| m.pool.record(clip))
    }

    /// Number of ramps in flight.
    pub fn active_ramps(&self) -> usize {
        self.mixer.as_ref().map(|m| m.ramps.active()).unwrap_or(0)
    }

    /// Trigger directly through the pool and report what happened.
    ///
    /// Same as [`play_pitched`](Self::play_pitched) for callers that care.
    pub fn try_play(&mut self, clip: ClipHandle, pitch: f32, mode: PlayMode) -> Option<PlayOutcome> {
        let mixer = self.mixer.as_mut()?;
        Some(
            mixer
                .pool
                .play(&mut self.bank, &self.catalog, clip, pitch, mode),
        )
    }

    fn random_pitch(&mut self) -> f32 {
        let base = self.config.pitch_base;
        let jitter = self.config.pitch_jitter;
        if jitter <= 0.0 {
            return base;
        }
        self.rng.gen_range(base - jitter..=base + jitter)
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::stub()
    }
}
