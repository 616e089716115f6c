//! Positional voices whose gain follows the nearest tracked entity.
//!
//! The world hands the set shared [`EntityRef`]s. Entities are never
//! deregistered one by one; they mark themselves destroyed and drop out of
//! the distance computation on the next update. [`PositionalSet::clear_all`]
//! empties everything on scene transitions.

use crate::ramp::RampScheduler;
use crate::voice::{Bus, VoiceBank, VoiceState};
use crate::{ClipHandle, VoiceId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, trace};

/// World object whose distance drives a channel's gain.
///
/// Shared between the world (writer) and the audio engine (reader) on the
/// update thread; writes are visible on the next update.
#[derive(Debug)]
pub struct TrackedEntity {
    position: Cell<Vec3>,
    destroyed: Cell<bool>,
}

/// Shared handle to a [`TrackedEntity`].
pub type EntityRef = Rc<TrackedEntity>;

impl TrackedEntity {
    /// New live entity at `position`.
    pub fn new(position: Vec3) -> EntityRef {
        Rc::new(Self {
            position: Cell::new(position),
            destroyed: Cell::new(false),
        })
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.position.get()
    }

    /// Move the entity.
    pub fn set_position(&self, position: Vec3) {
        self.position.set(position);
    }

    /// Whether the entity has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Mark destroyed. Permanent.
    pub fn destroy(&self) {
        self.destroyed.set(true);
    }
}

/// Number of [`ChannelKind`]s.
pub const CHANNEL_COUNT: usize = 5;

/// Fixed set of positional channel categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Collectible pickups humming nearby (looping, reduced multiplier)
    Collect,
    /// Scattered fragments (looping, reduced multiplier)
    Fragment,
    /// Hazards announcing themselves with one-shots
    Hazard,
    /// Ambient wind loop whose multiplier follows a world metric
    Wind,
    /// Song emitters; plays notes instead of a loop
    Song,
}

impl ChannelKind {
    /// Every kind, in channel order.
    pub const ALL: [ChannelKind; CHANNEL_COUNT] = [
        ChannelKind::Collect,
        ChannelKind::Fragment,
        ChannelKind::Hazard,
        ChannelKind::Wind,
        ChannelKind::Song,
    ];

    /// Whether the channel runs a continuous loop from init.
    pub fn loops(self) -> bool {
        matches!(
            self,
            ChannelKind::Collect | ChannelKind::Fragment | ChannelKind::Wind
        )
    }

    /// Whether the channel uses the reduced multiplier.
    pub fn is_reduced(self) -> bool {
        matches!(self, ChannelKind::Collect | ChannelKind::Fragment)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ChannelKind::Collect => 0,
            ChannelKind::Fragment => 1,
            ChannelKind::Hazard => 2,
            ChannelKind::Wind => 3,
            ChannelKind::Song => 4,
        }
    }
}

/// Map a squared distance onto `[0, 1]`: 1 at zero, 0 at or past `max_sq`.
pub fn proximity(distance_sq: f32, max_sq: f32) -> f32 {
    if max_sq <= 0.0 || distance_sq.is_nan() {
        return 0.0;
    }
    1.0 - (distance_sq / max_sq).clamp(0.0, 1.0)
}

/// One channel: a voice, a multiplier and the entities it tracks.
#[derive(Debug)]
pub struct PositionalChannel {
    kind: ChannelKind,
    voice: VoiceId,
    clip: Option<ClipHandle>,
    multiplier: f32,
    entities: Vec<EntityRef>,
}

impl PositionalChannel {
    /// Channel category.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Dedicated voice.
    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    /// Bound clip, if any.
    pub fn clip(&self) -> Option<ClipHandle> {
        self.clip
    }

    /// Scale applied to the distance-derived gain.
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Tracked entities, live or destroyed.
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Smallest squared distance from `listener` to a live entity.
    pub fn nearest_distance_sq(&self, listener: Vec3) -> Option<f32> {
        self.entities
            .iter()
            .filter(|e| !e.is_destroyed())
            .map(|e| e.position().distance_squared(listener))
            .min_by(f32::total_cmp)
    }

    /// Gain this channel should converge to for `listener`.
    pub fn target_gain(&self, listener: Vec3, max_radius: f32) -> f32 {
        match self.nearest_distance_sq(listener) {
            Some(distance_sq) => {
                proximity(distance_sq, max_radius * max_radius) * self.multiplier
            }
            None => 0.0,
        }
    }
}

/// Channel parameters decided at init.
#[derive(Debug, Clone, Copy)]
pub struct PositionalParams {
    /// Radius at which gain reaches zero
    pub max_radius: f32,
    /// Multiplier for collect/fragment channels
    pub reduced_multiplier: f32,
    /// Upper end of the metric fed to `set_multiplier_from_metric`
    pub ambient_metric_max: f32,
}

/// Every positional channel plus the dedicated note and ground voices.
#[derive(Debug)]
pub struct PositionalSet {
    channels: Vec<PositionalChannel>,
    ground_voice: VoiceId,
    params: PositionalParams,
}

impl PositionalSet {
    /// Allocate one ambient voice per channel kind and the ground voice.
    pub fn new(
        bank: &mut VoiceBank,
        params: PositionalParams,
        clip_for: impl Fn(ChannelKind) -> Option<ClipHandle>,
    ) -> Self {
        let channels = ChannelKind::ALL
            .iter()
            .map(|&kind| PositionalChannel {
                kind,
                voice: bank.allocate(Bus::Ambient),
                clip: clip_for(kind),
                multiplier: if kind.is_reduced() {
                    params.reduced_multiplier
                } else {
                    1.0
                },
                entities: Vec::new(),
            })
            .collect();
        let ground_voice = bank.allocate(Bus::Sfx);
        Self {
            channels,
            ground_voice,
            params,
        }
    }

    /// Start the always-on loops at zero gain.
    pub fn start_loops(&self, bank: &mut VoiceBank) {
        for channel in self.channels.iter().filter(|c| c.kind.loops()) {
            match channel.clip {
                Some(clip) => bank.start(channel.voice, clip, 0.0, 1.0, true),
                None => debug!(kind = ?channel.kind, "No clip bound, loop not started"),
            }
        }
    }

    /// Look up a channel.
    pub fn channel(&self, kind: ChannelKind) -> &PositionalChannel {
        &self.channels[kind.index()]
    }

    /// Voice used by ground effects.
    pub fn ground_voice(&self) -> VoiceId {
        self.ground_voice
    }

    /// Track `entity` on `kind`. No dedup.
    pub fn register(&mut self, kind: ChannelKind, entity: EntityRef) {
        self.channels[kind.index()].entities.push(entity);
    }

    /// Recompute every channel's target from `listener` and ramp toward it.
    pub fn update_all(&self, bank: &VoiceBank, ramps: &mut RampScheduler, listener: Vec3) {
        for channel in &self.channels {
            let target = channel.target_gain(listener, self.params.max_radius);
            ramps.retarget(bank, channel.voice, target);
        }
    }

    /// Silence every channel immediately and forget tracked entities.
    pub fn clear_all(&mut self, bank: &mut VoiceBank, ramps: &mut RampScheduler) {
        for channel in &mut self.channels {
            ramps.cancel(channel.voice);
            bank.set_gain(channel.voice, 0.0);
            channel.entities.clear();
        }
        debug!("Positional channels cleared");
    }

    /// Set a channel's multiplier from a large-range metric using the same
    /// normalization as distances.
    ///
    /// Lowering the multiplier below where the channel is heading ramps it
    /// down to the new cap right away.
    pub fn set_multiplier_from_metric(
        &mut self,
        bank: &VoiceBank,
        ramps: &mut RampScheduler,
        kind: ChannelKind,
        metric: f32,
    ) {
        let multiplier = proximity(metric, self.params.ambient_metric_max);
        trace!(?kind, metric, multiplier, "channel multiplier");
        let channel = &mut self.channels[kind.index()];
        channel.multiplier = multiplier;

        let voice = channel.voice;
        let heading = ramps.task(voice).map_or(bank.gain(voice), |task| task.target);
        if heading > multiplier {
            ramps.retarget(bank, voice, multiplier);
        }
    }

    /// Mark channel and ground one-shots idle once the backend has finished
    /// them. Loops are left alone.
    pub fn reap(&self, bank: &mut VoiceBank) -> usize {
        let voices = self
            .channels
            .iter()
            .map(|c| c.voice)
            .chain(std::iter::once(self.ground_voice));
        let mut reaped = 0;
        for voice in voices {
            let finished = bank.voice(voice).map(|v| v.state()) == Some(VoiceState::OneShot)
                && !bank.is_playing(voice);
            if finished {
                bank.mark_idle(voice);
                reaped += 1;
            }
        }
        reaped
    }

    /// Gain for an instantaneous effect at `source` heard from `listener`.
    pub fn instant_gain(&self, source: Vec3, listener: Vec3) -> f32 {
        let max = self.params.max_radius;
        proximity(source.distance_squared(listener), max * max)
    }
}
