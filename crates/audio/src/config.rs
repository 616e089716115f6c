//! Engine configuration.

use crate::positional::CHANNEL_COUNT;
use crate::{CatalogError, ChannelKind, ClipCatalog, ClipHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of song note variants a binding must name.
pub const SONG_VARIANTS: usize = 3;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// `pool_size` was zero.
    #[error("voice pool size must be at least 1")]
    EmptyPool,
    /// A value that must be strictly positive was not.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive {
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f32,
    },
    /// Pitch window reaches zero or below.
    #[error("pitch window {base} ± {jitter} must stay above zero")]
    PitchWindow {
        /// Window center
        base: f32,
        /// Window half-width
        jitter: f32,
    },
    /// Song binding has the wrong number of clips.
    #[error("song needs 3 note variants, got {0}")]
    SongVariants(usize),
}

/// Any failure while bringing the engine up.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Invalid numeric configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Binding references a clip the catalog does not have.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Clip names bound to channels and dedicated voices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelBindings {
    /// Loop for [`ChannelKind::Collect`]
    pub collect: Option<String>,
    /// Loop for [`ChannelKind::Fragment`]
    pub fragment: Option<String>,
    /// One-shot for [`ChannelKind::Hazard`]
    pub hazard: Option<String>,
    /// Loop for [`ChannelKind::Wind`]
    pub wind: Option<String>,
    /// Note variants for [`ChannelKind::Song`]; empty or exactly three
    pub song: Vec<String>,
    /// Clip for ground effects
    pub ground: Option<String>,
}

impl ChannelBindings {
    fn name_for(&self, kind: ChannelKind) -> Option<&str> {
        match kind {
            ChannelKind::Collect => self.collect.as_deref(),
            ChannelKind::Fragment => self.fragment.as_deref(),
            ChannelKind::Hazard => self.hazard.as_deref(),
            ChannelKind::Wind => self.wind.as_deref(),
            ChannelKind::Song => None,
        }
    }

    /// Resolve every name against `catalog`.
    pub fn resolve(&self, catalog: &ClipCatalog) -> Result<ResolvedBindings, EngineError> {
        if !self.song.is_empty() && self.song.len() != SONG_VARIANTS {
            return Err(ConfigError::SongVariants(self.song.len()).into());
        }
        let mut channels = [None; CHANNEL_COUNT];
        for (slot, kind) in channels.iter_mut().zip(ChannelKind::ALL) {
            if let Some(name) = self.name_for(kind) {
                *slot = Some(catalog.require(name)?);
            }
        }
        let song = self
            .song
            .iter()
            .map(|name| catalog.require(name))
            .collect::<Result<Vec<_>, _>>()?;
        let ground = self
            .ground
            .as_deref()
            .map(|name| catalog.require(name))
            .transpose()?;
        Ok(ResolvedBindings {
            channels,
            song,
            ground,
        })
    }
}

/// Bindings after name lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedBindings {
    channels: [Option<ClipHandle>; CHANNEL_COUNT],
    song: Vec<ClipHandle>,
    ground: Option<ClipHandle>,
}

impl ResolvedBindings {
    /// Clip bound to a channel.
    pub fn channel(&self, kind: ChannelKind) -> Option<ClipHandle> {
        self.channels[kind.index()]
    }

    /// Song note variants.
    pub fn song(&self) -> &[ClipHandle] {
        &self.song
    }

    /// Ground effect clip.
    pub fn ground(&self) -> Option<ClipHandle> {
        self.ground
    }
}

/// Tunables for the voice pool, positional set and ramps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of one-shot voices.
    pub pool_size: usize,
    /// Distance at which positional gain reaches zero.
    pub max_radius: f32,
    /// Upper end of the metric accepted by `set_channel_multiplier`.
    pub ambient_metric_max: f32,
    /// Ramp progress per second; a ramp lasts `1 / ramp_rate` seconds.
    pub ramp_rate: f32,
    /// Gain added per suppressed repeat in louden mode.
    pub louden_step: f32,
    /// Center of the random pitch window.
    pub pitch_base: f32,
    /// Half-width of the random pitch window.
    pub pitch_jitter: f32,
    /// Multiplier for collect and fragment channels.
    pub reduced_multiplier: f32,
    /// Fixed RNG seed for reproducible pitch and note choice.
    pub rng_seed: Option<u64>,
    /// Clip names per channel.
    pub bindings: ChannelBindings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            max_radius: 150.0,
            ambient_metric_max: 30_000.0,
            ramp_rate: 2.0,
            louden_step: 0.1,
            pitch_base: 1.0,
            pitch_jitter: 0.3,
            reduced_multiplier: 0.5,
            rng_seed: None,
            bindings: ChannelBindings::default(),
        }
    }
}

impl EngineConfig {
    /// Check numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        for (field, value) in [
            ("max_radius", self.max_radius),
            ("ambient_metric_max", self.ambient_metric_max),
            ("ramp_rate", self.ramp_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.louden_step < 0.0 || !self.louden_step.is_finite() {
            return Err(ConfigError::NotPositive {
                field: "louden_step",
                value: self.louden_step,
            });
        }
        if !(0.0..=1.0).contains(&self.reduced_multiplier) {
            return Err(ConfigError::NotPositive {
                field: "reduced_multiplier",
                value: self.reduced_multiplier,
            });
        }
        let finite = self.pitch_base.is_finite() && self.pitch_jitter.is_finite();
        if !finite || self.pitch_jitter < 0.0 || self.pitch_base - self.pitch_jitter <= 0.0 {
            return Err(ConfigError::PitchWindow {
                base: self.pitch_base,
                jitter: self.pitch_jitter,
            });
        }
        if !self.bindings.song.is_empty() && self.bindings.song.len() != SONG_VARIANTS {
            return Err(ConfigError::SongVariants(self.bindings.song.len()));
        }
        Ok(())
    }
}
