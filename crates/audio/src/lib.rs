//! Audio cue engine for cuemix.
//!
//! Picks, pitches, deduplicates and spatially attenuates sound-effect
//! playback against a fixed set of voices, and ramps per-source volumes as
//! tracked world objects move relative to the listener.
//!
//! # Architecture
//!
//! - [`AudioManager`] - Main interface, driven once per tick
//! - [`VoicePool`] - First-fit one-shot voices with duplicate suppression
//! - [`PositionalSet`] - Looping voices whose gain follows the nearest entity
//! - [`RampScheduler`] - One cancellable gain ramp per voice
//! - [`ClipCatalog`] - Named clip handles and default gains
//! - [`OutputBackend`] - Where voices actually play
//!
//! # Example
//!
//! ```ignore
//! let mut audio = AudioManager::new(config, catalog, Box::new(SimulatedBackend::new()));
//! audio.init()?;
//! audio.play_random(shoot, PlayMode::UNIQUE);
//! audio.update_positional_voices(listener);
//! audio.tick(1.0 / 60.0);
//! ```

mod backend;
mod catalog;
mod config;
mod manager;
mod pool;
mod positional;
mod ramp;
mod settings;
mod tracker;
mod voice;

pub use backend::{OutputBackend, SimulatedBackend, SimulatedChannel, DEFAULT_CLIP_SECONDS};
#[cfg(feature = "rodio_backend")]
pub use backend::RodioBackend;
pub use catalog::{CatalogError, ClipCatalog, ClipEntry, ClipHandle};
pub use config::{ChannelBindings, ConfigError, EngineConfig, EngineError, ResolvedBindings};
pub use manager::AudioManager;
pub use pool::{PlayMode, PlayOutcome, VoicePool};
pub use positional::{
    proximity, ChannelKind, EntityRef, PositionalChannel, PositionalParams, PositionalSet,
    TrackedEntity,
};
pub use ramp::{smoothstep, RampScheduler, RampTask};
pub use settings::AudioSettings;
pub use tracker::{DuplicateTracker, PlaybackRecord};
pub use voice::{Bus, Voice, VoiceBank, VoiceId, VoiceState};
