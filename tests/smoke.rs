//! Drives the engine from the shipped TOML configuration end to end.

use cuemix_audio::{
    AudioManager, AudioSettings, ChannelKind, ClipCatalog, ClipEntry, EngineConfig, PlayMode,
    SimulatedBackend, TrackedEntity,
};
use glam::Vec3;
use serde::Deserialize;
use std::{fs, path::Path, sync::Arc};

#[derive(Deserialize)]
struct Shipped {
    engine: EngineConfig,
    settings: AudioSettings,
    clips: Vec<ShippedClip>,
}

#[derive(Deserialize)]
struct ShippedClip {
    #[serde(flatten)]
    entry: ClipEntry,
    duration: Option<f32>,
}

fn shipped_manager() -> AudioManager {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/audio.toml");
    let contents = fs::read_to_string(path).expect("shipped config exists");
    let shipped: Shipped = toml::from_str(&contents).expect("shipped config parses");

    let mut backend = SimulatedBackend::new();
    for clip in &shipped.clips {
        if let Some(seconds) = clip.duration {
            backend.set_duration(clip.entry.handle, seconds);
        }
    }
    let catalog = ClipCatalog::new(shipped.clips.into_iter().map(|c| c.entry)).expect("catalog");
    let mut audio = AudioManager::new(shipped.engine, Arc::new(catalog), Box::new(backend));
    audio.update_settings(shipped.settings);
    audio.init().expect("engine initializes");
    audio
}

#[test]
fn shipped_config_plays_and_settles() {
    let mut audio = shipped_manager();
    let pool_size = audio.config().pool_size;

    for _ in 0..(pool_size * 2) {
        audio.play_named("step", 1.0, PlayMode::OVERLAP);
    }
    assert_eq!(audio.active_one_shots(), pool_size);

    audio.init_positional_channel(ChannelKind::Hazard, TrackedEntity::new(Vec3::ZERO));
    for _ in 0..120 {
        audio.update_positional_voices(Vec3::ZERO);
        audio.tick(1.0 / 60.0);
    }

    // Every step clip is shorter than two seconds.
    assert_eq!(audio.active_one_shots(), 0);
    assert_eq!(audio.channel_gain(ChannelKind::Hazard), 1.0);
}

#[test]
fn unknown_names_are_ignored() {
    let mut audio = shipped_manager();
    audio.play_named("no_such_clip", 1.0, PlayMode::UNIQUE);
    assert_eq!(audio.active_one_shots(), 0);
}
