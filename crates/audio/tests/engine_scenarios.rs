//! End-to-end scenarios for the audio manager on the simulated backend.

use cuemix_audio::{
    AudioManager, ChannelBindings, ChannelKind, ClipCatalog, ClipEntry, ClipHandle, EngineConfig,
    PlayMode, PlayOutcome, SimulatedBackend, TrackedEntity, VoiceState,
};
use glam::Vec3;
use std::sync::Arc;

const TICK: f32 = 1.0 / 60.0;

const SHOOT: ClipHandle = ClipHandle(1);
const STEP: ClipHandle = ClipHandle(2);
const COLLECT: ClipHandle = ClipHandle(3);
const HUM: ClipHandle = ClipHandle(4);
const WIND: ClipHandle = ClipHandle(5);
const HISS: ClipHandle = ClipHandle(6);
const THUD: ClipHandle = ClipHandle(7);
const NOTES: [ClipHandle; 3] = [ClipHandle(8), ClipHandle(9), ClipHandle(10)];

fn catalog() -> ClipCatalog {
    ClipCatalog::new([
        ClipEntry::new("shoot", SHOOT).with_gain(0.5),
        ClipEntry::new("step", STEP),
        ClipEntry::new("collect", COLLECT).with_gain(0.95),
        ClipEntry::new("hum", HUM),
        ClipEntry::new("wind", WIND),
        ClipEntry::new("hiss", HISS),
        ClipEntry::new("thud", THUD),
        ClipEntry::new("note_a", NOTES[0]),
        ClipEntry::new("note_b", NOTES[1]),
        ClipEntry::new("note_c", NOTES[2]),
    ])
    .expect("catalog")
}

fn config(pool_size: usize) -> EngineConfig {
    EngineConfig {
        pool_size,
        rng_seed: Some(42),
        bindings: ChannelBindings {
            collect: Some("hum".into()),
            fragment: Some("hum".into()),
            hazard: Some("hiss".into()),
            wind: Some("wind".into()),
            song: vec!["note_a".into(), "note_b".into(), "note_c".into()],
            ground: Some("thud".into()),
        },
        ..Default::default()
    }
}

fn manager(pool_size: usize) -> AudioManager {
    let backend = SimulatedBackend::new()
        .with_duration(SHOOT, 0.5)
        .with_duration(STEP, 0.25)
        .with_duration(COLLECT, 2.0);
    let mut manager = AudioManager::new(config(pool_size), Arc::new(catalog()), Box::new(backend));
    manager.init().expect("init");
    manager
}

fn run(manager: &mut AudioManager, seconds: f32) {
    let ticks = (seconds / TICK).ceil() as usize;
    for _ in 0..ticks {
        manager.tick(TICK);
    }
}

fn settle(manager: &mut AudioManager, listener: Vec3) {
    for _ in 0..120 {
        manager.update_positional_voices(listener);
        manager.tick(TICK);
    }
}

#[test]
fn third_clip_is_dropped_when_two_voices_are_busy() {
    let mut audio = manager(2);

    assert!(matches!(
        audio.try_play(SHOOT, 1.0, PlayMode::OVERLAP),
        Some(PlayOutcome::Started(_))
    ));
    assert!(matches!(
        audio.try_play(STEP, 1.0, PlayMode::OVERLAP),
        Some(PlayOutcome::Started(_))
    ));
    assert_eq!(
        audio.try_play(COLLECT, 1.0, PlayMode::OVERLAP),
        Some(PlayOutcome::Dropped)
    );
    // Silent drop through the public trigger too.
    audio.play_random(COLLECT, PlayMode::OVERLAP);
    assert_eq!(audio.active_one_shots(), 2);
}

#[test]
fn burst_never_exceeds_pool_size() {
    let mut audio = manager(4);
    for i in 0..50 {
        audio.play_pitched(ClipHandle(100 + i), 1.0, PlayMode::OVERLAP);
        assert!(audio.active_one_shots() <= 4);
    }
    assert_eq!(audio.active_one_shots(), 4);
}

#[test]
fn unique_repeat_changes_nothing() {
    let mut audio = manager(4);
    audio.play_pitched(SHOOT, 1.0, PlayMode::UNIQUE);
    let record = audio.playback_record(SHOOT).expect("record");

    audio.play_pitched(SHOOT, 1.0, PlayMode::UNIQUE);

    assert_eq!(audio.active_one_shots(), 1);
    assert_eq!(audio.voice_gain(record.voice), 0.5);
    assert_eq!(audio.playback_record(SHOOT), Some(record));
}

#[test]
fn louden_repeat_raises_gain_and_counts() {
    let mut audio = manager(4);
    audio.play_pitched(COLLECT, 1.0, PlayMode::LOUDEN);
    let voice = audio.playback_record(COLLECT).expect("record").voice;

    let mut last = audio.voice_gain(voice);
    audio.play_pitched(COLLECT, 1.0, PlayMode::LOUDEN);
    assert!(audio.voice_gain(voice) > last);
    last = audio.voice_gain(voice);

    audio.play_pitched(COLLECT, 1.0, PlayMode::LOUDEN);
    assert!(audio.voice_gain(voice) >= last);
    assert_eq!(audio.voice_gain(voice), 1.0);
    assert_eq!(audio.playback_record(COLLECT).expect("record").replays, 2);
    assert_eq!(audio.active_one_shots(), 1);
}

#[test]
fn record_is_released_once_playback_ends() {
    let mut audio = manager(4);
    audio.play_pitched(SHOOT, 1.0, PlayMode::UNIQUE);
    let first = audio.playback_record(SHOOT).expect("record").voice;

    run(&mut audio, 0.6);
    assert!(audio.playback_record(SHOOT).is_none());
    assert_eq!(
        audio.voice(first).map(|v| v.state()),
        Some(VoiceState::Idle)
    );

    assert!(matches!(
        audio.try_play(SHOOT, 1.0, PlayMode::UNIQUE),
        Some(PlayOutcome::Started(_))
    ));
    assert!(audio.playback_record(SHOOT).is_some());
}

#[test]
fn reduced_channel_reaches_half_gain_then_silence() {
    let mut audio = manager(4);
    let gem = TrackedEntity::new(Vec3::new(10.0, 0.0, -4.0));
    audio.init_positional_channel(ChannelKind::Collect, gem.clone());

    settle(&mut audio, gem.position());
    assert_eq!(audio.channel_multiplier(ChannelKind::Collect), 0.5);
    assert!((audio.channel_gain(ChannelKind::Collect) - 0.5).abs() < 1e-4);

    gem.destroy();
    settle(&mut audio, gem.position());
    assert!(audio.channel_gain(ChannelKind::Collect).abs() < 1e-4);
}

#[test]
fn gain_falls_off_with_distance() {
    let mut audio = manager(4);
    let hazard = TrackedEntity::new(Vec3::ZERO);
    audio.init_positional_channel(ChannelKind::Hazard, hazard.clone());

    let mut previous = f32::INFINITY;
    for distance in [0.0, 30.0, 75.0, 120.0, 150.0, 400.0] {
        hazard.set_position(Vec3::new(distance, 0.0, 0.0));
        settle(&mut audio, Vec3::ZERO);
        let gain = audio.channel_gain(ChannelKind::Hazard);
        assert!(gain <= previous + 1e-4, "{distance}: {gain} > {previous}");
        previous = gain;
    }
    assert!(previous.abs() < 1e-4);
}

#[test]
fn nearest_live_entity_wins() {
    let mut audio = manager(4);
    let near = TrackedEntity::new(Vec3::new(0.0, 0.0, 15.0));
    let far = TrackedEntity::new(Vec3::new(0.0, 0.0, 120.0));
    audio.init_positional_channel(ChannelKind::Hazard, far);
    audio.init_positional_channel(ChannelKind::Hazard, near.clone());

    settle(&mut audio, Vec3::ZERO);
    let with_near = audio.channel_gain(ChannelKind::Hazard);
    assert!((with_near - (1.0 - 225.0 / 22_500.0)).abs() < 1e-3);

    near.destroy();
    settle(&mut audio, Vec3::ZERO);
    assert!(audio.channel_gain(ChannelKind::Hazard) < with_near);
    assert!(audio.channel_gain(ChannelKind::Hazard) > 0.0);
}

#[test]
fn clear_zeroes_immediately_and_stays_silent() {
    let mut audio = manager(4);
    for kind in [ChannelKind::Collect, ChannelKind::Wind, ChannelKind::Hazard] {
        audio.init_positional_channel(kind, TrackedEntity::new(Vec3::ONE));
    }
    settle(&mut audio, Vec3::ONE);
    assert!(audio.channel_gain(ChannelKind::Wind) > 0.9);

    audio.clear_positional_voices();
    for kind in ChannelKind::ALL {
        assert_eq!(audio.channel_gain(kind), 0.0);
        assert_eq!(audio.tracked_entities(kind), 0);
    }

    settle(&mut audio, Vec3::ONE);
    for kind in ChannelKind::ALL {
        assert_eq!(audio.channel_gain(kind), 0.0);
    }
    // Loops keep running silently for the next scene.
    let wind = audio.channel_voice(ChannelKind::Wind).expect("wind voice");
    assert!(audio.is_voice_playing(wind));
}

#[test]
fn wind_multiplier_follows_metric() {
    let mut audio = manager(4);
    audio.init_positional_channel(ChannelKind::Wind, TrackedEntity::new(Vec3::ZERO));

    audio.set_channel_multiplier(ChannelKind::Wind, 7_500.0);
    settle(&mut audio, Vec3::ZERO);
    assert!((audio.channel_gain(ChannelKind::Wind) - 0.75).abs() < 1e-4);

    audio.set_channel_multiplier(ChannelKind::Wind, 45_000.0);
    settle(&mut audio, Vec3::ZERO);
    assert!(audio.channel_gain(ChannelKind::Wind).abs() < 1e-4);
}

#[test]
fn notes_play_on_song_voice_outside_the_pool() {
    let mut audio = manager(2);
    let song = audio.channel_voice(ChannelKind::Song).expect("song voice");
    assert!(!audio.pool_voices().contains(&song));

    for _ in 0..20 {
        audio.play_note();
        let clip = audio.voice(song).and_then(|v| v.clip()).expect("note clip");
        assert!(NOTES.contains(&clip));
        let pitch = audio.voice(song).expect("voice").pitch();
        assert!((0.7..=1.3).contains(&pitch));
    }
    assert_eq!(audio.active_one_shots(), 0);
    assert!(audio.is_voice_playing(song));
}

#[test]
fn hazard_one_shot_uses_channel_voice() {
    let mut audio = manager(2);
    let hazard = audio.channel_voice(ChannelKind::Hazard).expect("hazard voice");

    audio.play_channel_one_shot(ChannelKind::Hazard);
    assert!(audio.is_voice_playing(hazard));
    assert_eq!(audio.voice(hazard).and_then(|v| v.clip()), Some(HISS));
    assert_eq!(audio.voice(hazard).map(|v| v.state()), Some(VoiceState::OneShot));

    // The hiss ends after its default one second and the voice goes idle.
    run(&mut audio, 2.0);
    assert!(!audio.is_voice_playing(hazard));
    assert_eq!(audio.voice(hazard).map(|v| v.state()), Some(VoiceState::Idle));

    // Looping channels ignore one-shot requests.
    let collect = audio.channel_voice(ChannelKind::Collect).expect("collect voice");
    audio.play_channel_one_shot(ChannelKind::Collect);
    assert_eq!(audio.voice(collect).map(|v| v.state()), Some(VoiceState::Looping));
}

#[test]
fn ground_effect_ramps_to_distance_gain() {
    let mut audio = manager(2);
    let ground = audio.ground_voice().expect("ground voice");

    audio.play_ground_effect(Vec3::new(75.0, 0.0, 0.0), Vec3::ZERO);
    assert!(audio.is_voice_playing(ground));
    assert_eq!(audio.voice(ground).and_then(|v| v.clip()), Some(THUD));

    run(&mut audio, 1.0);
    assert!((audio.voice_gain(ground) - 0.75).abs() < 1e-4);
    run(&mut audio, 1.0);
    assert_eq!(audio.voice(ground).map(|v| v.state()), Some(VoiceState::Idle));

    // Out of range: ramps back down to silence.
    audio.play_ground_effect(Vec3::new(500.0, 0.0, 0.0), Vec3::ZERO);
    run(&mut audio, 1.0);
    assert_eq!(audio.voice_gain(ground), 0.0);
}

#[test]
fn superseding_ramp_ends_at_latest_target() {
    let mut audio = manager(2);
    let hazard = TrackedEntity::new(Vec3::ZERO);
    audio.init_positional_channel(ChannelKind::Hazard, hazard.clone());

    audio.update_positional_voices(Vec3::ZERO);
    run(&mut audio, 0.1);
    let partial = audio.channel_gain(ChannelKind::Hazard);
    assert!(partial > 0.0 && partial < 1.0);

    hazard.destroy();
    audio.update_positional_voices(Vec3::ZERO);
    run(&mut audio, 1.0);

    assert_eq!(audio.channel_gain(ChannelKind::Hazard), 0.0);
    assert_eq!(audio.active_ramps(), 0);
}
