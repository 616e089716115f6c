//! Scripted headless walk that exercises every engine surface.
//!
//! A listener walks along +X past gems and fragments, fires, steps, lands
//! from jumps, and passes a hazard and a singing shrine. Halfway through the
//! scene resets and a fresh set of entities is registered.

use cuemix_audio::{AudioManager, ChannelKind, EntityRef, PlayMode, TrackedEntity};
use glam::Vec3;
use tracing::info;

const WALK_SPEED: f32 = 6.0;
const PICKUP_RADIUS: f32 = 3.0;
const SHOOT_EVERY: f32 = 0.25;
const STEP_EVERY: f32 = 0.4;
const JUMP_EVERY: f32 = 3.0;
const HISS_EVERY: f32 = 2.0;
const NOTE_EVERY: f32 = 1.5;

/// Per-run counters reported at the end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub ticks: u64,
    pub shots: u32,
    pub steps: u32,
    pub pickups: u32,
    pub landings: u32,
    pub notes: u32,
    pub scene_resets: u32,
    pub peak_one_shots: usize,
}

struct Timer {
    every: f32,
    elapsed: f32,
}

impl Timer {
    fn new(every: f32) -> Self {
        Self {
            every,
            elapsed: 0.0,
        }
    }

    fn fire(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.every {
            self.elapsed -= self.every;
            true
        } else {
            false
        }
    }
}

pub struct Scenario {
    listener: Vec3,
    gems: Vec<EntityRef>,
    hazard: EntityRef,
    shoot: Timer,
    step: Timer,
    jump: Timer,
    hiss: Timer,
    note: Timer,
    total_ticks: u64,
    summary: Summary,
}

impl Scenario {
    pub fn new(total_ticks: u64) -> Self {
        Self {
            listener: Vec3::ZERO,
            gems: Vec::new(),
            hazard: TrackedEntity::new(Vec3::ZERO),
            shoot: Timer::new(SHOOT_EVERY),
            step: Timer::new(STEP_EVERY),
            jump: Timer::new(JUMP_EVERY),
            hiss: Timer::new(HISS_EVERY),
            note: Timer::new(NOTE_EVERY),
            total_ticks,
            summary: Summary::default(),
        }
    }

    /// Register the entities for a scene starting at the listener's position.
    fn populate(&mut self, audio: &mut AudioManager) {
        let origin = self.listener;
        self.gems = (1..=6)
            .map(|i| TrackedEntity::new(origin + Vec3::new(i as f32 * 12.0, 0.0, 2.0)))
            .collect();
        for gem in &self.gems {
            audio.init_positional_channel(ChannelKind::Collect, gem.clone());
        }
        for i in 0..3 {
            let offset = Vec3::new(20.0 + i as f32 * 30.0, 0.0, -8.0);
            let fragment = TrackedEntity::new(origin + offset);
            audio.init_positional_channel(ChannelKind::Fragment, fragment);
        }
        self.hazard = TrackedEntity::new(origin + Vec3::new(60.0, 0.0, 10.0));
        audio.init_positional_channel(ChannelKind::Hazard, self.hazard.clone());
        audio.init_positional_channel(
            ChannelKind::Song,
            TrackedEntity::new(origin + Vec3::new(90.0, 0.0, 0.0)),
        );
        audio.init_positional_channel(ChannelKind::Wind, TrackedEntity::new(origin));
    }

    pub fn run(mut self, audio: &mut AudioManager, dt: f32) -> Summary {
        self.populate(audio);
        let ticks_per_second = (1.0 / dt).round().max(1.0) as u64;
        let reset_at = self.total_ticks / 2;

        for tick in 0..self.total_ticks {
            if tick == reset_at && tick > 0 {
                audio.clear_positional_voices();
                self.summary.scene_resets += 1;
                self.populate(audio);
                info!(tick, "Scene reset");
            }

            self.listener.x += WALK_SPEED * dt;
            self.step_world(audio, dt);

            audio.update_positional_voices(self.listener);
            audio.tick(dt);

            self.summary.ticks += 1;
            self.summary.peak_one_shots =
                self.summary.peak_one_shots.max(audio.active_one_shots());

            if tick % ticks_per_second == 0 {
                info!(
                    second = tick / ticks_per_second,
                    x = self.listener.x,
                    one_shots = audio.active_one_shots(),
                    collect = audio.channel_gain(ChannelKind::Collect),
                    fragment = audio.channel_gain(ChannelKind::Fragment),
                    hazard = audio.channel_gain(ChannelKind::Hazard),
                    wind = audio.channel_gain(ChannelKind::Wind),
                    song = audio.channel_gain(ChannelKind::Song),
                    "audio"
                );
            }
        }
        self.summary
    }

    fn step_world(&mut self, audio: &mut AudioManager, dt: f32) {
        if self.shoot.fire(dt) {
            audio.play_named("shoot", 1.0, PlayMode::UNIQUE);
            self.summary.shots += 1;
        }
        if self.step.fire(dt) {
            if let Some(step) = audio.catalog().handle("step") {
                audio.play_random(step, PlayMode::OVERLAP);
            }
            self.summary.steps += 1;
        }
        if self.jump.fire(dt) {
            let landing = self.listener + Vec3::new(0.0, -1.0, 0.0);
            audio.play_ground_effect(landing, self.listener);
            self.summary.landings += 1;
        }
        if self.hiss.fire(dt) && !self.hazard.is_destroyed() {
            audio.play_channel_one_shot(ChannelKind::Hazard);
        }
        if self.note.fire(dt) {
            audio.play_note();
            self.summary.notes += 1;
        }

        for gem in &self.gems {
            let in_reach =
                gem.position().distance_squared(self.listener) < PICKUP_RADIUS * PICKUP_RADIUS;
            if in_reach && !gem.is_destroyed() {
                gem.destroy();
                audio.play_named("collect", 1.0, PlayMode::LOUDEN);
                self.summary.pickups += 1;
            }
        }

        // Wind fades as the listener leaves the start of the level.
        audio.set_channel_multiplier(ChannelKind::Wind, self.listener.x * 50.0);

        if self.listener.x > self.hazard.position().x + 20.0 {
            self.hazard.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_on_period() {
        let mut timer = Timer::new(0.5);
        let fired = (0..60).filter(|_| timer.fire(0.125)).count();
        assert_eq!(fired, 15);
    }

    #[test]
    fn test_scripted_run_touches_every_surface() {
        let mut audio = AudioManager::stub();
        audio.init().expect("init");
        let summary = Scenario::new(1200).run(&mut audio, 1.0 / 60.0);

        assert_eq!(summary.ticks, 1200);
        assert_eq!(summary.scene_resets, 1);
        assert!(summary.shots > 0 && summary.notes > 0 && summary.landings > 0);
        assert!(summary.peak_one_shots <= audio.config().pool_size);
    }
}
