//! Listener-facing volume controls applied at the output boundary.

use crate::voice::Bus;
use serde::{Deserialize, Serialize};

/// Volume settings. Voice gains computed by the engine are scaled by these
/// only when handed to the output backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 to 1.0)
    pub master: f32,
    /// One-shot effect volume (0.0 to 1.0)
    pub sfx: f32,
    /// Positional/ambient volume (0.0 to 1.0)
    pub ambient: f32,
    /// Whether audio is muted
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master: 1.0,
            sfx: 1.0,
            ambient: 1.0,
            muted: false,
        }
    }
}

impl AudioSettings {
    /// Effective volume for voices routed through `bus`.
    pub fn effective_volume(&self, bus: Bus) -> f32 {
        match bus {
            Bus::Sfx => self.effective_sfx_volume(),
            Bus::Ambient => self.effective_ambient_volume(),
        }
    }

    /// Get the effective SFX volume (master * sfx).
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master * self.sfx
        }
    }

    /// Get the effective ambient volume (master * ambient).
    pub fn effective_ambient_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master * self.ambient
        }
    }

    /// Toggle mute state.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Set master volume (clamped to 0.0-1.0).
    pub fn set_master(&mut self, volume: f32) {
        self.master = volume.clamp(0.0, 1.0);
    }

    /// Set SFX volume (clamped to 0.0-1.0).
    pub fn set_sfx(&mut self, volume: f32) {
        self.sfx = volume.clamp(0.0, 1.0);
    }

    /// Set ambient volume (clamped to 0.0-1.0).
    pub fn set_ambient(&mut self, volume: f32) {
        self.ambient = volume.clamp(0.0, 1.0);
    }
}
