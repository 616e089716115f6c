use anyhow::{Context, Result};
use cuemix_audio::{AudioSettings, ClipCatalog, ClipEntry, EngineConfig, SimulatedBackend};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/audio.toml";

/// One clip in the driver's manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClipSource {
    #[serde(flatten)]
    pub entry: ClipEntry,
    /// Playback length used by the simulated backend, in seconds.
    #[serde(default)]
    pub duration: Option<f32>,
    /// Encoded audio file, only read by the rodio backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub settings: AudioSettings,
    pub clips: Vec<ClipSource>,
}

impl AppConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Audio config not found at {}. Using defaults", path.display());
                }
                AppConfig::default()
            }
        }
    }

    /// Build the clip catalog from the manifest.
    pub fn catalog(&self) -> Result<ClipCatalog> {
        ClipCatalog::new(self.clips.iter().map(|c| c.entry.clone()))
            .context("Invalid clip manifest")
    }

    /// Simulated backend with every manifest duration registered.
    pub fn simulated_backend(&self) -> SimulatedBackend {
        let mut backend = SimulatedBackend::new();
        for clip in &self.clips {
            if let Some(seconds) = clip.duration {
                backend.set_duration(clip.entry.handle, seconds);
            }
        }
        backend
    }
}
