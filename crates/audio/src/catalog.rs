//! Clip handles and the read-only clip catalog.
//!
//! Clips are owned by whatever loaded them; the engine only ever sees a
//! [`ClipHandle`] plus an optional default gain override.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Opaque identifier for a loaded sound asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipHandle(pub u32);

impl fmt::Display for ClipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// One authored catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipEntry {
    /// Symbolic name used by gameplay code and channel bindings.
    pub name: String,
    /// Handle issued by the asset loader.
    pub handle: ClipHandle,
    /// Default gain override. `0.0` means "use 1.0".
    #[serde(default)]
    pub gain: f32,
}

impl ClipEntry {
    /// Entry without a gain override.
    pub fn new(name: impl Into<String>, handle: ClipHandle) -> Self {
        Self {
            name: name.into(),
            handle,
            gain: 0.0,
        }
    }

    /// Set the default gain override.
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }
}

/// Errors raised while building a catalog or resolving names against it.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two entries share a name.
    #[error("duplicate clip name `{0}`")]
    DuplicateName(String),
    /// Gain override outside `[0, 1]` or not finite.
    #[error("clip `{name}` has invalid gain {gain}")]
    InvalidGain {
        /// Offending entry.
        name: String,
        /// Offending gain.
        gain: f32,
    },
    /// A binding references a clip that is not in the catalog.
    #[error("unknown clip `{0}`")]
    UnknownClip(String),
}

/// Immutable name -> handle and handle -> gain mapping built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ClipCatalog {
    by_name: HashMap<String, ClipHandle>,
    gains: HashMap<ClipHandle, f32>,
}

impl ClipCatalog {
    /// Build a catalog from entries, rejecting duplicate names and bad gains.
    pub fn new(entries: impl IntoIterator<Item = ClipEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for entry in entries {
            if !entry.gain.is_finite() || !(0.0..=1.0).contains(&entry.gain) {
                return Err(CatalogError::InvalidGain {
                    name: entry.name,
                    gain: entry.gain,
                });
            }
            if catalog.by_name.contains_key(&entry.name) {
                return Err(CatalogError::DuplicateName(entry.name));
            }
            if entry.gain > 0.0 {
                catalog.gains.insert(entry.handle, entry.gain);
            }
            catalog.by_name.insert(entry.name, entry.handle);
        }
        Ok(catalog)
    }

    /// Catalog with no clips; every handle plays at full gain.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a clip by name.
    pub fn handle(&self, name: &str) -> Option<ClipHandle> {
        self.by_name.get(name).copied()
    }

    /// Look up a clip by name, failing with [`CatalogError::UnknownClip`].
    pub fn require(&self, name: &str) -> Result<ClipHandle, CatalogError> {
        self.handle(name)
            .ok_or_else(|| CatalogError::UnknownClip(name.to_string()))
    }

    /// Default gain for a clip, falling back to 1.0 when unset or zero.
    pub fn default_gain(&self, clip: ClipHandle) -> f32 {
        match self.gains.get(&clip) {
            Some(&gain) if gain > 0.0 => gain,
            _ => 1.0,
        }
    }

    /// Number of named clips.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the catalog has no clips.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
