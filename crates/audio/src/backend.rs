//! Output routing backends.
//!
//! The engine never decodes or mixes audio itself. It drives an
//! [`OutputBackend`] with (clip, gain, pitch, loop) and polls it for
//! "still playing".

use crate::{ClipHandle, VoiceId};
use std::collections::HashMap;
use tracing::trace;

/// Playback capability consumed by the engine.
///
/// Gains handed to a backend already include the listener's volume settings.
pub trait OutputBackend {
    /// Start `clip` on `voice`, replacing whatever the voice was playing.
    fn start(&mut self, voice: VoiceId, clip: ClipHandle, gain: f32, pitch: f32, looping: bool);

    /// Change the gain of whatever `voice` is playing.
    fn set_gain(&mut self, voice: VoiceId, gain: f32);

    /// Stop `voice` immediately.
    fn stop(&mut self, voice: VoiceId);

    /// Whether `voice` is still producing sound.
    fn is_playing(&self, voice: VoiceId) -> bool;

    /// Advance backend time. Real-time backends ignore this.
    fn advance(&mut self, _dt: f32) {}
}

/// Length used for clips without a registered duration.
pub const DEFAULT_CLIP_SECONDS: f32 = 1.0;

/// State of one simulated voice.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedChannel {
    /// Clip being played
    pub clip: ClipHandle,
    /// Output gain last applied
    pub gain: f32,
    /// Playback rate
    pub pitch: f32,
    /// Whether the clip restarts when it ends
    pub looping: bool,
    /// Seconds of clip left at `pitch` 1.0
    pub remaining: f32,
}

/// Headless backend that models playback time without producing sound.
///
/// Used by tests and by the headless driver. Pitch scales playback speed, so
/// a clip pitched at 2.0 finishes in half its length.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    durations: HashMap<ClipHandle, f32>,
    channels: HashMap<VoiceId, SimulatedChannel>,
    starts: u64,
}

impl SimulatedBackend {
    /// Backend where every clip lasts [`DEFAULT_CLIP_SECONDS`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how long `clip` plays for.
    pub fn with_duration(mut self, clip: ClipHandle, seconds: f32) -> Self {
        self.set_duration(clip, seconds);
        self
    }

    /// Register how long `clip` plays for.
    pub fn set_duration(&mut self, clip: ClipHandle, seconds: f32) {
        self.durations.insert(clip, seconds.max(0.0));
    }

    /// Current state of `voice`, if it is playing.
    pub fn channel(&self, voice: VoiceId) -> Option<&SimulatedChannel> {
        self.channels.get(&voice)
    }

    /// Total number of `start` calls seen.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    fn duration(&self, clip: ClipHandle) -> f32 {
        self.durations
            .get(&clip)
            .copied()
            .unwrap_or(DEFAULT_CLIP_SECONDS)
    }
}

impl OutputBackend for SimulatedBackend {
    fn start(&mut self, voice: VoiceId, clip: ClipHandle, gain: f32, pitch: f32, looping: bool) {
        self.starts += 1;
        let remaining = self.duration(clip);
        self.channels.insert(
            voice,
            SimulatedChannel {
                clip,
                gain,
                pitch,
                looping,
                remaining,
            },
        );
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(channel) = self.channels.get_mut(&voice) {
            channel.gain = gain;
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        self.channels.remove(&voice);
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.channels.contains_key(&voice)
    }

    fn advance(&mut self, dt: f32) {
        let durations = &self.durations;
        self.channels.retain(|voice, channel| {
            channel.remaining -= dt * channel.pitch.max(0.0);
            if channel.remaining > 0.0 {
                return true;
            }
            if channel.looping {
                let length = durations
                    .get(&channel.clip)
                    .copied()
                    .unwrap_or(DEFAULT_CLIP_SECONDS);
                if length > 0.0 {
                    channel.remaining = channel.remaining.rem_euclid(length);
                    if channel.remaining == 0.0 {
                        channel.remaining = length;
                    }
                    return true;
                }
            }
            trace!(?voice, clip = %channel.clip, "simulated voice finished");
            false
        });
    }
}

#[cfg(feature = "rodio_backend")]
pub use self::rodio_output::RodioBackend;

#[cfg(feature = "rodio_backend")]
mod rodio_output {
    use super::OutputBackend;
    use crate::{ClipHandle, VoiceId};
    use anyhow::{Context, Result};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;
    use tracing::{debug, warn};

    /// Backend that plays through the default output device with rodio.
    ///
    /// Each voice owns one [`Sink`]; starting a voice replaces its sink.
    pub struct RodioBackend {
        /// Output stream (must be kept alive)
        _stream: OutputStream,
        /// Stream handle for creating sinks
        stream_handle: OutputStreamHandle,
        /// Encoded clip bytes by handle
        clips: HashMap<ClipHandle, Arc<[u8]>>,
        /// Live sinks by voice
        sinks: HashMap<VoiceId, Sink>,
    }

    impl RodioBackend {
        /// Open the default output device.
        pub fn new() -> Result<Self> {
            let (stream, stream_handle) =
                OutputStream::try_default().context("Failed to create audio output stream")?;

            Ok(Self {
                _stream: stream,
                stream_handle,
                clips: HashMap::new(),
                sinks: HashMap::new(),
            })
        }

        /// Register encoded (wav/vorbis) bytes for a clip.
        pub fn load_clip(&mut self, clip: ClipHandle, data: Vec<u8>) {
            self.clips.insert(clip, Arc::from(data));
            debug!(%clip, "Loaded clip");
        }

        fn open_sink(&self, clip: ClipHandle, looping: bool) -> Result<Sink> {
            let data = self
                .clips
                .get(&clip)
                .with_context(|| format!("{clip} has no audio data"))?;
            let source =
                Decoder::new(Cursor::new(Arc::clone(data))).context("Failed to decode audio")?;
            let sink = Sink::try_new(&self.stream_handle).context("Failed to create audio sink")?;
            if looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
            Ok(sink)
        }
    }

    impl OutputBackend for RodioBackend {
        fn start(&mut self, voice: VoiceId, clip: ClipHandle, gain: f32, pitch: f32, looping: bool) {
            if let Some(old) = self.sinks.remove(&voice) {
                old.stop();
            }
            match self.open_sink(clip, looping) {
                Ok(sink) => {
                    sink.set_volume(gain);
                    sink.set_speed(pitch);
                    self.sinks.insert(voice, sink);
                }
                Err(e) => warn!("Failed to play {clip} on {voice:?}: {e:#}"),
            }
        }

        fn set_gain(&mut self, voice: VoiceId, gain: f32) {
            if let Some(sink) = self.sinks.get(&voice) {
                sink.set_volume(gain);
            }
        }

        fn stop(&mut self, voice: VoiceId) {
            if let Some(sink) = self.sinks.remove(&voice) {
                sink.stop();
            }
        }

        fn is_playing(&self, voice: VoiceId) -> bool {
            self.sinks
                .get(&voice)
                .map(|s| !s.empty() && !s.is_paused())
                .unwrap_or(false)
        }
    }
}
