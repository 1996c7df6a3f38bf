//! Sound cues for simulation events
//!
//! The simulation only raises [`GameEvent`]s; this module turns them into
//! named cues and hands them to whatever [`SoundSink`] is plugged in.

use crate::sim::GameEvent;

/// Collision cues are quiet: intensity is scaled by this gain
pub const COLLIDE_GAIN: f32 = 0.05;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Two balls touched
    BallsCollide,
    /// A ball dropped into a pocket
    BallPocketed,
}

/// Playback backend
pub trait SoundSink {
    fn play(&mut self, cue: SoundCue, volume: f32);
}

/// Sink that logs every cue (headless runs)
#[derive(Debug, Default)]
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, cue: SoundCue, volume: f32) {
        log::trace!("sound {:?} at {:.3}", cue, volume);
    }
}

/// Audio manager for the match
pub struct AudioManager<S> {
    sink: S,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<S: Default> Default for AudioManager<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> AudioManager<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

impl<S: SoundSink> AudioManager<S> {
    /// Play a cue at `intensity` (0.0 - 1.0) scaled by the current volume
    pub fn play(&mut self, cue: SoundCue, intensity: f32) {
        let vol = self.effective_volume() * intensity.clamp(0.0, 1.0);
        if vol <= 0.0 {
            return;
        }
        self.sink.play(cue, vol);
    }

    /// Play the cues for a batch of drained events
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::BallsCollided { intensity } => {
                    self.play(SoundCue::BallsCollide, intensity * COLLIDE_GAIN)
                }
                GameEvent::BallPocketed { .. } => self.play(SoundCue::BallPocketed, 1.0),
                _ => {}
            }
        }
    }
}
