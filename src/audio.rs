//! Ambient sound side channel. Playback is best effort: backend failures are
//! logged and never reach the scene.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("no track loaded")]
    NotLoaded,
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Media playback resource driven by [`AmbientAudio`].
pub trait AudioBackend {
    fn load(&mut self, src: &str) -> Result<(), AudioError>;
    fn play(&mut self, looping: bool, volume: f32) -> Result<(), AudioError>;
    /// Pause and rewind.
    fn stop(&mut self) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
}

/// Backend for hosts without an audio device.
#[derive(Debug, Default)]
pub struct SilentBackend {
    loaded: Option<String>,
}

impl AudioBackend for SilentBackend {
    fn load(&mut self, src: &str) -> Result<(), AudioError> {
        self.loaded = Some(src.to_string());
        Ok(())
    }

    fn play(&mut self, looping: bool, volume: f32) -> Result<(), AudioError> {
        let src = self.loaded.as_deref().ok_or(AudioError::NotLoaded)?;
        log::debug!("(silent) playing {src} loop={looping} volume={volume:.2}");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Single owned ambient track, created once and reused across selections.
pub struct AmbientAudio<B: AudioBackend> {
    backend: B,
    current: Option<String>,
    volume: f32,
    playing: bool,
}

impl<B: AudioBackend> AmbientAudio<B> {
    pub fn new(backend: B, volume_percent: u8) -> Self {
        Self {
            backend,
            current: None,
            volume: percent_to_gain(volume_percent),
            playing: false,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Switches to `src` and starts looping playback.
    pub fn start(&mut self, src: &str) {
        if self.playing && self.current.as_deref() == Some(src) {
            return;
        }
        if self.playing {
            self.stop();
        }
        self.current = Some(src.to_string());
        let volume = self.volume;
        let result = self
            .backend
            .load(src)
            .and_then(|()| self.backend.play(true, volume));
        match result {
            Ok(()) => self.playing = true,
            Err(err) => {
                log::warn!("ambient playback of {src} failed: {err}");
                self.playing = false;
            }
        }
    }

    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        if let Err(err) = self.backend.stop() {
            log::warn!("stopping ambient playback failed: {err}");
        }
        self.playing = false;
    }

    pub fn set_volume_percent(&mut self, percent: u8) {
        self.set_gain(percent_to_gain(percent));
    }

    /// Linear gain, clamped to `0.0..=1.0`. Non-finite values are ignored.
    pub fn set_gain(&mut self, gain: f32) {
        if !gain.is_finite() {
            log::warn!("ignoring ambient gain {gain}");
            return;
        }
        self.volume = gain.clamp(0.0, 1.0);
        if let Err(err) = self.backend.set_volume(self.volume) {
            log::warn!("setting ambient volume failed: {err}");
        }
    }
}

fn percent_to_gain(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedBackend {
        fail_play: bool,
        calls: Vec<String>,
    }

    impl AudioBackend for ScriptedBackend {
        fn load(&mut self, src: &str) -> Result<(), AudioError> {
            self.calls.push(format!("load {src}"));
            Ok(())
        }

        fn play(&mut self, looping: bool, volume: f32) -> Result<(), AudioError> {
            self.calls.push(format!("play {looping} {volume:.2}"));
            if self.fail_play {
                return Err(AudioError::Backend("autoplay blocked".to_string()));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AudioError> {
            self.calls.push("stop".to_string());
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
            self.calls.push(format!("volume {volume:.2}"));
            Ok(())
        }
    }

    #[test]
    fn switching_tracks_stops_previous() {
        let mut audio = AmbientAudio::new(ScriptedBackend::default(), 50);
        audio.start("wind.mp3");
        audio.start("wind.mp3");
        audio.start("music.mp3");
        assert_eq!(
            audio.backend().calls,
            vec![
                "load wind.mp3",
                "play true 0.50",
                "stop",
                "load music.mp3",
                "play true 0.50",
            ]
        );
        assert_eq!(audio.current(), Some("music.mp3"));
        assert!(audio.is_playing());
    }

    #[test]
    fn blocked_playback_is_swallowed() {
        let backend = ScriptedBackend {
            fail_play: true,
            ..ScriptedBackend::default()
        };
        let mut audio = AmbientAudio::new(backend, 50);
        audio.start("wind.mp3");
        assert!(!audio.is_playing());
        audio.stop();
        assert!(!audio.backend().calls.contains(&"stop".to_string()));
    }

    #[test]
    fn volume_is_clamped_to_unit_range() {
        let mut audio = AmbientAudio::new(ScriptedBackend::default(), 250);
        assert_eq!(audio.volume(), 1.0);
        audio.set_volume_percent(30);
        assert!((audio.volume() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn gain_is_clamped_and_forwarded() {
        let mut audio = AmbientAudio::new(ScriptedBackend::default(), 50);
        audio.set_gain(1.5);
        audio.set_gain(f32::NAN);
        assert_eq!(audio.volume(), 1.0);
        assert_eq!(audio.backend().calls, vec!["volume 1.00"]);
    }

    #[test]
    fn silent_backend_needs_a_track() {
        let mut backend = SilentBackend::default();
        assert_eq!(backend.play(true, 1.0), Err(AudioError::NotLoaded));
        backend.load("wind.mp3").unwrap();
        assert!(backend.play(true, 1.0).is_ok());
    }
}
