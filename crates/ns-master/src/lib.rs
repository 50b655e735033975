//! Control surface for nitrosynth.
//!
//! [`EngineHandle`] owns a sound archive and the song selected from it,
//! and either plays that song on the default audio device or renders it
//! offline. The CLI and any future front end share this API.

mod error;
mod playback;
mod render;
mod wav;

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

use ns_engine::{Controller, TRACK_COUNT};
use ns_ir::SharedBytes;

use playback::{Command, MixerState, PlaybackHandle, Program};

// Re-export common types so callers don't need the lower crates directly.
pub use error::MasterError;
pub use ns_engine::{EngineConfig, Frame, MixMode, SequenceStatus, Telemetry, Tuning};
pub use ns_formats::{find_sound_archives, FormatError, SoundArchive};
pub use ns_ir::{SongData, SongId};
pub use render::{
    LengthEstimate, RenderOptions, StopReason, DEFAULT_LOOPS, FINISH_FADE_SECONDS, LOOP_FADE_SECONDS,
    MAX_RENDER_SECONDS,
};
pub use wav::{frames_to_wav, write_wav};

/// Owns an archive and a selected song, and manages playback.
pub struct EngineHandle {
    config: EngineConfig,
    archive: Option<SoundArchive>,
    selected: Option<SongId>,
    song: Option<SongData>,
    mixer: MixerState,
    paused: bool,
    playback: Option<PlaybackHandle>,
    telemetry: Telemetry,
}

/// A fresh seed for runs where none was set.
fn random_seed() -> u32 {
    RandomState::new().build_hasher().finish() as u32
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            archive: None,
            selected: None,
            song: None,
            mixer: MixerState::default(),
            paused: false,
            playback: None,
            telemetry: Telemetry::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Archive and song management ---

    /// Load a sound archive, or the first one found inside a ROM image.
    pub fn load_archive(&mut self, data: impl Into<SharedBytes>) -> Result<&SoundArchive, MasterError> {
        self.stop();
        let data: SharedBytes = data.into();
        let archive = match SoundArchive::try_parse(data.clone()) {
            Ok(archive) => archive,
            Err(e) => {
                log::debug!("not a bare SDAT ({}), scanning for embedded archives", e);
                find_sound_archives(&data).into_iter().next().ok_or(MasterError::NoSoundArchive)?
            }
        };
        log::info!(
            "archive: {} sequences, {} sequence archives, {} streams",
            archive.sequence_ids().count(),
            archive.archive_ids().count(),
            archive.stream_ids().count()
        );
        self.selected = None;
        self.song = None;
        Ok(&*self.archive.insert(archive))
    }

    pub fn archive(&self) -> Option<&SoundArchive> {
        self.archive.as_ref()
    }

    /// Resolve `id` and make it the current song.
    ///
    /// With carry-over enabled, wave-archive slots the new song leaves
    /// empty are inherited from the previous one.
    pub fn select(&mut self, id: SongId) -> Result<(), MasterError> {
        let archive = self.archive.as_ref().ok_or(MasterError::NoArchive)?;
        let mut song = archive.load_song(id)?;
        if self.config.carry_over_wave_archives {
            if let Some(previous) = &self.song {
                song.carry_over_wave_archives(previous);
            }
        }
        log::info!("selected {:?}", id);
        self.selected = Some(id);
        self.song = Some(song);
        Ok(())
    }

    pub fn selected(&self) -> Option<SongId> {
        self.selected
    }

    /// Controller ready to play the current song from the start.
    fn controller(&self) -> Result<Controller, MasterError> {
        let song = self.song.clone().ok_or(MasterError::NoSongLoaded)?;
        let mut config = self.config;
        config.rng_seed = Some(config.rng_seed.unwrap_or_else(random_seed));
        let mut controller = Controller::new(config);
        self.mixer.apply(&mut controller);
        controller.load(song);
        Ok(controller)
    }

    // --- Real-time playback ---

    /// Play the current song on the default audio device.
    pub fn play(&mut self) -> Result<(), MasterError> {
        let song = self.song.clone().ok_or(MasterError::NoSongLoaded)?;
        self.stop();
        let mut config = self.config;
        config.rng_seed = Some(config.rng_seed.unwrap_or_else(random_seed));
        log::debug!("playing with seed {:?}", config.rng_seed);
        self.telemetry = Telemetry::default();
        self.playback = Some(PlaybackHandle::spawn(
            Program::Song { config, song: Box::new(song), mixer: self.mixer },
            self.paused,
        ));
        Ok(())
    }

    /// Play STRM `id` from the loaded archive.
    pub fn play_stream(&mut self, id: u16) -> Result<(), MasterError> {
        let archive = self.archive.as_ref().ok_or(MasterError::NoArchive)?;
        let stream = archive.decode_stream(id)?;
        log::info!(
            "stream {}: {} frames at {} Hz, {} channel(s)",
            id,
            stream.len(),
            stream.sample_rate,
            stream.channels
        );
        self.stop();
        self.playback = Some(PlaybackHandle::spawn(Program::Stream(stream), self.paused));
        Ok(())
    }

    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    pub fn resume(&mut self) {
        self.set_paused(false);
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.send(Command::Pause(paused));
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| !p.is_finished())
    }

    fn send(&mut self, command: Command) {
        if let Some(playback) = self.playback.as_mut() {
            playback.send(command);
        }
    }

    // --- Settings ---

    /// Seed for the sequence RNG; `None` picks a fresh one per run.
    pub fn set_seed(&mut self, seed: Option<u32>) {
        self.config.rng_seed = seed;
    }

    pub fn set_track_enabled(&mut self, track: usize, enabled: bool) {
        if track < TRACK_COUNT {
            self.mixer.track_enabled[track] = enabled;
            self.send(Command::TrackEnabled(track, enabled));
        }
    }

    pub fn set_track_gain(&mut self, track: usize, gain: f32) {
        if track < TRACK_COUNT {
            self.mixer.track_gain[track] = gain;
            self.send(Command::TrackGain(track, gain));
        }
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.mixer.master_gain = gain;
        self.send(Command::MasterGain(gain));
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.config.tuning = tuning;
        self.send(Command::Tuning(tuning));
    }

    /// Latest snapshot from the playing song.
    pub fn telemetry(&mut self) -> Telemetry {
        if let Some(snapshot) = self.playback.as_mut().and_then(|p| p.latest_telemetry()) {
            self.telemetry = snapshot;
        }
        self.telemetry
    }

    // --- Offline rendering ---

    /// Render the current song at the configured rate, with fade-out.
    pub fn render_frames(&self, options: &RenderOptions) -> Result<Vec<Frame>, MasterError> {
        let mut controller = self.controller()?;
        Ok(render::render(&mut controller, options)?)
    }

    /// Render the current song to a 16-bit stereo WAV file image.
    pub fn render_to_wav(&self, options: &RenderOptions) -> Result<Vec<u8>, MasterError> {
        let frames = self.render_frames(options)?;
        Ok(wav::frames_to_wav(&frames, self.config.sample_rate))
    }

    /// Play the current song headlessly to find where it ends.
    pub fn estimate_length(&self, options: &RenderOptions) -> Result<LengthEstimate, MasterError> {
        let mut controller = self.controller()?;
        Ok(render::estimate(&mut controller, options)?)
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
