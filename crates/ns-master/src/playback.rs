//! Real-time playback thread.
//!
//! The thread owns the [`Controller`] (or [`StreamPlayer`]) outright. The
//! handle talks to it through two lock-free rings: commands in, telemetry
//! snapshots out.

use ns_audio::{AudioOutput, CpalOutput};
use ns_engine::{Controller, EngineConfig, Frame, StreamPlayer, Telemetry, Tuning, TRACK_COUNT};
use ns_ir::{SongData, Stream};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::render::{SongWatch, StopReason};

/// Frames rendered between command polls and telemetry snapshots.
const BLOCK_FRAMES: usize = 256;
const COMMAND_CAPACITY: usize = 64;
const TELEMETRY_CAPACITY: usize = 8;

/// User-facing mix settings that survive song changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MixerState {
    pub track_enabled: [bool; TRACK_COUNT],
    pub track_gain: [f32; TRACK_COUNT],
    pub master_gain: f32,
}

impl Default for MixerState {
    fn default() -> Self {
        Self {
            track_enabled: [true; TRACK_COUNT],
            track_gain: [1.0; TRACK_COUNT],
            master_gain: 1.0,
        }
    }
}

impl MixerState {
    pub(crate) fn apply(&self, controller: &mut Controller) {
        for track in 0..TRACK_COUNT {
            controller.set_track_enabled(track, self.track_enabled[track]);
            controller.set_track_gain(track, self.track_gain[track]);
        }
        controller.set_master_gain(self.master_gain);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Command {
    Pause(bool),
    TrackEnabled(usize, bool),
    TrackGain(usize, f32),
    MasterGain(f32),
    Tuning(Tuning),
}

/// What the thread plays.
pub(crate) enum Program {
    Song { config: EngineConfig, song: Box<SongData>, mixer: MixerState },
    Stream(Stream),
}

enum Source {
    Song { controller: Box<Controller>, watch: SongWatch },
    Stream(StreamPlayer),
}

impl Source {
    fn build(program: Program, sample_rate: u32) -> Self {
        match program {
            Program::Song { mut config, song, mixer } => {
                config.sample_rate = sample_rate;
                let mut controller = Box::new(Controller::new(config));
                mixer.apply(&mut controller);
                controller.load(*song);
                Source::Song { controller, watch: SongWatch::default() }
            }
            Program::Stream(stream) => Source::Stream(StreamPlayer::new(stream, sample_rate)),
        }
    }

    fn apply(&mut self, command: Command) {
        let Source::Song { controller, .. } = self else {
            return;
        };
        match command {
            Command::Pause(paused) => controller.set_paused(paused),
            Command::TrackEnabled(track, enabled) => controller.set_track_enabled(track, enabled),
            Command::TrackGain(track, gain) => controller.set_track_gain(track, gain),
            Command::MasterGain(gain) => controller.set_master_gain(gain),
            Command::Tuning(tuning) => controller.set_tuning(tuning),
        }
    }

    /// Fill `block`. Returns false once there is nothing left to play.
    fn render(&mut self, block: &mut [Frame]) -> bool {
        match self {
            Source::Song { controller, watch } => {
                for frame in block.iter_mut() {
                    *frame = controller.render_frame().unwrap_or_default();
                }
                let finished = matches!(watch.check(controller, u32::MAX), Some(StopReason::Finished));
                !finished && controller.fault().is_none()
            }
            Source::Stream(player) => {
                for frame in block.iter_mut() {
                    *frame = player.next_frame();
                }
                !player.is_finished()
            }
        }
    }

    fn telemetry(&self) -> Option<Telemetry> {
        match self {
            Source::Song { controller, .. } => Some(controller.telemetry()),
            Source::Stream(_) => None,
        }
    }
}

pub(crate) struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    commands: HeapProd<Command>,
    telemetry: HeapCons<Telemetry>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    pub(crate) fn spawn(program: Program, paused: bool) -> Self {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (commands, command_rx) = HeapRb::<Command>::new(COMMAND_CAPACITY).split();
        let (telemetry_tx, telemetry) = HeapRb::<Telemetry>::new(TELEMETRY_CAPACITY).split();

        let stop = stop_signal.clone();
        let done = finished.clone();
        let thread = std::thread::spawn(move || {
            audio_thread(program, paused, stop, done, command_rx, telemetry_tx);
        });

        Self {
            stop_signal,
            finished,
            commands,
            telemetry,
            thread: Some(thread),
        }
    }

    pub(crate) fn send(&mut self, command: Command) {
        if self.commands.try_push(command).is_err() {
            log::warn!("playback command queue full, dropping {:?}", command);
        }
    }

    /// Newest telemetry snapshot published since the last call.
    pub(crate) fn latest_telemetry(&mut self) -> Option<Telemetry> {
        let mut latest = None;
        while let Some(snapshot) = self.telemetry.try_pop() {
            latest = Some(snapshot);
        }
        latest
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    pub(crate) fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("audio thread panicked");
            }
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "alloc_check")]
fn render_block(source: &mut Source, block: &mut [Frame]) -> bool {
    assert_no_alloc::assert_no_alloc(|| source.render(block))
}

#[cfg(not(feature = "alloc_check"))]
fn render_block(source: &mut Source, block: &mut [Frame]) -> bool {
    source.render(block)
}

fn audio_thread(
    program: Program,
    mut paused: bool,
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    mut commands: HeapCons<Command>,
    mut telemetry: HeapProd<Telemetry>,
) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("audio output unavailable: {}", e);
            finished.store(true, Ordering::Relaxed);
            return;
        }
    };

    let sample_rate = output.sample_rate();
    log::info!("audio output at {} Hz", sample_rate);
    let mut source = Source::build(program, sample_rate);

    if let Err(e) = output.build_stream(consumer) {
        log::error!("{}", e);
        finished.store(true, Ordering::Relaxed);
        return;
    }
    if let Err(e) = output.start() {
        log::error!("{}", e);
    }

    let mut block = [Frame::silence(); BLOCK_FRAMES];
    'play: while !stop_signal.load(Ordering::Relaxed) {
        while let Some(command) = commands.try_pop() {
            if let Command::Pause(p) = command {
                paused = p;
                let result = if p { output.stop() } else { output.start() };
                if let Err(e) = result {
                    log::error!("{}", e);
                }
            }
            source.apply(command);
        }
        if paused {
            std::thread::sleep(std::time::Duration::from_millis(5));
            continue;
        }

        let more = render_block(&mut source, &mut block);
        let mut written = 0;
        while written < block.len() {
            if stop_signal.load(Ordering::Relaxed) {
                break 'play;
            }
            let n = output.write(&block[written..]);
            if n == 0 {
                std::hint::spin_loop();
            }
            written += n;
        }
        if let Some(snapshot) = source.telemetry() {
            let _ = telemetry.try_push(snapshot);
        }
        if !more {
            log::debug!("playback reached the end");
            break;
        }
    }

    // Let the device drain what is queued
    for _ in 0..sample_rate / 10 {
        if !output.write_spin(Frame::silence(), &stop_signal) {
            break;
        }
    }
    if output.underruns() > 0 {
        log::warn!("audio output ran dry for {} frames", output.underruns());
    }
    finished.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_ir::{Adsr, InstrumentBank, InstrumentRecord, InstrumentRegion, RegionKind, Sample, SharedBytes};

    fn song(program: &[u8]) -> Program {
        let region = InstrumentRegion {
            kind: RegionKind::Sample,
            sample_id: 0,
            wave_archive: 0,
            base_note: 60,
            adsr: Adsr::new(127, 127, 127, 127),
            pan: 64,
        };
        let mut song = SongData {
            program: SharedBytes::from(program),
            bank: InstrumentBank::new(vec![InstrumentRecord::SingleSample(region)]),
            ..Default::default()
        };
        song.wave_archives[0] = Some(vec![Some(Sample::new(vec![0.5; 64], 32768, 0, true, 0))]);
        Program::Song {
            config: EngineConfig { rng_seed: Some(1), ..Default::default() },
            song: Box::new(song),
            mixer: MixerState::default(),
        }
    }

    #[test]
    fn song_source_follows_commands() {
        // note 60 with zero duration, then rest forever
        let mut source = Source::build(song(&[0x3C, 0x7F, 0x00, 0xFF]), 32768);
        let mut block = [Frame::silence(); BLOCK_FRAMES];
        assert!(render_block(&mut source, &mut block));
        assert!(render_block(&mut source, &mut block));
        assert!(block.iter().any(|f| f.left.abs() > 0.01));
        assert!(source.telemetry().is_some_and(|t| t.note_on(0, 60)));

        source.apply(Command::TrackEnabled(0, false));
        assert!(render_block(&mut source, &mut block));
        assert!(block.iter().all(|f| *f == Frame::silence()));

        source.apply(Command::TrackEnabled(0, true));
        source.apply(Command::MasterGain(0.0));
        assert!(render_block(&mut source, &mut block));
        assert!(block.iter().all(|f| f.left == 0.0 && f.right == 0.0));
    }

    #[test]
    fn stream_source_ends_with_stream() {
        let stream = Stream {
            left: vec![0.5; 300],
            right: vec![-0.5; 300],
            sample_rate: 32768,
            channels: 2,
            looping: false,
            loop_point: 0,
        };
        let mut source = Source::build(Program::Stream(stream), 32768);
        let mut block = [Frame::silence(); BLOCK_FRAMES];
        assert!(render_block(&mut source, &mut block));
        assert_eq!(block[0], Frame { left: 0.5, right: -0.5 });
        assert!(!render_block(&mut source, &mut block));
        assert!(source.telemetry().is_none());
    }

    #[test]
    fn mixer_state_reaches_the_controller() {
        let mut mixer = MixerState::default();
        mixer.track_enabled[3] = false;
        let mut controller = Controller::new(EngineConfig::default());
        mixer.apply(&mut controller);
        assert!(!controller.track_enabled(3));
        assert!(controller.track_enabled(2));
    }
}
