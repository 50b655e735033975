//! Offline rendering and song length estimation.
//!
//! Both run the controller exactly as real-time playback would and stop
//! at the first of: the requested number of loops, every track finished
//! with no note left sounding, or every track resting forever. A linear
//! fade follows the stop point.

use ns_engine::{Controller, EngineError, Frame, SequenceStatus};

/// Fade after a looping song reaches its loop count, in seconds.
pub const LOOP_FADE_SECONDS: f32 = 2.0;
/// Fade after a song ends on its own, in seconds.
pub const FINISH_FADE_SECONDS: f32 = 0.1;
pub const DEFAULT_LOOPS: u32 = 2;
/// Renders never run past this, in seconds.
pub const MAX_RENDER_SECONDS: u32 = 480;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Loops to play before fading out
    pub loops: u32,
    pub loop_fade: f32,
    pub finish_fade: f32,
    pub max_seconds: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            loops: DEFAULT_LOOPS,
            loop_fade: LOOP_FADE_SECONDS,
            finish_fade: FINISH_FADE_SECONDS,
            max_seconds: MAX_RENDER_SECONDS,
        }
    }
}

/// Why a song stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of loops was played
    Looped,
    /// Every track ended and every note died away
    Finished,
    /// Every active track waits on a note that never ends
    RestingForever,
    /// The time limit was hit first
    TimeLimit,
}

impl StopReason {
    /// Fade length used after stopping for this reason.
    pub fn fade_seconds(self, options: &RenderOptions) -> f32 {
        match self {
            StopReason::Finished => options.finish_fade,
            StopReason::Looped | StopReason::RestingForever => options.loop_fade,
            StopReason::TimeLimit => 0.0,
        }
    }
}

/// Result of [`EngineHandle::estimate_length`](crate::EngineHandle::estimate_length).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthEstimate {
    /// Sequence ticks played before the fade
    pub ticks: u64,
    /// Output frames before the fade
    pub frames: u64,
    pub fade_frames: u64,
    pub reason: StopReason,
    pub sample_rate: u32,
}

impl LengthEstimate {
    /// Total length including the fade.
    pub fn seconds(&self) -> f64 {
        (self.frames + self.fade_frames) as f64 / self.sample_rate.max(1) as f64
    }
}

/// Watches a playing controller for the end of its song.
#[derive(Debug, Default)]
pub(crate) struct SongWatch {
    loops: u32,
    last_jumps: u32,
}

impl SongWatch {
    pub(crate) fn check(&mut self, controller: &Controller, loops: u32) -> Option<StopReason> {
        let jumps = controller.jumps();
        if jumps != self.last_jumps {
            self.last_jumps = jumps;
            self.loops += 1;
            log::debug!("loop {} at tick {}", self.loops, controller.telemetry().ticks);
            if self.loops >= loops.max(1) {
                return Some(StopReason::Looped);
            }
        }
        match controller.status() {
            SequenceStatus::AllTracksFinished if controller.notes().is_empty() => Some(StopReason::Finished),
            SequenceStatus::AllTracksRestingForever => Some(StopReason::RestingForever),
            _ => None,
        }
    }
}

fn frame_limit(controller: &Controller, options: &RenderOptions) -> u64 {
    options.max_seconds as u64 * controller.config().sample_rate as u64
}

fn fade_frames(controller: &Controller, options: &RenderOptions, reason: StopReason) -> u64 {
    (reason.fade_seconds(options).max(0.0) as f64 * controller.config().sample_rate as f64) as u64
}

/// Play `controller` headlessly until its song stops.
pub(crate) fn estimate(controller: &mut Controller, options: &RenderOptions) -> Result<LengthEstimate, EngineError> {
    let limit = frame_limit(controller, options);
    let mut watch = SongWatch::default();
    let mut frames = 0;
    let reason = loop {
        if frames >= limit {
            break StopReason::TimeLimit;
        }
        controller.render_frame()?;
        frames += 1;
        if let Some(reason) = watch.check(controller, options.loops) {
            break reason;
        }
    };
    Ok(LengthEstimate {
        ticks: controller.telemetry().ticks,
        frames,
        fade_frames: fade_frames(controller, options, reason),
        reason,
        sample_rate: controller.config().sample_rate,
    })
}

/// Render `controller` until its song stops, then fade out.
pub(crate) fn render(controller: &mut Controller, options: &RenderOptions) -> Result<Vec<Frame>, EngineError> {
    let limit = frame_limit(controller, options);
    let mut watch = SongWatch::default();
    let mut out = Vec::new();
    let reason = loop {
        if out.len() as u64 >= limit {
            break StopReason::TimeLimit;
        }
        out.push(controller.render_frame()?);
        if let Some(reason) = watch.check(controller, options.loops) {
            break reason;
        }
    };

    let fade = fade_frames(controller, options, reason);
    log::debug!("render stopped ({:?}) after {} frames, fading over {}", reason, out.len(), fade);
    out.reserve(fade as usize);
    for i in 0..fade {
        let gain = 1.0 - i as f32 / fade as f32;
        out.push(controller.render_frame()?.scale(gain));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_engine::EngineConfig;
    use ns_ir::{Adsr, InstrumentBank, InstrumentRecord, InstrumentRegion, RegionKind, Sample, SharedBytes, SongData};

    fn controller(program: &[u8]) -> Controller {
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
        let mut c = Controller::new(EngineConfig { rng_seed: Some(1), ..Default::default() });
        c.load(song);
        c
    }

    /// note, rest 48, jump to start
    const LOOPING: [u8; 9] = [0x3C, 0x7F, 0x18, 0x80, 0x30, 0x94, 0x00, 0x00, 0x00];

    #[test]
    fn looping_song_stops_after_loop_count() {
        let options = RenderOptions { loops: 2, ..Default::default() };
        let estimate = estimate(&mut controller(&LOOPING), &options).unwrap();
        assert_eq!(estimate.reason, StopReason::Looped);
        // two passes of 72 ticks at 120 bpm (one tick per two engine ticks)
        assert!((140..=150).contains(&estimate.ticks), "{}", estimate.ticks);
        assert_eq!(estimate.fade_frames, 2 * 32768);
        assert!(estimate.seconds() > 2.0);
    }

    #[test]
    fn finished_song_uses_short_fade() {
        let estimate = estimate(&mut controller(&[0x3C, 0x7F, 0x08, 0xFF]), &RenderOptions::default()).unwrap();
        assert_eq!(estimate.reason, StopReason::Finished);
        assert_eq!(estimate.fade_frames, (0.1f32 as f64 * 32768.0) as u64);
    }

    #[test]
    fn time_limit_caps_render() {
        let options = RenderOptions { loops: 1000, max_seconds: 1, ..Default::default() };
        let frames = render(&mut controller(&LOOPING), &options).unwrap();
        assert_eq!(frames.len(), 32768);
    }

    #[test]
    fn render_fades_to_silence() {
        let options = RenderOptions { loops: 1, loop_fade: 0.5, ..Default::default() };
        let estimate = estimate(&mut controller(&LOOPING), &options).unwrap();
        let frames = render(&mut controller(&LOOPING), &options).unwrap();
        assert_eq!(frames.len() as u64, estimate.frames + estimate.fade_frames);
        let tail = &frames[frames.len() - 16..];
        assert!(tail.iter().all(|f| f.left.abs() < 0.01));
        let mid = &frames[estimate.frames as usize - 100..estimate.frames as usize];
        assert!(mid.iter().any(|f| f.left.abs() > 0.01));
    }
}
