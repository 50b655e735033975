//! nitrosynth CLI: list, play and render songs from DS sound archives.
//!
//! Usage:
//!   ns-cli list game.sdat
//!   ns-cli play game.nds BGM_TITLE
//!   ns-cli render game.sdat 12 -o title.wav --loops 1
//!   ns-cli play game.sdat 3:0        (sub-sequence 0 of sequence archive 3)

use clap::{Args, Parser, Subcommand, ValueEnum};
use ns_master::{EngineConfig, EngineHandle, MixMode, RenderOptions, SongId, SoundArchive, Tuning};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, process};

#[derive(Parser)]
#[command(name = "ns-cli")]
#[command(about = "Nintendo DS sound archive player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sequences, sequence archives and streams
    List {
        /// SDAT file or ROM image
        path: PathBuf,
    },
    /// Play a song on the default audio device
    Play {
        #[command(flatten)]
        song: SongArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Play a stream (STRM) on the default audio device
    Stream {
        path: PathBuf,
        /// Stream id or name
        stream: String,
    },
    /// Render a song to a WAV file
    Render {
        #[command(flatten)]
        song: SongArgs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Estimate a song's length
    Length {
        #[command(flatten)]
        song: SongArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args)]
struct SongArgs {
    /// SDAT file or ROM image
    path: PathBuf,
    /// Sequence id or name, or ARCHIVE:SUB for an archived sequence
    song: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum TuningArg {
    Accurate,
    Equal,
    Pure,
}

#[derive(Args)]
struct EngineArgs {
    /// Output sample rate for rendering
    #[arg(long, default_value_t = 32768)]
    rate: u32,
    #[arg(long, value_enum, default_value_t = TuningArg::Accurate)]
    tuning: TuningArg,
    /// Tonic for pure tuning, in semitones above A
    #[arg(long, default_value_t = 0)]
    tonic: i32,
    /// Sum tracks without clamping and apply pitch bends immediately
    #[arg(long)]
    direct_mix: bool,
    /// Fixed sequence RNG seed
    #[arg(long)]
    seed: Option<u32>,
    /// Tracks to mute (0-15)
    #[arg(long, value_delimiter = ',')]
    mute: Vec<usize>,
    #[arg(long, default_value_t = 1.0)]
    gain: f32,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        let tuning = match self.tuning {
            TuningArg::Accurate => Tuning::HardwareAccurate,
            TuningArg::Equal => Tuning::EqualTemperament,
            TuningArg::Pure => Tuning::Pure { tonic: self.tonic },
        };
        EngineConfig {
            sample_rate: self.rate,
            tuning,
            mixing: if self.direct_mix { MixMode::Direct } else { MixMode::Accurate },
            rng_seed: self.seed,
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct RenderArgs {
    /// Loops to play before fading out
    #[arg(long, default_value_t = ns_master::DEFAULT_LOOPS)]
    loops: u32,
    /// Fade after the last loop, in seconds
    #[arg(long, default_value_t = ns_master::LOOP_FADE_SECONDS)]
    fade: f32,
    /// Maximum length in seconds
    #[arg(long, default_value_t = ns_master::MAX_RENDER_SECONDS)]
    max_seconds: u32,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            loops: self.loops,
            loop_fade: self.fade,
            max_seconds: self.max_seconds,
            ..Default::default()
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List { path } => {
            let handle = open(&path, EngineConfig::default());
            if let Some(archive) = handle.archive() {
                list(archive);
            }
        }
        Commands::Play { song, engine } => {
            let mut handle = open_song(&song, &engine);
            handle.play().unwrap_or_else(|e| fail(e));
            println!("Playing {}...", song.song);
            wait(&mut handle);
        }
        Commands::Stream { path, stream } => {
            let mut handle = open(&path, EngineConfig::default());
            let id = handle
                .archive()
                .and_then(|a| stream.parse().ok().or_else(|| a.stream_id(&stream)))
                .unwrap_or_else(|| fail(format!("no stream {}", stream)));
            handle.play_stream(id).unwrap_or_else(|e| fail(e));
            println!("Playing stream {}...", id);
            wait(&mut handle);
        }
        Commands::Render { song, engine, output, render } => {
            let handle = open_song(&song, &engine);
            println!("Rendering to {} at {} Hz...", output.display(), engine.rate);
            let wav = handle.render_to_wav(&render.options()).unwrap_or_else(|e| fail(e));
            fs::write(&output, &wav)
                .unwrap_or_else(|e| fail(format!("failed to write {}: {}", output.display(), e)));
            println!("Wrote {} bytes", wav.len());
        }
        Commands::Length { song, engine, render } => {
            let handle = open_song(&song, &engine);
            let estimate = handle.estimate_length(&render.options()).unwrap_or_else(|e| fail(e));
            println!(
                "{:.1} s ({} ticks, {:?}, fade {:.1} s)",
                estimate.seconds(),
                estimate.ticks,
                estimate.reason,
                estimate.fade_frames as f64 / estimate.sample_rate as f64
            );
        }
    }
}

fn open(path: &PathBuf, config: EngineConfig) -> EngineHandle {
    let data = fs::read(path).unwrap_or_else(|e| fail(format!("failed to read {}: {}", path.display(), e)));
    log::info!("read {} bytes from {}", data.len(), path.display());
    let mut handle = EngineHandle::new(config);
    handle.load_archive(data).unwrap_or_else(|e| fail(e));
    handle
}

fn open_song(args: &SongArgs, engine: &EngineArgs) -> EngineHandle {
    let mut handle = open(&args.path, engine.config());
    let id = handle
        .archive()
        .and_then(|a| parse_song(a, &args.song))
        .unwrap_or_else(|| fail(format!("no song {}", args.song)));
    handle.select(id).unwrap_or_else(|e| fail(e));
    for &track in &engine.mute {
        handle.set_track_enabled(track, false);
    }
    handle.set_master_gain(engine.gain);
    handle
}

fn parse_song(archive: &SoundArchive, song: &str) -> Option<SongId> {
    if let Some((a, s)) = song.split_once(':') {
        let archive_id = a.parse().ok().or_else(|| archive.archive_id(a))?;
        let sub = s.parse().ok().or_else(|| archive.archive_sequence_id(archive_id, s))?;
        return Some(SongId::Archive { archive: archive_id, sub });
    }
    let id = song.parse().ok().or_else(|| archive.sequence_id(song))?;
    Some(SongId::Sequence(id))
}

fn list(archive: &SoundArchive) {
    println!("Sequences:");
    for id in archive.sequence_ids() {
        let bank = archive.sequence_info(id).map_or(0, |i| i.bank);
        println!("  {:4}  {:32} bank {}", id, archive.sequence_name(id).unwrap_or("-"), bank);
    }
    println!("Sequence archives:");
    for id in archive.archive_ids() {
        let count = archive.archive_sequence_count(id).unwrap_or(0);
        println!("  {:4}  {:32} {} sequences", id, archive.archive_name(id).unwrap_or("-"), count);
    }
    println!("Streams:");
    for id in archive.stream_ids() {
        println!("  {:4}  {}", id, archive.stream_name(id).unwrap_or("-"));
    }
}

fn wait(handle: &mut EngineHandle) {
    while handle.is_playing() {
        let t = handle.telemetry();
        let sounding: u32 = t.notes_on.iter().map(|bits| bits.count_ones()).sum();
        print!(
            "\rTick {:6} | loops {:3} | notes {:3} | peak {:4.2} {:4.2}",
            t.ticks, t.jumps, sounding, t.master_peak.left, t.master_peak.right
        );
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(50));
    }
    println!("\rDone.                                                   ");
}
