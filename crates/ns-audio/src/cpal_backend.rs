//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ns_engine::Frame;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioOutput};

/// Ring capacity as a fraction of a second.
const BUFFER_DIVISOR: usize = 10;

/// CPAL output fed from a lock-free ring of [`Frame`]s.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Frame>,
    running: Arc<AtomicBool>,
    /// Device frames padded with silence because the ring ran dry
    underruns: Arc<AtomicU64>,
}

/// Copy one frame into an interleaved device frame.
fn write_device_frame(out: &mut [f32], frame: Frame) {
    for (i, sample) in out.iter_mut().enumerate() {
        *sample = match i {
            0 => frame.left,
            1 => frame.right,
            _ => 0.0,
        };
    }
}

impl CpalOutput {
    /// Open the default output device at its default rate.
    pub fn new() -> Result<(Self, HeapCons<Frame>), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        log::debug!("output device: {}", device.name().unwrap_or_else(|_| "<unnamed>".into()));

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The callback interleaves two channels per frame
        config.channels = 2;

        let capacity = (config.sample_rate.0 as usize / BUFFER_DIVISOR).max(64);
        let (producer, consumer) = HeapRb::<Frame>::new(capacity).split();

        let output = Self {
            device,
            config,
            stream: None,
            producer,
            running: Arc::new(AtomicBool::new(false)),
            underruns: Arc::new(AtomicU64::new(0)),
        };

        Ok((output, consumer))
    }

    /// Build the device stream that drains `consumer`.
    pub fn build_stream(&mut self, mut consumer: HeapCons<Frame>) -> Result<(), AudioError> {
        let running = self.running.clone();
        let underruns = self.underruns.clone();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    let mut missing = 0;
                    for chunk in data.chunks_mut(channels) {
                        let frame = consumer.try_pop().unwrap_or_else(|| {
                            missing += 1;
                            Frame::silence()
                        });
                        write_device_frame(chunk, frame);
                    }
                    if missing > 0 {
                        underruns.fetch_add(missing, Ordering::Relaxed);
                    }
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Write a single frame, spinning until the ring buffer has room.
    ///
    /// Gives up and returns false once `stop` is raised.
    pub fn write_spin(&mut self, frame: Frame, stop: &AtomicBool) -> bool {
        while self.producer.try_push(frame).is_err() {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// Frames queued but not yet played.
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }

    /// Device frames that had to be filled with silence while running.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn write(&mut self, frames: &[Frame]) -> usize {
        self.producer.push_slice(frames)
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}
