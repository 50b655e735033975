//! Nearest-neighbour playback of a decoded STRM.

use ns_ir::Stream;

use crate::frame::Frame;

/// Steps through a [`Stream`] at its own rate, resampled to the output rate.
#[derive(Clone, Debug)]
pub struct StreamPlayer {
    stream: Stream,
    out_rate: u32,
    position: usize,
    timer: u32,
    finished: bool,
}

impl StreamPlayer {
    pub fn new(stream: Stream, out_rate: u32) -> Self {
        let finished = stream.is_empty();
        Self { stream, out_rate: out_rate.max(1), position: 0, timer: 0, finished }
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Current sample frame index.
    pub fn position(&self) -> usize {
        self.position
    }

    /// A non-looping stream has reached its last frame.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Emit the current frame, then step the source position.
    pub fn next_frame(&mut self) -> Frame {
        let len = self.stream.len();
        if len == 0 {
            return Frame::silence();
        }
        let out = Frame {
            left: self.stream.left[self.position],
            right: self.stream.right[self.position],
        };
        self.timer += self.stream.sample_rate;
        while self.timer >= self.out_rate {
            self.timer -= self.out_rate;
            self.advance(len);
        }
        out
    }

    fn advance(&mut self, len: usize) {
        if self.position + 1 < len {
            self.position += 1;
        } else if self.stream.looping && self.stream.loop_point < len {
            self.position = self.stream.loop_point;
        } else {
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn stream(looping: bool) -> Stream {
        Stream {
            left: vec![0.0, 0.25, 0.5, 0.75],
            right: vec![0.0, -0.25, -0.5, -0.75],
            sample_rate: 16384,
            channels: 2,
            looping,
            loop_point: 2,
        }
    }

    #[test]
    fn half_rate_repeats_each_frame() {
        let mut player = StreamPlayer::new(stream(false), 32768);
        let left: Vec<f32> = (0..6).map(|_| player.next_frame().left).collect();
        assert_eq!(left, vec![0.0, 0.0, 0.25, 0.25, 0.5, 0.5]);
        assert!(!player.is_finished());
    }

    #[test]
    fn one_shot_holds_last_frame() {
        let mut player = StreamPlayer::new(stream(false), 16384);
        for _ in 0..4 {
            player.next_frame();
        }
        assert!(player.is_finished());
        let held = player.next_frame();
        assert_eq!(held, Frame { left: 0.75, right: -0.75 });
        assert_eq!(player.next_frame(), held);
    }

    #[test]
    fn looping_wraps_to_loop_point() {
        let mut player = StreamPlayer::new(stream(true), 16384);
        let left: Vec<f32> = (0..7).map(|_| player.next_frame().left).collect();
        assert_eq!(left, vec![0.0, 0.25, 0.5, 0.75, 0.5, 0.75, 0.5]);
        assert!(!player.is_finished());
    }

    #[test]
    fn empty_stream_is_finished_and_silent() {
        let mut player = StreamPlayer::new(Stream::default(), 32768);
        assert!(player.is_finished());
        assert_eq!(player.next_frame(), Frame::silence());
    }
}
