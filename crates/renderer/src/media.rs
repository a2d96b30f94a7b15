//! Channel-backed media feeds.
//!
//! Decoding and capture happen on producer threads; the render tick only ever
//! calls `try_recv`, so a slow or stalled producer never holds up a frame.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::sources::{AudioAnalyser, PlaybackStatus, VideoFeed, AUDIO_SAMPLE_COUNT};
use crate::types::PixelBuffer;

#[derive(Debug)]
enum VideoMessage {
    Started,
    Frame {
        timestamp: Duration,
        pixels: PixelBuffer,
    },
}

/// Producer half of a [`ChannelVideoFeed`].
#[derive(Clone, Debug)]
pub struct VideoProducer {
    sender: Sender<VideoMessage>,
}

impl VideoProducer {
    /// Returns `false` once the feed has been dropped.
    pub fn start(&self) -> bool {
        self.sender.send(VideoMessage::Started).is_ok()
    }

    /// Offers a decoded frame. Frames are dropped while the channel is full.
    /// Returns `false` once the feed has been dropped.
    pub fn send_frame(&self, timestamp: Duration, pixels: PixelBuffer) -> bool {
        match self
            .sender
            .try_send(VideoMessage::Frame { timestamp, pixels })
        {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half: the render-side view of a video player.
#[derive(Debug)]
pub struct ChannelVideoFeed {
    receiver: Receiver<VideoMessage>,
    playing: bool,
    time_advanced: bool,
    frame: Option<PixelBuffer>,
}

/// Creates a connected video producer/feed pair holding at most `capacity`
/// undelivered frames.
pub fn video_channel(capacity: usize) -> (VideoProducer, ChannelVideoFeed) {
    let (sender, receiver) = bounded(capacity.max(1));
    (
        VideoProducer { sender },
        ChannelVideoFeed {
            receiver,
            playing: false,
            time_advanced: false,
            frame: None,
        },
    )
}

impl ChannelVideoFeed {
    fn drain(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                VideoMessage::Started => self.playing = true,
                VideoMessage::Frame { timestamp, pixels } => {
                    if timestamp > Duration::ZERO {
                        self.time_advanced = true;
                    }
                    self.frame = Some(pixels);
                }
            }
        }
    }
}

impl VideoFeed for ChannelVideoFeed {
    fn status(&mut self) -> PlaybackStatus {
        self.drain();
        PlaybackStatus {
            playing: self.playing,
            time_advanced: self.time_advanced,
        }
    }

    fn latest_frame(&mut self) -> Option<&PixelBuffer> {
        self.drain();
        self.frame.as_ref()
    }
}

/// Producer half of a [`ChannelAudioAnalyser`].
#[derive(Clone, Debug)]
pub struct AudioProducer {
    sender: Sender<Vec<f32>>,
}

impl AudioProducer {
    /// Offers a block of samples in `-1.0..=1.0`; dropped while the channel is
    /// full. Returns `false` once the analyser has been dropped.
    pub fn send_block(&self, samples: Vec<f32>) -> bool {
        match self.sender.try_send(samples) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Keeps the most recent [`AUDIO_SAMPLE_COUNT`] samples received.
#[derive(Debug)]
pub struct ChannelAudioAnalyser {
    receiver: Receiver<Vec<f32>>,
    history: Vec<f32>,
    received: bool,
}

pub fn audio_channel(capacity: usize) -> (AudioProducer, ChannelAudioAnalyser) {
    let (sender, receiver) = bounded(capacity.max(1));
    (
        AudioProducer { sender },
        ChannelAudioAnalyser {
            receiver,
            history: vec![0.0; AUDIO_SAMPLE_COUNT],
            received: false,
        },
    )
}

impl AudioAnalyser for ChannelAudioAnalyser {
    fn fill_time_domain(&mut self, out: &mut [f32]) -> bool {
        while let Ok(block) = self.receiver.try_recv() {
            self.received = true;
            let keep = block.len().min(self.history.len());
            self.history.rotate_left(keep);
            let start = self.history.len() - keep;
            self.history[start..].copy_from_slice(&block[block.len() - keep..]);
        }
        if !self.received {
            return false;
        }

        let count = out.len().min(self.history.len());
        let (padding, tail) = out.split_at_mut(out.len() - count);
        padding.fill(0.0);
        tail.copy_from_slice(&self.history[self.history.len() - count..]);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelFormat;

    #[test]
    fn video_status_tracks_start_and_advancing_frames() {
        let (producer, mut feed) = video_channel(4);
        assert_eq!(feed.status(), PlaybackStatus::default());

        assert!(producer.start());
        assert!(producer.send_frame(Duration::ZERO, PixelBuffer::filled(1, 1, PixelFormat::Rgba8, 1)));
        let status = feed.status();
        assert!(status.playing);
        assert!(!status.time_advanced);

        assert!(producer.send_frame(
            Duration::from_millis(40),
            PixelBuffer::filled(1, 1, PixelFormat::Rgba8, 2)
        ));
        assert!(feed.status().time_advanced);
        assert_eq!(feed.latest_frame().unwrap().data(), &[2, 2, 2, 2]);
    }

    #[test]
    fn latest_frame_persists_without_new_messages() {
        let (producer, mut feed) = video_channel(1);
        producer.send_frame(Duration::from_millis(1), PixelBuffer::filled(1, 1, PixelFormat::Rgba8, 5));
        assert!(feed.latest_frame().is_some());
        assert!(feed.latest_frame().is_some());
    }

    #[test]
    fn full_video_channel_drops_frames() {
        let (producer, mut feed) = video_channel(1);
        assert!(producer.send_frame(Duration::from_millis(1), PixelBuffer::filled(1, 1, PixelFormat::Rgba8, 1)));
        assert!(producer.send_frame(Duration::from_millis(2), PixelBuffer::filled(1, 1, PixelFormat::Rgba8, 2)));
        assert_eq!(feed.latest_frame().unwrap().data()[0], 1);
    }

    #[test]
    fn dropped_feed_disconnects_producer() {
        let (producer, feed) = video_channel(1);
        drop(feed);
        assert!(!producer.start());
    }

    #[test]
    fn analyser_keeps_most_recent_samples() {
        let (producer, mut analyser) = audio_channel(8);
        let mut out = vec![0.0; 4];
        assert!(!analyser.fill_time_domain(&mut out));

        producer.send_block(vec![0.1, 0.2, 0.3]);
        producer.send_block(vec![0.4, 0.5]);
        assert!(analyser.fill_time_domain(&mut out));
        assert_eq!(out, vec![0.2, 0.3, 0.4, 0.5]);

        // No new block: the previous buffer is reported again.
        assert!(analyser.fill_time_domain(&mut out));
        assert_eq!(out, vec![0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn oversized_blocks_keep_their_tail() {
        let (producer, mut analyser) = audio_channel(1);
        let block: Vec<f32> = (0..AUDIO_SAMPLE_COUNT + 10).map(|i| i as f32).collect();
        producer.send_block(block);
        let mut out = vec![0.0; AUDIO_SAMPLE_COUNT];
        assert!(analyser.fill_time_domain(&mut out));
        assert_eq!(out[0], 10.0);
        assert_eq!(out[AUDIO_SAMPLE_COUNT - 1], (AUDIO_SAMPLE_COUNT + 9) as f32);
    }
}
