//! Synthetic media producers feeding the renderer's channel-backed inputs.

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use renderer::media::{AudioProducer, VideoProducer};
use renderer::PixelBuffer;

const SAMPLE_RATE: u32 = 44_100;
const BLOCK_LEN: usize = 512;
const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Generates one block of a unit-amplitude sine, advancing `phase`.
pub fn tone_block(phase: &mut f64, frequency: f32, len: usize) -> Vec<f32> {
    let step = TAU * f64::from(frequency) / f64::from(SAMPLE_RATE);
    (0..len)
        .map(|_| {
            let sample = phase.sin() as f32;
            *phase = (*phase + step) % TAU;
            sample
        })
        .collect()
}

/// Streams a sine tone in real time until the analyser goes away.
pub fn spawn_tone(producer: AudioProducer, frequency: f32) -> Result<JoinHandle<()>> {
    let block_duration = Duration::from_secs_f64(BLOCK_LEN as f64 / f64::from(SAMPLE_RATE));
    thread::Builder::new()
        .name("pingshade-tone".to_string())
        .spawn(move || {
            let mut phase = 0.0;
            loop {
                if !producer.send_block(tone_block(&mut phase, frequency, BLOCK_LEN)) {
                    tracing::debug!("audio consumer gone; stopping tone");
                    break;
                }
                thread::sleep(block_duration);
            }
        })
        .context("failed to spawn tone thread")
}

/// Image files in `dir`, sorted by name.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read video frame directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no image frames found in {}", dir.display());
    }
    Ok(files)
}

pub fn load_frames(dir: &Path) -> Result<Vec<PixelBuffer>> {
    let files = list_frame_files(dir)?;
    let mut frames = Vec::with_capacity(files.len());
    for path in &files {
        frames.push(PixelBuffer::from_image_path(path)?);
    }
    tracing::info!(count = frames.len(), dir = %dir.display(), "loaded video frames");
    Ok(frames)
}

/// Loops `frames` at `fps` until the feed goes away.
pub fn spawn_image_sequence(
    producer: VideoProducer,
    frames: Vec<PixelBuffer>,
    fps: f32,
) -> Result<JoinHandle<()>> {
    let fps = if fps.is_finite() && fps > 0.0 { fps } else { 24.0 };
    let interval = Duration::from_secs_f64(1.0 / f64::from(fps));
    thread::Builder::new()
        .name("pingshade-video".to_string())
        .spawn(move || {
            if !producer.start() {
                return;
            }
            let origin = Instant::now();
            for frame in frames.iter().cycle() {
                if !producer.send_frame(origin.elapsed(), frame.clone()) {
                    tracing::debug!("video consumer gone; stopping playback");
                    break;
                }
                thread::sleep(interval);
            }
        })
        .context("failed to spawn video thread")
}
