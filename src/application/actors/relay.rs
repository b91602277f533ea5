//! Audio devices backed by a `/live` WebSocket client.
//!
//! The browser streams raw capture samples up as binary frames (f32 LE) and
//! plays whatever the [`RelaySink`] tells it to. Schedules use the sink's own
//! clock: seconds since the sink was created.

use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::pcm::encode_pcm16;
use crate::domain::errors::LiveError;
use crate::domain::repositories::audio_io::{AudioSource, BufferId, PlaybackSink};
use async_trait::async_trait;

const RAW_CHANNEL_CAPACITY: usize = 64;
const FRAME_CHANNEL_CAPACITY: usize = 16;

/// Re-chunks arbitrary sample runs into fixed-length frames
#[derive(Debug)]
pub struct FrameAssembler {
    frame_len: usize,
    pending: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(frame_len: usize) -> Self {
        let frame_len = frame_len.max(1);
        Self {
            frame_len,
            pending: Vec::with_capacity(frame_len),
        }
    }

    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_len {
            let rest = self.pending.split_off(self.frame_len);
            frames.push(std::mem::replace(&mut self.pending, rest));
        }
        frames
    }
}

/// Decode a binary WebSocket frame of little-endian f32 samples
pub fn samples_from_bytes(bytes: &[u8]) -> Result<Vec<f32>, LiveError> {
    if bytes.len() % 4 != 0 {
        return Err(LiveError::InvalidAudio(format!(
            "{} bytes is not a whole number of f32 samples",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]).clamp(-1.0, 1.0))
        .collect())
}

/// Writer half handed to the WebSocket reader
#[derive(Clone)]
pub struct RelayInput {
    raw: mpsc::Sender<Vec<f32>>,
}

impl RelayInput {
    /// Forward one binary frame; frames arriving faster than capture is
    /// consumed are dropped
    pub fn push_bytes(&self, bytes: &[u8]) -> Result<(), LiveError> {
        let samples = samples_from_bytes(bytes)?;
        if let Err(mpsc::error::TrySendError::Full(_)) = self.raw.try_send(samples) {
            debug!("Capture relay full, dropping client frame");
        }
        Ok(())
    }
}

pub struct RelaySource {
    raw: Option<mpsc::Receiver<Vec<f32>>>,
    task: Option<JoinHandle<()>>,
}

impl RelaySource {
    pub fn new() -> (Self, RelayInput) {
        let (tx, rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        (
            Self {
                raw: Some(rx),
                task: None,
            },
            RelayInput { raw: tx },
        )
    }
}

#[async_trait]
impl AudioSource for RelaySource {
    async fn open(
        &mut self,
        _sample_rate: u32,
        frame_len: usize,
    ) -> Result<mpsc::Receiver<Vec<f32>>, LiveError> {
        let mut raw = self
            .raw
            .take()
            .ok_or_else(|| LiveError::CaptureDenied("capture relay already in use".into()))?;
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        self.task = Some(tokio::spawn(async move {
            let mut assembler = FrameAssembler::new(frame_len);
            while let Some(samples) = raw.recv().await {
                for frame in assembler.push(&samples) {
                    if tx.send(frame).await.is_err() {
                        return;
                    }
                }
            }
        }));
        Ok(rx)
    }

    fn close(&mut self) {
        self.raw = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RelaySource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Instruction for the client's audio output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaybackCommand {
    Play {
        id: BufferId,
        #[serde(rename = "startAt")]
        start_at: f64,
        #[serde(rename = "sampleRate")]
        sample_rate: u32,
        /// base64 PCM16 LE mono
        data: String,
    },
    Stop {
        id: BufferId,
    },
}

pub struct RelaySink {
    epoch: Instant,
    commands: mpsc::UnboundedSender<PlaybackCommand>,
    closed: bool,
}

impl RelaySink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                epoch: Instant::now(),
                commands: tx,
                closed: false,
            },
            rx,
        )
    }

    fn send(&self, command: PlaybackCommand) {
        if self.closed {
            return;
        }
        if self.commands.send(command).is_err() {
            warn!("Playback client is gone");
        }
    }
}

impl PlaybackSink for RelaySink {
    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn play(&mut self, id: BufferId, samples: &[f32], sample_rate: u32, start_at: f64) {
        self.send(PlaybackCommand::Play {
            id,
            start_at,
            sample_rate,
            data: encode_pcm16(samples),
        });
    }

    fn stop(&mut self, id: BufferId) {
        self.send(PlaybackCommand::Stop { id });
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
