//! Audio device seams of the live session: where capture frames come from
//! and where decoded speech is scheduled.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::LiveError;

pub type BufferId = u64;

#[async_trait]
pub trait AudioSource: Send {
    /// Acquire the capture device. Frames are mono f32 in [-1, 1] of exactly
    /// `frame_len` samples at `sample_rate`.
    async fn open(
        &mut self,
        sample_rate: u32,
        frame_len: usize,
    ) -> Result<mpsc::Receiver<Vec<f32>>, LiveError>;

    /// Release the device. Must tolerate being called more than once.
    fn close(&mut self);
}

/// Output device with its own monotonic clock in seconds
pub trait PlaybackSink: Send {
    fn current_time(&self) -> f64;

    /// Start `samples` at `start_at` on the sink clock
    fn play(&mut self, id: BufferId, samples: &[f32], sample_rate: u32, start_at: f64);

    /// Silence a buffer whether it is queued or already playing
    fn stop(&mut self, id: BufferId);

    /// Release the device. Must tolerate being called more than once.
    fn close(&mut self);
}
