//! Gap-free ordered playback scheduling.
//!
//! Every inbound buffer starts at `max(now, next_start)` and pushes
//! `next_start` forward by its duration, so buffers play back-to-back in
//! arrival order. An interruption forgets every tracked buffer and resets
//! `next_start` to zero, which makes the next buffer start at `now`.

use crate::domain::repositories::audio_io::BufferId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub id: BufferId,
    pub start_at: f64,
    pub end_at: f64,
}

#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start: f64,
    next_id: BufferId,
    live: Vec<ScheduledBuffer>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: f64, duration: f64) -> ScheduledBuffer {
        let start_at = self.next_start.max(now);
        self.next_start = start_at + duration;
        self.next_id += 1;
        let buffer = ScheduledBuffer {
            id: self.next_id,
            start_at,
            end_at: self.next_start,
        };
        self.live.push(buffer);
        buffer
    }

    /// Forget buffers that finished playing; returns how many were dropped
    pub fn reap(&mut self, now: f64) -> usize {
        let before = self.live.len();
        self.live.retain(|b| b.end_at > now);
        before - self.live.len()
    }

    /// Ids of every buffer still queued or playing, which must be stopped.
    /// Leaves the tracking set empty and the clock at zero.
    pub fn interrupt(&mut self) -> Vec<BufferId> {
        self.next_start = 0.0;
        self.live.drain(..).map(|b| b.id).collect()
    }

    pub fn clear(&mut self) {
        self.next_start = 0.0;
        self.live.clear();
    }
}
