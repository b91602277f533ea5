//! Live analyst session actor.
//!
//! `Idle -> Connecting -> Active -> Idle`. `start` acquires capture and opens
//! the transport, then hands both to a driver task that:
//! - forwards capture frames as PCM16 media chunks once the server has
//!   accepted the setup, through a drop-oldest [`FrameQueue`]
//! - dispatches every inbound [`LiveEvent`] through one handler
//! - exits when [`SessionCore::teardown`] fires its stop signal
//!
//! Teardown is the only cancellation path. It is guarded by the session
//! state, so explicit stop, remote close, transport error and drop can all
//! call it without releasing anything twice.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use super::frame_queue::FrameQueue;
use super::pcm::{
    decode_pcm16, duration_secs, encode_pcm16, CAPTURE_FRAME_LEN, CAPTURE_SAMPLE_RATE,
    PLAYBACK_SAMPLE_RATE,
};
use super::playback::PlaybackScheduler;
use super::transcript::TranscriptWindow;
use crate::config::{DEFAULT_LIVE_MODEL, DEFAULT_LIVE_VOICE};
use crate::domain::errors::LiveError;
use crate::domain::repositories::audio_io::{AudioSource, PlaybackSink};
use crate::domain::repositories::live_transport::{
    LiveEvent, LiveSetup, LiveTransport, MediaChunk, Outbound, CAPTURE_MIME_TYPE,
};
use crate::domain::value_objects::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
        }
    }
}

/// Pushed to subscribers as the session evolves
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    State(SessionState),
    Transcript(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct LiveSessionSettings {
    pub model: String,
    pub voice: String,
    pub queue_capacity: usize,
}

impl Default for LiveSessionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_LIVE_MODEL.to_string(),
            voice: DEFAULT_LIVE_VOICE.to_string(),
            queue_capacity: 32,
        }
    }
}

/// Persona of the spoken analyst
pub fn analyst_instruction(language: Language) -> String {
    format!(
        "You are a professional Gold Market AI Analyst. \
         The user is currently looking at the XAUUSD Live Terminal. \
         Provide real-time technical analysis and insights when asked. \
         Be concise, authoritative, and maintain a high-level institutional tone. \
         Response in {}.",
        language.name()
    )
}

/// Everything a running session owns
struct SessionCore {
    state: SessionState,
    generation: u64,
    scheduler: PlaybackScheduler,
    transcript: TranscriptWindow,
    source: Option<Box<dyn AudioSource>>,
    sink: Option<Box<dyn PlaybackSink>>,
    outbound: Option<mpsc::Sender<Outbound>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SessionCore {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            scheduler: PlaybackScheduler::new(),
            transcript: TranscriptWindow::new(),
            source: None,
            sink: None,
            outbound: None,
            stop_tx: None,
        }
    }

    fn play(&mut self, samples: &[f32]) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let now = sink.current_time();
        self.scheduler.reap(now);
        let buffer = self
            .scheduler
            .schedule(now, duration_secs(samples.len(), PLAYBACK_SAMPLE_RATE));
        sink.play(buffer.id, samples, PLAYBACK_SAMPLE_RATE, buffer.start_at);
    }

    fn interrupt(&mut self) -> usize {
        let ids = self.scheduler.interrupt();
        if let Some(sink) = self.sink.as_mut() {
            for id in &ids {
                sink.stop(*id);
            }
        }
        ids.len()
    }

    /// Release everything. Returns false when already idle.
    fn teardown(&mut self) -> bool {
        if self.state == SessionState::Idle {
            return false;
        }
        self.state = SessionState::Idle;

        if let Some(outbound) = self.outbound.take() {
            match outbound.try_send(Outbound::Close) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!("Transport queue full at teardown, closing when the sender drops");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Transport already closed at teardown");
                }
            }
        }
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.interrupt();
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
        self.scheduler.clear();
        self.transcript.clear();
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        true
    }
}

pub struct LiveSession {
    transport: Arc<dyn LiveTransport>,
    settings: LiveSessionSettings,
    core: Arc<Mutex<SessionCore>>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl LiveSession {
    pub fn new(transport: Arc<dyn LiveTransport>, settings: LiveSessionSettings) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            transport,
            settings,
            core: Arc::new(Mutex::new(SessionCore::new())),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        self.core.lock().await.state
    }

    pub async fn transcript(&self) -> String {
        self.core.lock().await.transcript.as_str().to_string()
    }

    /// Setup sent to the transport for `language`
    pub fn setup(&self, language: Language) -> LiveSetup {
        LiveSetup {
            model: self.settings.model.clone(),
            voice: self.settings.voice.clone(),
            system_instruction: analyst_instruction(language),
            output_transcription: true,
        }
    }

    /// Acquire capture, open the transport and spawn the driver.
    ///
    /// Returns the generation of the new session, which [`stop_if`] takes to
    /// tear down only that session. On failure the session is back to `Idle`
    /// and both devices are closed.
    ///
    /// [`stop_if`]: LiveSession::stop_if
    pub async fn start(
        &self,
        language: Language,
        mut source: Box<dyn AudioSource>,
        mut sink: Box<dyn PlaybackSink>,
    ) -> Result<u64, LiveError> {
        let generation = {
            let mut core = self.core.lock().await;
            if core.state != SessionState::Idle {
                return Err(LiveError::AlreadyRunning(core.state.as_str()));
            }
            core.state = SessionState::Connecting;
            core.generation += 1;
            core.generation
        };
        self.publish(SessionUpdate::State(SessionState::Connecting));
        info!("🎙️ Starting live analyst session ({})", language.code());

        let frames = match source.open(CAPTURE_SAMPLE_RATE, CAPTURE_FRAME_LEN).await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Capture unavailable: {}", e);
                source.close();
                sink.close();
                self.abort_start(generation).await;
                return Err(e);
            }
        };

        let link = match self.transport.connect(self.setup(language)).await {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to open live session: {}", e);
                source.close();
                sink.close();
                self.abort_start(generation).await;
                return Err(e);
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut core = self.core.lock().await;
            if core.generation != generation || core.state != SessionState::Connecting {
                source.close();
                sink.close();
                let _ = link.outbound.try_send(Outbound::Close);
                return Err(LiveError::ConnectFailed(
                    "session stopped while connecting".to_string(),
                ));
            }
            core.source = Some(source);
            core.sink = Some(sink);
            core.outbound = Some(link.outbound.clone());
            core.stop_tx = Some(stop_tx);
        }

        let driver = SessionDriver {
            core: self.core.clone(),
            generation,
            updates: self.updates.clone(),
            queue: FrameQueue::new(self.settings.queue_capacity),
        };
        tokio::spawn(driver.run(frames, link.events, link.outbound, stop_rx));
        Ok(generation)
    }

    /// Idempotent; a no-op when idle
    pub async fn stop(&self) {
        let mut core = self.core.lock().await;
        if core.teardown() {
            info!("Live analyst session stopped");
            self.publish(SessionUpdate::State(SessionState::Idle));
        }
    }

    /// Stop only the session `start` returned `generation` for.
    ///
    /// Returns false when that session already ended, leaving any newer
    /// session running.
    pub async fn stop_if(&self, generation: u64) -> bool {
        let mut core = self.core.lock().await;
        if core.generation != generation {
            debug!(
                "Ignoring stop for session {}, current is {}",
                generation, core.generation
            );
            return false;
        }
        if core.teardown() {
            info!("Live analyst session {} stopped", generation);
            self.publish(SessionUpdate::State(SessionState::Idle));
            return true;
        }
        false
    }

    /// Start when idle, stop otherwise
    pub async fn toggle(
        &self,
        language: Language,
        source: Box<dyn AudioSource>,
        sink: Box<dyn PlaybackSink>,
    ) -> Result<SessionState, LiveError> {
        if self.state().await == SessionState::Idle {
            self.start(language, source, sink).await?;
        } else {
            self.stop().await;
        }
        Ok(self.state().await)
    }

    async fn abort_start(&self, generation: u64) {
        let mut core = self.core.lock().await;
        if core.generation == generation && core.state == SessionState::Connecting {
            core.state = SessionState::Idle;
        }
        self.publish(SessionUpdate::State(core.state));
    }

    fn publish(&self, update: SessionUpdate) {
        // No subscribers is fine
        let _ = self.updates.send(update);
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Ok(mut core) = self.core.try_lock() {
            core.teardown();
        }
    }
}

enum Flow {
    Continue,
    Activate,
    Stop,
}

struct SessionDriver {
    core: Arc<Mutex<SessionCore>>,
    generation: u64,
    updates: broadcast::Sender<SessionUpdate>,
    queue: FrameQueue<MediaChunk>,
}

impl SessionDriver {
    async fn run(
        mut self,
        mut frames: mpsc::Receiver<Vec<f32>>,
        mut events: mpsc::Receiver<LiveEvent>,
        outbound: mpsc::Sender<Outbound>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        let mut active = false;

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,

                event = events.recv() => {
                    let event = event.unwrap_or(LiveEvent::Closed);
                    match self.dispatch(event).await {
                        Flow::Continue => {}
                        Flow::Activate => active = true,
                        Flow::Stop => break,
                    }
                }

                frame = frames.recv(), if active => match frame {
                    Some(samples) => self.enqueue(&samples),
                    None => {
                        warn!("Capture stream ended");
                        self.shutdown().await;
                        break;
                    }
                },

                permit = outbound.reserve(), if !self.queue.is_empty() => match permit {
                    Ok(permit) => {
                        if let Some(chunk) = self.queue.pop() {
                            permit.send(Outbound::Media(chunk));
                        }
                    }
                    Err(_) => {
                        warn!("Live transport stopped accepting frames");
                        self.shutdown().await;
                        break;
                    }
                },
            }
        }

        if self.queue.dropped() > 0 {
            info!(
                "Live session ended with {} capture frame(s) dropped",
                self.queue.dropped()
            );
        }
        debug!("Live session driver {} exited", self.generation);
    }

    fn enqueue(&mut self, samples: &[f32]) {
        let chunk = MediaChunk {
            mime_type: CAPTURE_MIME_TYPE.to_string(),
            data: encode_pcm16(samples),
        };
        if self.queue.push(chunk).is_some() {
            let dropped = self.queue.dropped();
            if dropped == 1 || dropped % 100 == 0 {
                warn!("Outbound queue full, dropped {} oldest frame(s) so far", dropped);
            }
        }
    }

    async fn dispatch(&self, event: LiveEvent) -> Flow {
        let mut core = self.core.lock().await;
        if core.generation != self.generation || core.state == SessionState::Idle {
            return Flow::Stop;
        }

        match event {
            LiveEvent::Opened => {
                core.state = SessionState::Active;
                info!("✓ Live analyst session active");
                self.publish(SessionUpdate::State(SessionState::Active));
                Flow::Activate
            }
            LiveEvent::Audio(data) => {
                match decode_pcm16(&data) {
                    Ok(samples) => core.play(&samples),
                    Err(e) => warn!("Dropping inbound audio: {}", e),
                }
                Flow::Continue
            }
            LiveEvent::Transcript(fragment) => {
                let text = core.transcript.append(&fragment).to_string();
                self.publish(SessionUpdate::Transcript(text));
                Flow::Continue
            }
            LiveEvent::Interrupted => {
                let stopped = core.interrupt();
                debug!("Interrupted, stopped {} buffer(s)", stopped);
                Flow::Continue
            }
            LiveEvent::TurnComplete => {
                debug!("Model turn complete");
                Flow::Continue
            }
            LiveEvent::Error(message) => {
                error!("Live session error: {}", message);
                self.publish(SessionUpdate::Error(message));
                core.teardown();
                self.publish(SessionUpdate::State(SessionState::Idle));
                Flow::Stop
            }
            LiveEvent::Closed => {
                info!("Live session closed by remote");
                core.teardown();
                self.publish(SessionUpdate::State(SessionState::Idle));
                Flow::Stop
            }
        }
    }

    async fn shutdown(&self) {
        let mut core = self.core.lock().await;
        if core.generation == self.generation && core.teardown() {
            self.publish(SessionUpdate::State(SessionState::Idle));
        }
    }

    fn publish(&self, update: SessionUpdate) {
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_language() {
        assert!(analyst_instruction(Language::Th).ends_with("Response in Thai."));
        assert!(analyst_instruction(Language::En).contains("Gold Market AI Analyst"));
    }

    #[test]
    fn test_teardown_twice_is_noop() {
        let mut core = SessionCore::new();
        core.state = SessionState::Active;
        assert!(core.teardown());
        assert!(!core.teardown());
        assert_eq!(core.state, SessionState::Idle);
    }

    #[test]
    fn test_teardown_with_full_transport_queue() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(Outbound::Close).unwrap();
        let mut core = SessionCore::new();
        core.state = SessionState::Active;
        core.outbound = Some(tx);

        assert!(core.teardown());
        assert!(core.outbound.is_none());
        assert!(rx.try_recv().is_ok());
        // Sender released, so the writer sees the channel close
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::Connecting.as_str(), "connecting");
        assert_eq!(
            serde_json::to_string(&SessionState::Active).unwrap(),
            "\"active\""
        );
    }
}
