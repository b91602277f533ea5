//! Live Transport Trait
//!
//! Bidirectional streaming link to the hosted conversational model. A
//! connected link is a pair of channels: realtime media goes out through
//! `outbound`, and every server-side happening comes back as one
//! [`LiveEvent`] variant on `events`.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::LiveError;

/// MIME tag of outbound capture frames
pub const CAPTURE_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Session parameters sent when the link opens
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSetup {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
    /// Ask the server to transcribe its own spoken output
    pub output_transcription: bool,
}

/// One base64 encoded realtime media chunk
#[derive(Debug, Clone, PartialEq)]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Media(MediaChunk),
    Close,
}

/// Closed set of inbound events
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Opened,
    /// Base64 PCM16 mono at 24 kHz
    Audio(String),
    Transcript(String),
    Interrupted,
    TurnComplete,
    Error(String),
    Closed,
}

pub struct LiveLink {
    pub outbound: mpsc::Sender<Outbound>,
    pub events: mpsc::Receiver<LiveEvent>,
}

#[async_trait]
pub trait LiveTransport: Send + Sync {
    /// Open the stream and send `setup`. `LiveEvent::Opened` follows once
    /// the server has accepted it.
    async fn connect(&self, setup: LiveSetup) -> Result<LiveLink, LiveError>;
}
