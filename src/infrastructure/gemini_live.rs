//! Gemini Live transport over a `BidiGenerateContent` WebSocket.
//!
//! One writer task turns [`Outbound`] commands into `realtimeInput` frames,
//! one reader task turns server frames into [`LiveEvent`]s. The server sends
//! JSON in text or binary frames; both are decoded the same way.

use crate::domain::errors::LiveError;
use crate::domain::repositories::live_transport::{
    LiveEvent, LiveLink, LiveSetup, LiveTransport, MediaChunk, Outbound,
};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};
use url::Url;
use zeroize::Zeroizing;

const CHANNEL_CAPACITY: usize = 64;

// ---- client -> server ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LiveGenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Enabled {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Setup<'a> {
    model: String,
    generation_config: LiveGenerationConfig<'a>,
    system_instruction: SystemInstruction<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<Enabled>,
}

#[derive(Debug, Serialize)]
struct SetupMessage<'a> {
    setup: Setup<'a>,
}

impl<'a> SetupMessage<'a> {
    fn from_setup(setup: &'a LiveSetup) -> Self {
        let model = if setup.model.starts_with("models/") {
            setup.model.clone()
        } else {
            format!("models/{}", setup.model)
        };
        Self {
            setup: Setup {
                model,
                generation_config: LiveGenerationConfig {
                    response_modalities: ["AUDIO"],
                    speech_config: SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig {
                                voice_name: &setup.voice,
                            },
                        },
                    },
                },
                system_instruction: SystemInstruction {
                    parts: [TextPart {
                        text: &setup.system_instruction,
                    }],
                },
                output_audio_transcription: setup.output_transcription.then_some(Enabled {}),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInput<'a> {
    media_chunks: [Blob<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputMessage<'a> {
    realtime_input: RealtimeInput<'a>,
}

impl<'a> RealtimeInputMessage<'a> {
    fn from_chunk(chunk: &'a MediaChunk) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media_chunks: [Blob {
                    mime_type: &chunk.mime_type,
                    data: &chunk.data,
                }],
            },
        }
    }
}

// ---- server -> client ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<serde_json::Value>,
    server_content: Option<ServerContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    output_transcription: Option<Transcription>,
    #[serde(default)]
    interrupted: bool,
    #[serde(default)]
    turn_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<TurnPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnPart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct Transcription {
    text: Option<String>,
}

/// Map one server frame to the events it carries, in dispatch order
fn server_events(raw: &[u8]) -> Result<Vec<LiveEvent>, String> {
    let message: ServerMessage = serde_json::from_slice(raw).map_err(|e| e.to_string())?;
    let mut events = Vec::new();

    if message.setup_complete.is_some() {
        events.push(LiveEvent::Opened);
    }

    if let Some(content) = message.server_content {
        if let Some(turn) = content.model_turn {
            events.extend(
                turn.parts
                    .into_iter()
                    .filter_map(|p| p.inline_data)
                    .map(|d| LiveEvent::Audio(d.data)),
            );
        }
        if let Some(text) = content.output_transcription.and_then(|t| t.text) {
            if !text.is_empty() {
                events.push(LiveEvent::Transcript(text));
            }
        }
        if content.interrupted {
            events.push(LiveEvent::Interrupted);
        }
        if content.turn_complete {
            events.push(LiveEvent::TurnComplete);
        }
    }

    Ok(events)
}

/// WebSocket transport to the hosted live model
pub struct GeminiLiveTransport {
    endpoint: String,
    api_key: Option<Zeroizing<String>>,
    connect_timeout: Duration,
}

impl GeminiLiveTransport {
    pub fn new(endpoint: &str, api_key: Option<Zeroizing<String>>, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key,
            connect_timeout,
        }
    }

    fn url(&self) -> Result<Url, LiveError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LiveError::ConnectFailed("API credential is not configured".into()))?;
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| LiveError::ConnectFailed(format!("Invalid live endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", key.as_str());
        Ok(url)
    }
}

#[async_trait]
impl LiveTransport for GeminiLiveTransport {
    async fn connect(&self, setup: LiveSetup) -> Result<LiveLink, LiveError> {
        let url = self.url()?;

        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                LiveError::ConnectFailed(format!(
                    "Connection timeout after {:?}",
                    self.connect_timeout
                ))
            })?
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let setup_json = serde_json::to_string(&SetupMessage::from_setup(&setup))
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;
        write
            .send(Message::Text(setup_json))
            .await
            .map_err(|e| LiveError::ConnectFailed(e.to_string()))?;
        info!("🎙️ Live link open, setup sent for {}", setup.model);

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel::<LiveEvent>(CHANNEL_CAPACITY);

        // Writer
        tokio::spawn(async move {
            while let Some(command) = outbound_rx.recv().await {
                match command {
                    Outbound::Media(chunk) => {
                        let frame = match serde_json::to_string(&RealtimeInputMessage::from_chunk(&chunk)) {
                            Ok(frame) => frame,
                            Err(e) => {
                                error!("Failed to encode media chunk: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(frame)).await {
                            warn!("Live writer stopped: {}", e);
                            return;
                        }
                    }
                    Outbound::Close => break,
                }
            }
            let _ = write.send(Message::Close(None)).await;
            debug!("Live writer closed");
        });

        // Reader
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let payload = match message {
                    Ok(Message::Text(text)) => text.into_bytes(),
                    Ok(Message::Binary(data)) => data,
                    Ok(Message::Close(frame)) => {
                        debug!("Live server closed the stream: {:?}", frame);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = events_tx.send(LiveEvent::Error(e.to_string())).await;
                        break;
                    }
                };
                match server_events(&payload) {
                    Ok(events) => {
                        for event in events {
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => warn!("Ignoring unparseable live frame: {}", e),
                }
            }
            let _ = events_tx.send(LiveEvent::Closed).await;
        });

        Ok(LiveLink {
            outbound: outbound_tx,
            events: events_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setup_message_shape() {
        let setup = LiveSetup {
            model: "gemini-live".into(),
            voice: "Zephyr".into(),
            system_instruction: "Be an analyst".into(),
            output_transcription: true,
        };
        let value = serde_json::to_value(SetupMessage::from_setup(&setup)).unwrap();
        assert_eq!(value["setup"]["model"], "models/gemini-live");
        assert_eq!(value["setup"]["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            value["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Zephyr"
        );
        assert_eq!(value["setup"]["systemInstruction"]["parts"][0]["text"], "Be an analyst");
        assert_eq!(value["setup"]["outputAudioTranscription"], json!({}));
    }

    #[test]
    fn test_realtime_input_shape() {
        let chunk = MediaChunk {
            mime_type: "audio/pcm;rate=16000".into(),
            data: "AAA=".into(),
        };
        let value = serde_json::to_value(RealtimeInputMessage::from_chunk(&chunk)).unwrap();
        assert_eq!(value["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm;rate=16000");
        assert_eq!(value["realtimeInput"]["mediaChunks"][0]["data"], "AAA=");
    }

    #[test]
    fn test_server_content_events_in_order() {
        let raw = json!({
            "serverContent": {
                "modelTurn": {"parts": [{"inlineData": {"mimeType": "audio/pcm", "data": "AQI="}}]},
                "outputTranscription": {"text": "Gold is"},
                "interrupted": true,
                "turnComplete": true
            }
        })
        .to_string();
        let events = server_events(raw.as_bytes()).unwrap();
        assert_eq!(
            events,
            vec![
                LiveEvent::Audio("AQI=".into()),
                LiveEvent::Transcript("Gold is".into()),
                LiveEvent::Interrupted,
                LiveEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn test_setup_complete_opens() {
        let events = server_events(br#"{"setupComplete":{}}"#).unwrap();
        assert_eq!(events, vec![LiveEvent::Opened]);
    }

    #[test]
    fn test_garbage_frame_rejected() {
        assert!(server_events(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_connect_without_key_fails() {
        let transport = GeminiLiveTransport::new("wss://example.invalid/ws", None, Duration::from_secs(1));
        let setup = LiveSetup {
            model: "m".into(),
            voice: "v".into(),
            system_instruction: "s".into(),
            output_transcription: false,
        };
        assert!(matches!(
            transport.connect(setup).await,
            Err(LiveError::ConnectFailed(_))
        ));
    }
}
