//! `/live` WebSocket: the browser side of the live analyst session.
//!
//! Client to server:
//! - text `{"type":"start","language":"th"}` / `{"type":"stop"}`
//! - binary frames of little-endian f32 capture samples at 16 kHz
//!
//! Server to client, all text JSON: session `state`, `transcript` and `error`
//! updates plus the `play` / `stop` commands of the relay sink.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::actors::relay::{PlaybackCommand, RelayInput, RelaySink, RelaySource};
use crate::application::actors::{SessionState, SessionUpdate};
use crate::application::state::AppState;
use crate::domain::value_objects::language::Language;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientCommand {
    Start {
        #[serde(default)]
        language: Option<Language>,
    },
    Stop,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    State { state: SessionState },
    Transcript { text: String },
    Error { message: String },
}

impl From<SessionUpdate> for ServerEvent {
    fn from(update: SessionUpdate) -> Self {
        match update {
            SessionUpdate::State(state) => ServerEvent::State { state },
            SessionUpdate::Transcript(text) => ServerEvent::Transcript { text },
            SessionUpdate::Error(message) => ServerEvent::Error { message },
        }
    }
}

fn send_json<T: Serialize>(out: &mpsc::UnboundedSender<String>, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(text) => out.send(text).is_ok(),
        Err(e) => {
            warn!("Failed to encode live frame: {}", e);
            true
        }
    }
}

pub async fn live_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let updates = tokio::spawn(forward_updates(state.live.subscribe(), out_tx.clone()));
    send_json(
        &out_tx,
        &ServerEvent::State {
            state: state.live.state().await,
        },
    );
    info!("Live client connected");

    // Generation of the session this client started, with its capture input
    let mut owned: Option<(u64, RelayInput)> = None;
    let mut playback: Option<JoinHandle<()>> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(ClientCommand::Start { language }) => {
                    let language = match language {
                        Some(language) => language,
                        None => state.shell.read().await.language,
                    };
                    let (source, relay_input) = RelaySource::new();
                    let (sink, commands) = RelaySink::new();
                    match state.live.start(language, Box::new(source), Box::new(sink)).await {
                        Ok(generation) => {
                            owned = Some((generation, relay_input));
                            if let Some(previous) = playback.take() {
                                previous.abort();
                            }
                            playback = Some(tokio::spawn(forward_playback(commands, out_tx.clone())));
                        }
                        Err(e) => {
                            send_json(&out_tx, &ServerEvent::Error { message: e.to_string() });
                        }
                    }
                }
                Ok(ClientCommand::Stop) => {
                    if let Some((generation, _)) = owned.take() {
                        state.live.stop_if(generation).await;
                    }
                }
                Err(e) => {
                    debug!("Unrecognised live command: {}", e);
                    send_json(
                        &out_tx,
                        &ServerEvent::Error {
                            message: format!("Unrecognised command: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Binary(bytes)) => {
                if let Some((_, input)) = &owned {
                    if let Err(e) = input.push_bytes(&bytes) {
                        warn!("Dropping capture frame: {}", e);
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Live socket error: {}", e);
                break;
            }
        }
    }

    // The session dies with the client that started it
    if let Some((generation, _)) = owned {
        state.live.stop_if(generation).await;
    }
    if let Some(playback) = playback {
        playback.abort();
    }
    updates.abort();
    drop(out_tx);
    let _ = writer.await;
    info!("Live client disconnected");
}

async fn forward_updates(
    mut updates: broadcast::Receiver<SessionUpdate>,
    out: mpsc::UnboundedSender<String>,
) {
    loop {
        match updates.recv().await {
            Ok(update) => {
                if !send_json(&out, &ServerEvent::from(update)) {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Live client lagged, skipped {} updates", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn forward_playback(
    mut commands: mpsc::UnboundedReceiver<PlaybackCommand>,
    out: mpsc::UnboundedSender<String>,
) {
    while let Some(command) = commands.recv().await {
        if !send_json(&out, &command) {
            break;
        }
    }
}
