//! Client for the streaming transcription bridge: a preamble announces the
//! session, audio chunks stream over the same connection, a stop control
//! message ends the utterance, and the bridge replies with `partial`/
//! `final`/`error` control events until it sends `final`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

use tg_domain::error::{Error, Result};

use crate::frame::{read_frame, write_frame, KIND_AUDIO, KIND_CONTROL};

/// How long to wait for the next control event before giving up on a stalled
/// transcription bridge.
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum TranscribeEvent {
    Partial(String),
    Final(String),
    Error(String),
}

#[derive(Serialize)]
struct StartControl<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    session_id: &'a str,
}

#[derive(Serialize)]
struct StopControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ServerControl {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    message: String,
}

pub struct TranscribeSession {
    stream: TcpStream,
}

impl TranscribeSession {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(Error::Io)?;
        Ok(Self { stream })
    }

    pub async fn start(&mut self, session_id: &str) -> Result<()> {
        let payload = serde_json::to_vec(&StartControl {
            kind: "start",
            session_id,
        })?;
        write_frame(&mut self.stream, KIND_CONTROL, &payload)
            .await
            .map_err(Error::Io)
    }

    pub async fn send_chunk(&mut self, pcm_or_wav_bytes: &[u8]) -> Result<()> {
        write_frame(&mut self.stream, KIND_AUDIO, pcm_or_wav_bytes)
            .await
            .map_err(Error::Io)
    }

    pub async fn stop(&mut self) -> Result<()> {
        let payload = serde_json::to_vec(&StopControl { kind: "stop" })?;
        write_frame(&mut self.stream, KIND_CONTROL, &payload)
            .await
            .map_err(Error::Io)
    }

    /// Reads one control frame and interprets it. Audio frames are never
    /// sent by the bridge, so any non-control frame is treated as a
    /// protocol error.
    pub async fn next_event(&mut self) -> Result<TranscribeEvent> {
        let (kind, payload) = tokio::time::timeout(EVENT_TIMEOUT, read_frame(&mut self.stream))
            .await
            .map_err(|_| Error::Timeout(format!("no event from transcription bridge after {EVENT_TIMEOUT:?}")))?
            .map_err(Error::Io)?;
        if kind != KIND_CONTROL {
            return Err(Error::Other(format!(
                "transcription bridge sent unexpected frame kind {kind}"
            )));
        }
        let control: ServerControl = serde_json::from_slice(&payload)?;
        match control.kind.as_str() {
            "partial" => Ok(TranscribeEvent::Partial(control.text)),
            "final" => Ok(TranscribeEvent::Final(control.text)),
            "error" => Ok(TranscribeEvent::Error(control.message)),
            other => Err(Error::Other(format!(
                "transcription bridge sent unknown event type \"{other}\""
            ))),
        }
    }
}

/// Runs the full preamble -> chunked audio -> stop -> drain-until-final
/// flow in one call, for the orchestrator's `/transcribe` endpoint.
/// `chunk_size` controls how the raw audio bytes are split across frames;
/// the bridge reassembles them itself, so any size is valid.
pub async fn transcribe(
    addr: &str,
    session_id: &str,
    audio_bytes: &[u8],
    chunk_size: usize,
) -> Result<String> {
    let mut session = TranscribeSession::connect(addr).await?;
    session.start(session_id).await?;

    for chunk in audio_bytes.chunks(chunk_size.max(1)) {
        session.send_chunk(chunk).await?;
    }
    session.stop().await?;

    loop {
        match session.next_event().await? {
            TranscribeEvent::Partial(_) => continue,
            TranscribeEvent::Final(text) => return Ok(text),
            TranscribeEvent::Error(message) => {
                return Err(Error::UpstreamRejected(format!(
                    "transcription failed: {message}"
                )))
            }
        }
    }
}
