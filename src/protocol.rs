//! TCP protocol between the landmark estimator client and the posture server.
//!
//! Length-delimited frames, each carrying one bincode-encoded message.

use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::pipeline::UiEvent;
use crate::pose::{EstimatorOptions, LandmarkFrame};

// --- Message types ---

/// Estimator → Server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Landmarks for one video frame (`None` when nobody is in view).
    Landmarks(LandmarkFrame),
    TriggerCalibration,
    SetAudio { enabled: bool },
}

/// Server → Estimator
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Sent once on connect: detection/tracking settings for the estimator.
    Options(EstimatorOptions),
    Ui(UiEvent),
    Notify { text: String },
    CalibrationAck { ok: bool, reason: Option<String> },
    AudioState { enabled: bool },
}

// --- TCP codec helpers ---

/// Max size of one frame. 33 landmarks fit in well under 1KB.
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Wrap a byte stream with length-delimited framing.
pub fn message_stream<T: AsyncRead + AsyncWrite>(stream: T) -> Framed<T, LengthDelimitedCodec> {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

pub fn encode<T: Serialize>(msg: &T) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(bincode::serialize(msg)?))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T, S>(stream: &mut S, msg: &T) -> anyhow::Result<()>
where
    T: Serialize,
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
{
    stream.send(encode(msg)?).await?;
    Ok(())
}

/// Receive and deserialize a message. `Ok(None)` when the peer closed the connection.
pub async fn recv_message<T, S>(stream: &mut S) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<bytes::BytesMut, std::io::Error>> + Unpin,
{
    match stream.next().await {
        Some(Ok(bytes)) => Ok(Some(decode(&bytes)?)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}
