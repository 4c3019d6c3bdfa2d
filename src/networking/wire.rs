// Copyright (c) 2026
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame codec for the TCP data channel, and the UDP beacon's byte layout.
//!
//! Both directions of the TCP stream are length-delimited so neither side
//! ever has to guess where one frame ends and the next begins. The beacon
//! is not length-delimited (each UDP datagram is already a frame); it is a
//! small newline-delimited text record so that a non-Rust listener can
//! parse it without sharing this crate's wire types.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::codec::{self, CodecError};
use crate::core::types::OutboundRecord;

/// Hard cap on a single frame's encoded length, generous enough for a
/// full-size [`crate::core::types::SUBMIT_MAX`] payload plus a
/// [`crate::core::name::NAME_MAX`] name and bincode overhead.
pub const MAX_FRAME_LEN: usize = 4096;

/// Commands a consumer may send on the inbound half of a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InboundCommand {
    /// Enable the named tracepoint.
    Enable(String),
    /// Disable the named tracepoint.
    Disable(String),
}

/// Frame read/write errors. Any of these terminates the session.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying stream returned an I/O error.
    #[error("io error")]
    Io(#[from] std::io::Error),
    /// The frame's length prefix exceeded [`MAX_FRAME_LEN`].
    #[error("frame too large")]
    TooLarge,
    /// The stream ended before a complete frame arrived.
    #[error("connection closed mid-frame")]
    Eof,
    /// The frame body failed to decode.
    #[error("malformed frame")]
    Malformed(#[from] CodecError),
}

/// Write one length-prefixed frame: a `u32` big-endian byte length followed
/// by the encoded body.
pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, value: &T) -> Result<(), FrameError> {
    let bytes = codec::encode_frame(value)?;
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge);
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(&bytes).await?;
    Ok(())
}

/// Read one length-prefixed frame and decode it as `T`.
pub async fn read_frame<R: AsyncRead + Unpin, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<T, FrameError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(FrameError::Eof),
        Err(e) => return Err(FrameError::Io(e)),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge);
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Eof
        } else {
            FrameError::Io(e)
        }
    })?;

    Ok(codec::decode_frame_limited(&body, MAX_FRAME_LEN)?)
}

/// Write an outbound submission record frame.
pub async fn write_record<W: AsyncWrite + Unpin>(writer: &mut W, record: &OutboundRecord) -> Result<(), FrameError> {
    write_frame(writer, record).await
}

/// Read one inbound command frame.
pub async fn read_command<R: AsyncRead + Unpin>(reader: &mut R) -> Result<InboundCommand, FrameError> {
    read_frame(reader).await
}

const BEACON_MAGIC: &str = "TRACEBUS1";

/// Encode a discovery beacon datagram.
pub fn encode_beacon(host: &str, process: &str, port: u16) -> Vec<u8> {
    format!("{BEACON_MAGIC}\nhost={host}\nprocess={process}\nport={port}\n").into_bytes()
}

/// A parsed beacon, for consumer-side tooling and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    /// Advertised hostname.
    pub host: String,
    /// Advertised process name.
    pub process: String,
    /// Advertised TCP listen port.
    pub port: u16,
}

/// Beacon parsing error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BeaconError {
    /// Missing or mismatched magic line.
    #[error("bad beacon magic")]
    BadMagic,
    /// A required field was missing or malformed.
    #[error("malformed beacon field")]
    MalformedField,
}

/// Parse a beacon datagram produced by [`encode_beacon`].
pub fn parse_beacon(bytes: &[u8]) -> Result<Beacon, BeaconError> {
    let text = std::str::from_utf8(bytes).map_err(|_| BeaconError::MalformedField)?;
    let mut lines = text.lines();

    if lines.next() != Some(BEACON_MAGIC) {
        return Err(BeaconError::BadMagic);
    }

    let mut host = None;
    let mut process = None;
    let mut port = None;

    for line in lines {
        if let Some(v) = line.strip_prefix("host=") {
            host = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("process=") {
            process = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("port=") {
            port = v.parse::<u16>().ok();
        }
    }

    Ok(Beacon {
        host: host.ok_or(BeaconError::MalformedField)?,
        process: process.ok_or(BeaconError::MalformedField)?,
        port: port.ok_or(BeaconError::MalformedField)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_round_trips() {
        let bytes = encode_beacon("host-a", "proc", 4242);
        let parsed = parse_beacon(&bytes).unwrap();
        assert_eq!(parsed, Beacon { host: "host-a".into(), process: "proc".into(), port: 4242 });
    }

    #[test]
    fn beacon_rejects_bad_magic() {
        let err = parse_beacon(b"NOTTRACEBUS\nhost=a\nprocess=b\nport=1\n").unwrap_err();
        assert_eq!(err, BeaconError::BadMagic);
    }

    #[test]
    fn beacon_rejects_missing_field() {
        let err = parse_beacon(b"TRACEBUS1\nhost=a\nprocess=b\n").unwrap_err();
        assert_eq!(err, BeaconError::MalformedField);
    }

    #[tokio::test]
    async fn frame_round_trips_over_a_duplex_pipe() {
        let (mut a, mut b) = tokio::io::duplex(8192);
        let cmd = InboundCommand::Enable("temp".into());
        write_frame(&mut a, &cmd).await.unwrap();
        let got: InboundCommand = read_frame(&mut b).await.unwrap();
        assert_eq!(cmd, got);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_on_write() {
        let (mut a, _b) = tokio::io::duplex(8192);
        let huge = InboundCommand::Enable("a".repeat(MAX_FRAME_LEN));
        let err = write_frame(&mut a, &huge).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge));
    }

    #[tokio::test]
    async fn eof_mid_frame_is_reported() {
        let (mut a, mut b) = tokio::io::duplex(8192);
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"short").await.unwrap();
        drop(a);
        let err = read_frame::<_, InboundCommand>(&mut b).await.unwrap_err();
        assert!(matches!(err, FrameError::Eof));
    }
}
