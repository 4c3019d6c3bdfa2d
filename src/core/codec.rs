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

//! Canonical wire encoding shared by outbound records and inbound commands.
//!
//! Same discipline as a deterministic bincode codec: fixed-width integers
//! and no trailing-byte tolerance, plus a hard size cap on the decode side
//! so a malicious or buggy peer can never force an unbounded allocation.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Canonical frame (de)serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to serialize a value into its wire form.
    #[error("frame serialization failed")]
    Encode,
    /// Failed to decode bytes into the expected type.
    #[error("frame decoding failed")]
    Decode,
    /// The encoded or raw byte length exceeded the configured cap.
    #[error("frame exceeds size limit")]
    TooLarge,
}

fn bincode_opts() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode `value` into its canonical wire bytes.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts().serialize(value).map_err(|_| CodecError::Encode)
}

/// Decode `bytes` into `T`, rejecting anything over `max` bytes before
/// attempting to decode.
pub fn decode_frame_limited<T: DeserializeOwned>(bytes: &[u8], max: usize) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn round_trips() {
        let s = Sample { a: 7, b: "hello".into() };
        let bytes = encode_frame(&s).unwrap();
        let back: Sample = decode_frame_limited(&bytes, 4096).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn rejects_oversized_input() {
        let s = Sample { a: 7, b: "hello world this is long".into() };
        let bytes = encode_frame(&s).unwrap();
        let err = decode_frame_limited::<Sample>(&bytes, 4).unwrap_err();
        assert!(matches!(err, CodecError::TooLarge));
    }

    #[test]
    fn rejects_garbage() {
        let garbage = vec![0xffu8; 16];
        let err = decode_frame_limited::<Sample>(&garbage, 4096).unwrap_err();
        assert!(matches!(err, CodecError::Decode));
    }
}
