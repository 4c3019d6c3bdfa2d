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

//! Shared data types: the submission record and its wire projection.

use serde::{Deserialize, Serialize};

/// Maximum payload size, in bytes, accepted by `submit`.
///
/// The original C header defines this via a malformed preprocessor macro
/// (`#define TRACY_MAX_SUBMIT_LEN = 2048`, an assignment rather than a
/// replacement, which is almost certainly a source defect rather than an
/// intentional `= 2048` token in the expansion). `2048` is treated as the
/// authoritative limit regardless.
pub const SUBMIT_MAX: usize = 2048;

/// A submission record as it exists between `submit` and the session
/// writer: canonical name, nanosecond timestamp, and an owned copy of the
/// caller's payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// Canonical tracepoint name.
    pub name: String,
    /// Nanoseconds since the UNIX epoch, captured at submit time.
    pub timestamp_ns: u64,
    /// Owned copy of the submitted payload. At most [`SUBMIT_MAX`] bytes.
    pub payload: Vec<u8>,
}

impl SubmissionRecord {
    /// Total heap bytes retained by this record, used for the queue's
    /// byte-budget accounting.
    pub fn heap_len(&self) -> usize {
        self.name.len() + self.payload.len()
    }

    /// Project this record into its wire form.
    pub fn to_wire(&self) -> OutboundRecord {
        OutboundRecord {
            name: self.name.clone(),
            timestamp_ns: self.timestamp_ns,
            payload: self.payload.clone(),
        }
    }
}

/// Wire-level projection of a [`SubmissionRecord`], encoded with the
/// canonical bincode discipline in [`crate::core::codec`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboundRecord {
    /// Canonical tracepoint name.
    pub name: String,
    /// Nanoseconds since the UNIX epoch.
    pub timestamp_ns: u64,
    /// Payload bytes, opaque to the runtime.
    pub payload: Vec<u8>,
}
