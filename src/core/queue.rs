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

//! Bounded FIFO submission queue between submitting callers and the session
//! writer.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::core::types::SubmissionRecord;

/// Recommended record-count bound (spec: "≥ 1024 records").
pub const QUEUE_CAPACITY: usize = 1024;
/// Recommended byte bound (spec: "~1 MiB of payload, whichever binds
/// first"). Enforced alongside `QUEUE_CAPACITY`, not instead of it.
pub const QUEUE_MAX_BYTES: usize = 1024 * 1024;
/// Fraction of `QUEUE_CAPACITY` at which the writer is woken early instead
/// of waiting for the next flush tick.
const WATERMARK_NUM: usize = 3;
const WATERMARK_DEN: usize = 4;

/// Producer handle: cheaply cloned, used by any caller thread via
/// `submit`.
#[derive(Clone)]
pub struct QueueProducer {
    sender: mpsc::Sender<SubmissionRecord>,
    queued_bytes: Arc<AtomicUsize>,
    queued_len: Arc<AtomicUsize>,
    dropped_count: Arc<AtomicU64>,
    watermark: Arc<Notify>,
}

/// Consumer half, owned exclusively by the session writer. Not `Clone`:
/// the spec guarantees at most one consumer session at a time, so there is
/// never a reason for two readers to exist.
pub struct QueueConsumer {
    receiver: mpsc::Receiver<SubmissionRecord>,
    queued_bytes: Arc<AtomicUsize>,
    queued_len: Arc<AtomicUsize>,
    watermark: Arc<Notify>,
}

/// Construct a producer/consumer pair sharing one bounded channel and one
/// `dropped_count` counter.
pub fn channel(dropped_count: Arc<AtomicU64>) -> (QueueProducer, QueueConsumer) {
    let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
    let queued_bytes = Arc::new(AtomicUsize::new(0));
    let queued_len = Arc::new(AtomicUsize::new(0));
    let watermark = Arc::new(Notify::new());
    (
        QueueProducer {
            sender,
            queued_bytes: queued_bytes.clone(),
            queued_len: queued_len.clone(),
            dropped_count,
            watermark: watermark.clone(),
        },
        QueueConsumer { receiver, queued_bytes, queued_len, watermark },
    )
}

impl QueueProducer {
    /// Offer a record to the queue. Non-blocking: rejects (and counts a
    /// drop) when the record-count bound, the byte-budget bound, or the
    /// channel itself is full.
    pub fn offer(&self, record: SubmissionRecord) -> bool {
        let len = record.heap_len();
        let prev_bytes = self.queued_bytes.fetch_add(len, Ordering::AcqRel);
        if prev_bytes + len > QUEUE_MAX_BYTES {
            self.queued_bytes.fetch_sub(len, Ordering::AcqRel);
            self.dropped_count.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match self.sender.try_send(record) {
            Ok(()) => {
                let prev_len = self.queued_len.fetch_add(1, Ordering::AcqRel);
                if (prev_len + 1) * WATERMARK_DEN >= QUEUE_CAPACITY * WATERMARK_NUM {
                    self.watermark.notify_one();
                }
                true
            }
            Err(_) => {
                self.queued_bytes.fetch_sub(len, Ordering::AcqRel);
                self.dropped_count.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Current queue depth, in records, for metrics.
    pub fn depth(&self) -> usize {
        self.queued_len.load(Ordering::Relaxed)
    }
}

impl QueueConsumer {
    /// Wait until either the watermark fires or `deadline` elapses, then
    /// drain whatever is currently buffered (non-blocking), up to
    /// `max_records`.
    pub async fn wait_and_drain(&mut self, deadline: tokio::time::Duration, max_records: usize) -> Vec<SubmissionRecord> {
        tokio::select! {
            _ = self.watermark.notified() => {}
            _ = tokio::time::sleep(deadline) => {}
        }
        self.drain_available(max_records)
    }

    /// Drain whatever is currently buffered, without waiting, up to
    /// `max_records`.
    pub fn drain_available(&mut self, max_records: usize) -> Vec<SubmissionRecord> {
        let mut out = Vec::new();
        while out.len() < max_records {
            match self.receiver.try_recv() {
                Ok(record) => {
                    self.queued_bytes.fetch_sub(record.heap_len(), Ordering::AcqRel);
                    self.queued_len.fetch_sub(1, Ordering::AcqRel);
                    out.push(record);
                }
                Err(_) => break,
            }
        }
        out
    }

    /// Discard everything currently buffered without returning it. Used
    /// when a consumer session ends.
    pub fn discard_all(&mut self) {
        let _ = self.drain_available(usize::MAX);
    }
}
