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

//! The lifetime of one accepted TCP connection to a consumer.
//!
//! A session is two cooperating duties racing each other: an inbound
//! command reader and an outbound record writer. Whichever ends first —
//! reader hits a malformed frame or EOF, writer hits a write error, or the
//! runtime is shutting down — ends the whole session. When it ends, every
//! enable bit in the registry is cleared and anything still queued is
//! discarded, so the next consumer starts from a clean slate.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::core::queue::QueueConsumer;
use crate::core::registry::Registry;
use crate::monitoring::metrics::Metrics;
use crate::networking::wire::{self, InboundCommand};

/// Maximum number of records drained into a single outbound batch.
const MAX_BATCH_RECORDS: usize = 256;

async fn run_reader<R: AsyncRead + Unpin>(mut reader: R, registry: Arc<Registry>) {
    loop {
        match wire::read_command(&mut reader).await {
            Ok(InboundCommand::Enable(name)) => {
                if let Ok(canonical) = crate::core::name::canonicalize(&name) {
                    registry.set_enabled_canonical(&canonical, true);
                }
            }
            Ok(InboundCommand::Disable(name)) => {
                if let Ok(canonical) = crate::core::name::canonicalize(&name) {
                    registry.set_enabled_canonical(&canonical, false);
                }
            }
            Err(e) => {
                debug!(err = %e, "session reader ending");
                return;
            }
        }
    }
}

async fn run_writer<W: AsyncWrite + Unpin>(
    mut writer: W,
    queue: &mut QueueConsumer,
    flush_interval: Duration,
    metrics: &Arc<Metrics>,
) {
    loop {
        let batch = queue.wait_and_drain(flush_interval, MAX_BATCH_RECORDS).await;
        for record in &batch {
            if let Err(e) = wire::write_record(&mut writer, &record.to_wire()).await {
                warn!(err = %e, "session writer ending");
                return;
            }
            metrics.records_sent_total.inc();
        }
    }
}

/// Run one consumer session to completion against `stream`.
///
/// `shutdown` is observed so that `finit` can end an in-progress session:
/// on a shutdown signal the writer gets `grace` to flush its current
/// batch, then the session ends regardless of whether it finished.
pub async fn run_session(
    stream: TcpStream,
    registry: Arc<Registry>,
    queue: &mut QueueConsumer,
    flush_interval: Duration,
    grace: Duration,
    shutdown: &mut watch::Receiver<bool>,
    metrics: Arc<Metrics>,
) {
    metrics.sessions_total.inc();
    metrics.sessions_active.inc();

    let (rd, wr) = stream.into_split();
    let reader_fut = run_reader(rd, registry.clone());
    let writer_fut = run_writer(wr, queue, flush_interval, &metrics);
    tokio::pin!(reader_fut, writer_fut);

    tokio::select! {
        _ = &mut reader_fut => {}
        _ = &mut writer_fut => {}
        res = shutdown.changed() => {
            if res.is_ok() && *shutdown.borrow() {
                debug!("shutdown requested mid-session, draining with grace period");
                let _ = tokio::time::timeout(grace, &mut writer_fut).await;
            }
        }
    }

    registry.clear_all_enabled();
    queue.discard_all();
    metrics.sessions_active.dec();
    metrics.queue_depth.set(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue;
    use crate::core::types::SubmissionRecord;
    use std::sync::atomic::AtomicU64;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (server, _) = listener.accept().await.unwrap();
        (server, client.await.unwrap())
    }

    #[tokio::test]
    async fn enable_command_flips_registry_bit() {
        let registry = Arc::new(Registry::new());
        registry.register("temp");
        let (server, mut client) = loopback_pair().await;

        let reg2 = registry.clone();
        let reader = tokio::spawn(async move {
            let (rd, _wr) = server.into_split();
            run_reader(rd, reg2).await;
        });

        wire::write_frame(&mut client, &InboundCommand::Enable("TEMP".into())).await.unwrap();
        drop(client);
        reader.await.unwrap();

        assert!(registry.is_enabled("temp"));
    }

    #[tokio::test]
    async fn writer_emits_queued_records_in_order() {
        let dropped = Arc::new(AtomicU64::new(0));
        let (producer, mut consumer) = queue::channel(dropped);
        producer.offer(SubmissionRecord { name: "t".into(), timestamp_ns: 1, payload: b"a".to_vec() });
        producer.offer(SubmissionRecord { name: "t".into(), timestamp_ns: 2, payload: b"b".to_vec() });

        let (server, mut client) = loopback_pair().await;
        let metrics = Arc::new(Metrics::new().unwrap());

        let writer = tokio::spawn(async move {
            let (_rd, wr) = server.into_split();
            // One flush tick is enough to drain both already-queued records.
            run_writer(wr, &mut consumer, Duration::from_millis(10), &metrics).await;
        });

        let mut got = Vec::new();
        for _ in 0..2 {
            let rec: crate::core::types::OutboundRecord = wire::read_frame(&mut client).await.unwrap();
            got.push(rec.payload);
        }
        writer.abort();
        assert_eq!(got, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
