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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! The runtime supervisor: configuration, the [`Tracer`] handle, and its
//! lifecycle.
//!
//! This crate has no C ABI in scope, so the spec's "opaque handle with
//! explicit null checks" contract is expressed in the type system instead:
//! there is no null handle (`init` returns `Option<Tracer>`), and `finit`
//! consumes `self` by value, so double-`finit` and use-after-`finit` are
//! compile errors rather than runtime contracts the caller must honor.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::core::name::canonicalize;
use crate::core::queue::{self, QueueConsumer, QueueProducer};
use crate::core::registry::Registry;
use crate::core::types::{SubmissionRecord, SUBMIT_MAX};
use crate::monitoring::metrics::Metrics;
use crate::networking::announcer::{self, AnnouncerConfig};
use crate::networking::{acceptor, session};

/// Configuration snapshot captured at [`Tracer::init`] time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracerConfig {
    /// Advertised in the discovery beacon.
    pub hostname: String,
    /// Advertised in the discovery beacon.
    pub process_name: String,
    /// Outbound writer cadence, in milliseconds.
    pub buffer_flush_interval_ms: u32,
    /// Beacon cadence, in milliseconds. `0` disables announcements.
    pub announce_interval_ms: u32,
    /// Local interface address to bind the beacon socket to. `None`
    /// disables announcements.
    #[serde(default)]
    pub announce_iface: Option<String>,
    /// Destination multicast address for beacons. `None` disables
    /// announcements.
    #[serde(default)]
    pub announce_mcast_addr: Option<String>,
    /// Reserved for future extension; must be `0`.
    #[serde(default)]
    pub flags: i32,
}

impl TracerConfig {
    /// Parse a configuration snapshot from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, TracerConfigError> {
        toml::from_str(raw).map_err(|_| TracerConfigError::Parse)
    }

    /// Parse a configuration snapshot from a TOML file on disk.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, TracerConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| TracerConfigError::Read)?;
        Self::from_toml_str(&raw)
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum TracerConfigError {
    /// Could not read the configuration file.
    #[error("could not read configuration file")]
    Read,
    /// Could not parse the configuration document.
    #[error("could not parse configuration")]
    Parse,
}

/// Worker-side `init` failure reasons, surfaced only through logging — the
/// public API returns `None` either way, matching `tracy_init` returning
/// `NULL`. Rejections decided on the caller's thread before the worker
/// spawns (empty identity, reserved flags, thread/runtime spawn failure)
/// are logged inline and have no variant here, since there is no worker to
/// report them back through `ready_rx`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TracerInitError {
    /// The worker's Tokio runtime could not be built.
    #[error("failed to build worker runtime")]
    WorkerRuntime,
    /// The TCP listening socket could not be bound.
    #[error("failed to bind tcp listener")]
    Bind,
}

/// A live tracer runtime. Returned by [`Tracer::init`]; consumed by
/// [`Tracer::finit`].
pub struct Tracer {
    registry: Arc<Registry>,
    producer: QueueProducer,
    dropped_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
    config: TracerConfig,
    shutdown_tx: watch::Sender<bool>,
    thread_handle: Mutex<Option<std::thread::JoinHandle<()>>>,
    tcp_port: u16,
}

impl Tracer {
    /// Start the tracer runtime: validate `config`, bind sockets, and spawn
    /// the single background worker thread. Blocks until the worker has
    /// bound its sockets (or failed to).
    ///
    /// Returns `None` if `hostname`/`process_name` are empty, `flags` is
    /// non-zero, or startup otherwise fails; any partial startup is undone
    /// before returning.
    pub fn init(config: TracerConfig) -> Option<Tracer> {
        if config.hostname.trim().is_empty() || config.process_name.trim().is_empty() {
            warn!("tracer init rejected: hostname and process_name are mandatory");
            return None;
        }
        if config.flags != 0 {
            warn!(flags = config.flags, "tracer init rejected: flags must be 0");
            return None;
        }

        let metrics = match Metrics::new() {
            Ok(m) => Arc::new(m),
            Err(_) => {
                warn!("tracer init rejected: metrics initialization failed");
                return None;
            }
        };

        let dropped_count = Arc::new(AtomicU64::new(0));
        let registry = Arc::new(Registry::new());
        let (producer, consumer) = queue::channel(dropped_count.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<u16, TracerInitError>>();

        let announce_cfg = resolve_announcer_config(&config);
        let flush_interval = Duration::from_millis(config.buffer_flush_interval_ms.max(1) as u64);
        let grace = flush_interval;

        let worker_registry = registry.clone();
        let worker_metrics = metrics.clone();

        let spawned = std::thread::Builder::new().name("tracer-worker".into()).spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(_) => {
                    let _ = ready_tx.send(Err(TracerInitError::WorkerRuntime));
                    return;
                }
            };
            rt.block_on(supervisor_main(
                worker_registry,
                consumer,
                worker_metrics,
                announce_cfg,
                flush_interval,
                grace,
                shutdown_rx,
                ready_tx,
            ));
        });

        let thread_handle = match spawned {
            Ok(h) => h,
            Err(_) => {
                warn!("tracer init rejected: failed to spawn worker thread");
                return None;
            }
        };

        match ready_rx.recv() {
            Ok(Ok(port)) => {
                info!(port, "tracer runtime started");
                Some(Tracer {
                    registry,
                    producer,
                    dropped_count,
                    metrics,
                    config,
                    shutdown_tx,
                    thread_handle: Mutex::new(Some(thread_handle)),
                    tcp_port: port,
                })
            }
            Ok(Err(e)) => {
                warn!(err = %e, "tracer init rejected: worker startup failed");
                let _ = shutdown_tx.send(true);
                let _ = thread_handle.join();
                None
            }
            Err(_) => {
                warn!("tracer init rejected: worker thread ended before reporting readiness");
                let _ = thread_handle.join();
                None
            }
        }
    }

    /// Register a tracepoint. Idempotent. Returns `0` on success, a
    /// negative number if `name` fails canonicalization.
    pub fn register(&self, name: &str) -> i32 {
        let rc = self.registry.register(name);
        self.metrics.tracepoints_registered.set(self.registry.len() as i64);
        rc
    }

    /// Whether `name` is currently enabled by the connected consumer.
    /// Unregistered or invalid names report `false`.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.registry.is_enabled(name)
    }

    /// Submit a payload to a tracepoint. Non-blocking, never performs I/O.
    ///
    /// Executes the shortest path and returns silently when: `data` is
    /// empty; `data` exceeds [`SUBMIT_MAX`]; `name` fails canonicalization;
    /// the tracepoint is unregistered or not enabled; or the queue is full
    /// (in which case the drop is counted). Only once all of those gates
    /// pass is the timestamp captured, the payload copied, and the record
    /// enqueued.
    pub fn submit(&self, name: &str, data: &[u8]) {
        if data.is_empty() || data.len() > SUBMIT_MAX {
            return;
        }
        let canonical = match canonicalize(name) {
            Ok(c) => c,
            Err(_) => return,
        };
        // A single lookup answers both "registered?" and "enabled?": an
        // unregistered name and a disabled one are indistinguishable to a
        // submitting caller, and both silently drop.
        if !self.registry.is_enabled_canonical(&canonical) {
            return;
        }

        let record = SubmissionRecord { name: canonical, timestamp_ns: now_ns(), payload: data.to_vec() };
        if self.producer.offer(record) {
            self.metrics.queue_depth.set(self.producer.depth() as i64);
        } else {
            self.metrics.submissions_dropped_total.inc();
        }
    }

    /// Number of submissions dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// The OS-assigned TCP port consumers connect to.
    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    /// Prometheus metrics for this runtime.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The configuration snapshot this runtime was started with.
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Tear down the runtime: signal shutdown, let an in-progress session
    /// drain within its grace period, stop the acceptor and announcer, and
    /// join the worker thread. Consumes `self`, so a caller cannot
    /// double-`finit` or use the handle afterwards — the compiler forbids
    /// it.
    pub fn finit(self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.thread_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

fn resolve_announcer_config(config: &TracerConfig) -> Option<AnnouncerConfig> {
    if config.announce_interval_ms == 0 {
        return None;
    }
    let iface = config.announce_iface.as_ref()?;
    let mcast = config.announce_mcast_addr.as_ref()?;

    let dest_addr: SocketAddr = match mcast.parse() {
        Ok(a) => a,
        Err(_) => {
            warn!(addr = %mcast, "invalid announce_mcast_addr; disabling announcements");
            return None;
        }
    };
    let bind_ip: IpAddr = match iface.parse() {
        Ok(ip) => ip,
        Err(_) => {
            warn!(iface = %iface, "invalid announce_iface; disabling announcements");
            return None;
        }
    };

    Some(AnnouncerConfig {
        bind_addr: SocketAddr::new(bind_ip, 0),
        dest_addr,
        interval: Duration::from_millis(config.announce_interval_ms as u64),
        hostname: config.hostname.clone(),
        process_name: config.process_name.clone(),
    })
}

async fn supervisor_main(
    registry: Arc<Registry>,
    mut consumer: QueueConsumer,
    metrics: Arc<Metrics>,
    announce_cfg: Option<AnnouncerConfig>,
    flush_interval: Duration,
    grace: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    ready_tx: std::sync::mpsc::Sender<Result<u16, TracerInitError>>,
) {
    let listener = match acceptor::bind("0.0.0.0".parse().expect("valid ip literal")).await {
        Ok(l) => l,
        Err(e) => {
            warn!(err = %e, "tcp bind failed");
            let _ = ready_tx.send(Err(TracerInitError::Bind));
            return;
        }
    };
    let port = listener.local_addr().expect("bound listener has a local addr").port();

    let announce_socket = match &announce_cfg {
        Some(cfg) => match announcer::bind(cfg.bind_addr).await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(err = %e, "announce socket bind failed; continuing without announcements");
                None
            }
        },
        None => None,
    };

    // Sockets are bound; report readiness to the blocked `init` caller.
    let _ = ready_tx.send(Ok(port));

    let announce_task = match (announce_socket, announce_cfg) {
        (Some(socket), Some(cfg)) => {
            let metrics = metrics.clone();
            Some(tokio::spawn(async move {
                announcer::run(&socket, &cfg, port, &metrics).await;
            }))
        }
        _ => None,
    };

    info!(port, "tracer runtime accepting connections");

    loop {
        // `run_session` below observes the same `shutdown_rx` and consumes
        // its `changed()` notification as part of ending an in-progress
        // session, so that notification is not available to fire this
        // loop's own `shutdown_rx.changed()` a second time. Check the
        // latched value directly before blocking on it again.
        if *shutdown_rx.borrow_and_update() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            accept_res = acceptor::accept_one(&listener) => {
                match accept_res {
                    Ok((stream, peer)) => {
                        info!(%peer, "consumer connected");
                        session::run_session(
                            stream,
                            registry.clone(),
                            &mut consumer,
                            flush_interval,
                            grace,
                            &mut shutdown_rx,
                            metrics.clone(),
                        )
                        .await;
                        info!("consumer session ended");
                    }
                    Err(e) => warn!(err = %e, "accept failed"),
                }
            }
        }
    }

    if let Some(task) = announce_task {
        task.abort();
    }
}

fn now_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}
