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

use prometheus::{IntCounter, IntGauge, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration with the Prometheus registry failed.
    #[error("prometheus registration failed")]
    Prom,
}

/// Runtime health metrics. One instance per [`crate::runtime::Tracer`].
#[derive(Clone)]
pub struct Metrics {
    /// Registry these metrics are registered with.
    pub registry: Registry,

    /// Submissions dropped because the queue was full.
    pub submissions_dropped_total: IntCounter,
    /// Current submission queue depth, in records.
    pub queue_depth: IntGauge,
    /// Tracepoints currently registered.
    pub tracepoints_registered: IntGauge,

    /// Consumer sessions accepted over the lifetime of the runtime.
    pub sessions_total: IntCounter,
    /// Consumer sessions currently connected (0 or 1).
    pub sessions_active: IntGauge,
    /// Outbound records successfully written to a consumer.
    pub records_sent_total: IntCounter,

    /// Beacons successfully sent.
    pub beacons_sent_total: IntCounter,
    /// Beacons that failed to send.
    pub beacons_failed_total: IntCounter,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let submissions_dropped_total =
            IntCounter::new("tracebus_submissions_dropped_total", "Submissions dropped due to a full queue")
                .map_err(|_| MetricsError::Prom)?;
        let queue_depth = IntGauge::new("tracebus_queue_depth", "Current submission queue depth")
            .map_err(|_| MetricsError::Prom)?;
        let tracepoints_registered =
            IntGauge::new("tracebus_tracepoints_registered", "Registered tracepoint count")
                .map_err(|_| MetricsError::Prom)?;

        let sessions_total = IntCounter::new("tracebus_sessions_total", "Consumer sessions accepted")
            .map_err(|_| MetricsError::Prom)?;
        let sessions_active = IntGauge::new("tracebus_sessions_active", "Consumer sessions currently connected")
            .map_err(|_| MetricsError::Prom)?;
        let records_sent_total = IntCounter::new("tracebus_records_sent_total", "Outbound records written")
            .map_err(|_| MetricsError::Prom)?;

        let beacons_sent_total = IntCounter::new("tracebus_beacons_sent_total", "Discovery beacons sent")
            .map_err(|_| MetricsError::Prom)?;
        let beacons_failed_total = IntCounter::new("tracebus_beacons_failed_total", "Discovery beacons that failed to send")
            .map_err(|_| MetricsError::Prom)?;

        registry.register(Box::new(submissions_dropped_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(queue_depth.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(tracepoints_registered.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(sessions_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(sessions_active.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(records_sent_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(beacons_sent_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(beacons_failed_total.clone())).map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            submissions_dropped_total,
            queue_depth,
            tracepoints_registered,
            sessions_total,
            sessions_active,
            records_sent_total,
            beacons_sent_total,
            beacons_failed_total,
        })
    }

    /// Render the current metric values in Prometheus text exposition
    /// format, for embedders that want to splice this into their own
    /// `/metrics` endpoint rather than have this crate own an HTTP server.
    pub fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        // Encoding a Vec<u8> buffer cannot fail.
        encoder.encode(&families, &mut buf).expect("prometheus text encoding");
        String::from_utf8(buf).expect("prometheus output is valid utf-8")
    }
}
