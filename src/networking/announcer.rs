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

//! Periodic UDP multicast discovery beacon.
//!
//! Disabled entirely when any of `announce_interval_ms == 0`,
//! `announce_iface` is absent, or `announce_mcast_addr` is absent — the
//! acceptor still runs in that mode, consumers just have to be told the
//! port out of band.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::monitoring::metrics::Metrics;
use crate::networking::wire;

/// Resolved announcer configuration. Construction of this type is the
/// "is announcing enabled at all" decision point.
pub struct AnnouncerConfig {
    /// Local address to bind the beacon socket to.
    pub bind_addr: SocketAddr,
    /// Destination multicast address for beacons.
    pub dest_addr: SocketAddr,
    /// Cadence between beacons.
    pub interval: Duration,
    /// Hostname advertised in the beacon.
    pub hostname: String,
    /// Process name advertised in the beacon.
    pub process_name: String,
}

/// Bind the announcer's UDP socket.
pub async fn bind(bind_addr: SocketAddr) -> std::io::Result<UdpSocket> {
    UdpSocket::bind(bind_addr).await
}

/// Run the announcer loop forever, sending one beacon per tick. A failed
/// send is logged and never propagated — the next beacon is attempted at
/// the next tick regardless.
pub async fn run(socket: &UdpSocket, cfg: &AnnouncerConfig, tcp_port: u16, metrics: &Arc<Metrics>) -> ! {
    let mut ticker = tokio::time::interval(cfg.interval);
    loop {
        ticker.tick().await;
        let payload = wire::encode_beacon(&cfg.hostname, &cfg.process_name, tcp_port);
        match socket.send_to(&payload, cfg.dest_addr).await {
            Ok(_) => {
                debug!(dest = %cfg.dest_addr, "beacon sent");
                metrics.beacons_sent_total.inc();
            }
            Err(e) => {
                warn!(err = %e, dest = %cfg.dest_addr, "beacon send failed, will retry next tick");
                metrics.beacons_failed_total.inc();
            }
        }
    }
}
