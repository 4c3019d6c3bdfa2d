#![forbid(unsafe_code)]

use std::time::Duration;

use tokio::net::UdpSocket;
use tracebus::networking::wire::parse_beacon;
use tracebus::{Tracer, TracerConfig};

#[tokio::test]
async fn announcer_advertises_the_bound_tcp_port() {
    let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest = listener.local_addr().unwrap();

    let cfg = TracerConfig {
        hostname: "host-a".into(),
        process_name: "beacon-test".into(),
        buffer_flush_interval_ms: 50,
        announce_interval_ms: 20,
        announce_iface: Some("127.0.0.1".into()),
        announce_mcast_addr: Some(dest.to_string()),
        flags: 0,
    };

    let tracer = Tracer::init(cfg).expect("init");

    let mut buf = [0u8; 512];
    let (n, _src) =
        tokio::time::timeout(Duration::from_secs(2), listener.recv_from(&mut buf)).await.unwrap().unwrap();

    let beacon = parse_beacon(&buf[..n]).expect("beacon parses");
    assert_eq!(beacon.host, "host-a");
    assert_eq!(beacon.process, "beacon-test");
    assert_eq!(beacon.port, tracer.tcp_port());

    tracer.finit();
}

#[tokio::test]
async fn absent_announce_iface_disables_beacons_without_failing_init() {
    let cfg = TracerConfig {
        hostname: "host-a".into(),
        process_name: "beacon-test".into(),
        buffer_flush_interval_ms: 50,
        announce_interval_ms: 20,
        announce_iface: None,
        announce_mcast_addr: Some("225.0.0.113:7645".into()),
        flags: 0,
    };

    let tracer = Tracer::init(cfg).expect("init still succeeds with announcements disabled");
    assert_ne!(tracer.tcp_port(), 0);
    tracer.finit();
}
