use std::time::Duration;

use port_scan_rs::prober::probe;
use port_scan_rs::types::ProbeStatus;
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn listening_port_is_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let r = probe("127.0.0.1", port, Duration::from_secs(1)).await;
    assert_eq!(r.port, port);
    assert_eq!(r.status, ProbeStatus::Open);
    assert_eq!(r.message, format!("Port {port} is open"));
}

#[tokio::test]
async fn refused_port_is_closed() {
    let port = common::closed_port().await;

    let r = probe("127.0.0.1", port, Duration::from_secs(1)).await;
    assert_eq!(r.status, ProbeStatus::Closed);
    assert_eq!(r.message, format!("Port {port} is closed"));
}

#[tokio::test]
async fn unresolvable_host_is_an_error_not_a_panic() {
    let r = probe("no-such-host.invalid", 80, Duration::from_secs(1)).await;
    assert_eq!(r.status, ProbeStatus::Error);
    assert!(r.message.starts_with("Couldn't connect to no-such-host.invalid:80 - "));
}
