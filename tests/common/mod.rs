#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use port_scan_rs::config::ScanSettings;
use port_scan_rs::types::JobSnapshot;
use port_scan_rs::JobRegistry;

/// Registry with the real probe timeout but a near-zero throttle, so tests finish quickly.
pub fn fast_registry() -> Arc<JobRegistry> {
    Arc::new(JobRegistry::new(ScanSettings {
        probe_timeout: Duration::from_secs(1),
        probe_delay: Duration::from_millis(1),
    }))
}

/// Invariants every observed snapshot must satisfy.
pub fn assert_consistent(snap: &JobSnapshot) {
    assert_eq!(snap.results.len() as u64, snap.progress, "results/progress out of sync");
    assert!(snap.progress <= snap.total);
    assert_eq!(
        snap.stats.open + snap.stats.closed + snap.stats.errors,
        snap.stats.total_scanned
    );
    assert_eq!(snap.stats.total_scanned, snap.progress);
    for (i, r) in snap.results.iter().enumerate() {
        assert_eq!(u64::from(r.port), u64::from(snap.start_port) + i as u64, "results out of order");
    }
}

/// Poll until the job completes, checking invariants on every snapshot.
pub async fn wait_for_completion(registry: &JobRegistry, id: &str) -> JobSnapshot {
    let polled = tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            let snap = registry.get(id).await.expect("job exists");
            assert_consistent(&snap);
            if snap.completed {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    polled.expect("scan did not complete in time")
}

/// A loopback port that refused connections a moment ago.
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
