use std::time::Duration;

use port_scan_rs::types::ProbeStatus;
use tokio::net::TcpListener;

mod common;
use common::{assert_consistent, closed_port, fast_registry, wait_for_completion};

async fn listener_in_middle() -> (TcpListener, u16) {
    loop {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        if port > 1 && port < 65535 {
            return (listener, port);
        }
    }
}

#[tokio::test]
async fn single_closed_port_completes() {
    let reg = fast_registry();
    let port = closed_port().await;
    let id = reg.start_scan("127.0.0.1", port as i64, port as i64).await.unwrap();

    let snap = wait_for_completion(&reg, &id).await;
    assert_eq!(snap.progress, 1);
    assert_eq!(snap.total, 1);
    assert_eq!(snap.results[0].status, ProbeStatus::Closed);
    assert_eq!(snap.stats.closed, 1);
    assert_eq!(snap.stats.open, 0);
    assert_eq!(snap.stats.errors, 0);
}

#[tokio::test]
async fn range_is_probed_in_ascending_order() {
    let reg = fast_registry();
    let (_listener, port) = listener_in_middle().await;
    let (start, end) = (port - 1, port + 1);
    let id = reg.start_scan("127.0.0.1", start as i64, end as i64).await.unwrap();

    let snap = wait_for_completion(&reg, &id).await;
    assert_eq!(snap.progress, 3);
    assert_eq!(snap.total, 3);
    let ports: Vec<u16> = snap.results.iter().map(|r| r.port).collect();
    assert_eq!(ports, vec![start, port, end]);
    assert_eq!(snap.results[1].status, ProbeStatus::Open);
    assert!(snap.stats.open >= 1);
}

#[tokio::test]
async fn completed_snapshot_is_stable() {
    let reg = fast_registry();
    let port = closed_port().await;
    let id = reg.start_scan("127.0.0.1", port as i64, port as i64).await.unwrap();

    let first = wait_for_completion(&reg, &id).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = reg.get(&id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_jobs_do_not_interfere() {
    let reg = fast_registry();
    let (_la, a) = listener_in_middle().await;
    let (_lb, b) = listener_in_middle().await;

    let ja = reg.start_scan("127.0.0.1", (a - 1) as i64, (a + 1) as i64).await.unwrap();
    let jb = reg.start_scan("127.0.0.1", (b - 1) as i64, (b + 1) as i64).await.unwrap();

    let sa = wait_for_completion(&reg, &ja).await;
    let sb = wait_for_completion(&reg, &jb).await;
    assert_eq!(sa.results.iter().map(|r| r.port).collect::<Vec<_>>(), vec![a - 1, a, a + 1]);
    assert_eq!(sb.results.iter().map(|r| r.port).collect::<Vec<_>>(), vec![b - 1, b, b + 1]);
    assert_eq!(sa.results[1].status, ProbeStatus::Open);
    assert_eq!(sb.results[1].status, ProbeStatus::Open);
}

#[tokio::test]
async fn removing_a_job_stops_its_runner() {
    let reg = fast_registry();
    let id = reg.start_scan("127.0.0.1", 1, 65535).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(reg.remove(&id).await);
    assert!(reg.get(&id).await.is_err());

    // The runner exits promptly, so shutdown does not wait on 65535 probes.
    tokio::time::timeout(Duration::from_secs(5), reg.shutdown())
        .await
        .expect("runner kept going after removal");
    assert!(reg.is_empty().await);
}

#[tokio::test]
async fn shutdown_abandons_running_jobs() {
    let reg = fast_registry();
    let id = reg.start_scan("127.0.0.1", 1, 65535).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    tokio::time::timeout(Duration::from_secs(5), reg.shutdown())
        .await
        .expect("shutdown did not finish");

    let snap = reg.get(&id).await.unwrap();
    assert_consistent(&snap);
    assert!(snap.completed);
    assert!(snap.progress < snap.total);
    assert!(reg.start_scan("127.0.0.1", 1, 2).await.is_err());
}

#[tokio::test]
async fn sweeper_evicts_completed_jobs() {
    let reg = fast_registry();
    let port = closed_port().await;
    let id = reg.start_scan("127.0.0.1", port as i64, port as i64).await.unwrap();
    wait_for_completion(&reg, &id).await;

    reg.spawn_sweeper(Duration::ZERO, Duration::from_millis(10));
    tokio::time::timeout(Duration::from_secs(5), async {
        while reg.contains(&id).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("completed job was never evicted");

    reg.shutdown().await;
}
