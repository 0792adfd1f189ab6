//! Telemetry poll loop lifecycle

use std::sync::Arc;
use std::time::Duration;

use droidlink_core::models::NetworkKind;
use droidlink_core::testing::ScriptedTransport;
use droidlink_core::{MonitoringSettings, Transport, start_poller};
use tokio::sync::watch;

use super::{TELEMETRY_CPU, TELEMETRY_FREE, wait_until};

const INTERVAL: Duration = Duration::from_millis(50);

fn telemetry_transport() -> Arc<ScriptedTransport> {
    let t = ScriptedTransport::new().shared();
    t.respond("top -n 1", TELEMETRY_CPU);
    t.respond("free -m", TELEMETRY_FREE);
    t.respond("battery/capacity", "64");
    t.respond("battery/status", "Discharging");
    t.respond("ifconfig wlan0", "inet addr:192.168.0.17  Mask:255.255.255.0");
    t
}

fn settings() -> MonitoringSettings {
    MonitoringSettings::default().with_interval(INTERVAL)
}

#[tokio::test]
async fn publishes_consolidated_snapshots() {
    let t = telemetry_transport();
    let (_selection_tx, selection_rx) = watch::channel(Some("AAA".to_string()));
    let (snap_tx, mut snap_rx) = watch::channel(None);

    let handle = start_poller(
        Arc::clone(&t) as Arc<dyn Transport>,
        "AAA",
        &settings(),
        selection_rx,
        snap_tx,
    );

    tokio::time::timeout(Duration::from_secs(2), snap_rx.changed())
        .await
        .unwrap()
        .unwrap();
    let snapshot = snap_rx.borrow_and_update().clone().unwrap();
    assert_eq!(snapshot.device_id, "AAA");
    assert!((snapshot.cpu_percent - 15.0).abs() < f32::EPSILON);
    assert_eq!(snapshot.memory.total_mb, 3800);
    assert_eq!(snapshot.memory.used_mb, 1900);
    assert_eq!(snapshot.battery.percent, 64);
    assert!(!snapshot.battery.charging);
    assert_eq!(snapshot.network.kind, NetworkKind::Wifi);

    // a second tick replaces the value
    tokio::time::timeout(Duration::from_secs(2), snap_rx.changed())
        .await
        .unwrap()
        .unwrap();
    let second = snap_rx.borrow().clone().unwrap();
    assert!(second.captured_at >= snapshot.captured_at);

    handle.stop().await;
}

#[tokio::test]
async fn exits_within_an_interval_after_selection_moves() {
    let t = telemetry_transport();
    let (selection_tx, selection_rx) = watch::channel(Some("AAA".to_string()));
    let (snap_tx, _snap_rx) = watch::channel(None);

    let handle = start_poller(
        Arc::clone(&t) as Arc<dyn Transport>,
        "AAA",
        &settings(),
        selection_rx,
        snap_tx,
    );
    assert!(wait_until(Duration::from_secs(2), || !t.calls_for("AAA").is_empty()).await);

    selection_tx.send_replace(Some("BBB".to_string()));
    assert!(wait_until(INTERVAL * 2, || handle.is_finished()).await);

    let calls = t.calls_for("AAA").len();
    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(t.calls_for("AAA").len(), calls);
}

#[tokio::test]
async fn stop_waits_for_the_loop() {
    let t = ScriptedTransport::new()
        .with_latency(Duration::from_millis(20))
        .shared();
    let (_selection_tx, selection_rx) = watch::channel(Some("AAA".to_string()));
    let (snap_tx, _snap_rx) = watch::channel(None);

    let handle = start_poller(
        Arc::clone(&t) as Arc<dyn Transport>,
        "AAA",
        &settings(),
        selection_rx,
        snap_tx,
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.stop().await;

    let calls = t.call_count();
    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(t.call_count(), calls);
}

#[tokio::test]
async fn closed_selection_channel_ends_the_loop() {
    let t = telemetry_transport();
    let (selection_tx, selection_rx) = watch::channel(Some("AAA".to_string()));
    let (snap_tx, _snap_rx) = watch::channel(None);

    let handle = start_poller(
        Arc::clone(&t) as Arc<dyn Transport>,
        "AAA",
        &settings(),
        selection_rx,
        snap_tx,
    );
    assert!(wait_until(Duration::from_secs(2), || t.call_count() > 0).await);
    drop(selection_tx);
    assert!(wait_until(INTERVAL * 4, || handle.is_finished()).await);
}
