//! Session controller: selection changes, teardown and rescans

use std::sync::Arc;
use std::time::Duration;

use droidlink_core::testing::ScriptedTransport;
use droidlink_core::{
    AppSettings, CommandEvent, FinishReason, HistoryKind, SessionController, SessionError,
    Transport,
};

use super::{DEVICES_AB, DEVICES_B, FakeShell, TELEMETRY_CPU, TELEMETRY_FREE, wait_until};

const INTERVAL: Duration = Duration::from_millis(50);

fn settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.monitoring = settings.monitoring.clone().with_interval(INTERVAL);
    settings.exec = settings
        .exec
        .clone()
        .with_poll_interval(Duration::from_millis(10));
    settings
}

fn setup(devices: &[&str]) -> (Arc<ScriptedTransport>, FakeShell, SessionController) {
    let t = ScriptedTransport::new().shared();
    t.respond_sequence("devices -l", devices);
    t.respond("top -n 1", TELEMETRY_CPU);
    t.respond("free -m", TELEMETRY_FREE);
    let shell = FakeShell::default();
    shell.install(&t);
    let controller = SessionController::new(Arc::clone(&t) as Arc<dyn Transport>, &settings());
    (t, shell, controller)
}

#[tokio::test]
async fn rescan_publishes_device_list() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    let mut devices_rx = c.subscribe_devices();

    let found = c.rescan().await;
    assert_eq!(found.len(), 2);
    assert!(devices_rx.has_changed().unwrap());
    let published = devices_rx.borrow_and_update().clone();
    assert_eq!(published[0].model, "Alpha");
    assert_eq!(published[1].id, "BBB222");
}

#[tokio::test]
async fn selecting_starts_telemetry_for_that_device() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();

    let mut snapshots = c.subscribe_snapshots();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(2),
        snapshots.wait_for(Option::is_some),
    )
    .await
    .unwrap()
    .unwrap()
    .clone()
    .unwrap();
    assert_eq!(snapshot.device_id, "AAA111");
    assert_eq!(snapshot.memory.total_mb, 3800);

    c.shutdown().await;
}

#[tokio::test]
async fn switching_devices_stops_polling_the_previous_one() {
    let (t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || t.count_matching("free -m") > 0).await);

    c.select("BBB222").await.unwrap();
    let calls_for_a = t.calls_for("AAA111").len();

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(t.calls_for("AAA111").len(), calls_for_a);
    assert!(t.calls_for("BBB222").iter().any(|c| c.command_line().contains("free -m")));
    assert_eq!(c.selected().as_deref(), Some("BBB222"));

    // a snapshot for A never follows the switch
    let snapshot = c.snapshot();
    assert!(snapshot.is_none_or(|s| s.device_id == "BBB222"));

    c.shutdown().await;
}

#[tokio::test]
async fn switching_devices_discards_the_running_command() {
    let (t, shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    c.execute("uptime").await.unwrap();

    let handle = c.start_command("logcat").await.unwrap();
    let pid = handle.pid();
    assert!(c.engine().has_session("AAA111"));

    c.select("BBB222").await.unwrap();
    assert!(!c.engine().has_session("AAA111"));
    assert!(!shell.is_alive(pid));
    assert!(
        t.calls_for("AAA111")
            .iter()
            .any(|call| call.command_line().starts_with("shell rm -f"))
    );
    assert!(c.history().is_empty());

    let events = tokio::time::timeout(Duration::from_secs(2), handle.collect())
        .await
        .unwrap();
    assert_eq!(
        events.last(),
        Some(&CommandEvent::Finished(FinishReason::Cancelled))
    );

    c.shutdown().await;
}

#[tokio::test]
async fn rescan_without_selected_device_deselects() {
    let (t, _shell, c) = setup(&[DEVICES_AB, DEVICES_B]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || c.snapshot().is_some()).await);

    let remaining = c.rescan().await;
    assert_eq!(remaining.len(), 1);
    assert!(c.selected().is_none());
    assert!(c.snapshot().is_none());

    let calls_for_a = t.calls_for("AAA111").len();
    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(t.calls_for("AAA111").len(), calls_for_a);
}

#[tokio::test]
async fn deselect_clears_device_state() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    c.execute("id").await.unwrap();
    c.list_directory("/sdcard").await;

    c.deselect().await;
    assert!(c.selected().is_none());
    assert!(c.history().is_empty());
    assert_eq!(c.current_path(), "/");
    assert!(c.listing().is_empty());
    assert!(matches!(
        c.execute("id").await,
        Err(SessionError::NoDeviceSelected)
    ));
}

#[tokio::test]
async fn history_tracks_commands_of_selected_device() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();

    c.execute("whoami").await.unwrap();
    let handle = c.start_command("logcat").await.unwrap();
    assert!(c.stop_command().await.unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(2), handle.collect()).await;

    let kinds: Vec<HistoryKind> = c.history().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![HistoryKind::Executed, HistoryKind::Started]);
    c.shutdown().await;
}

#[tokio::test]
async fn selection_changes_are_serialized() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;

    let c = Arc::new(c);
    let (a, b) = tokio::join!(c.select("AAA111"), c.select("BBB222"));
    a.unwrap();
    b.unwrap();

    let selected = c.selected().unwrap();
    tokio::time::sleep(INTERVAL * 2).await;
    let snapshot = c.snapshot();
    assert!(snapshot.is_none_or(|s| s.device_id == selected));
    c.shutdown().await;
}

#[tokio::test]
async fn rescan_during_a_device_switch_keeps_the_new_device() {
    let (t, _shell, c) = setup(&[DEVICES_AB, DEVICES_B]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    let _handle = c.start_command("logcat").await.unwrap();
    // tearing down A's command takes a while
    t.delay_matching("shell kill", Duration::from_millis(300));

    let (selected, found) = tokio::join!(c.select("BBB222"), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        c.rescan().await
    });
    selected.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "BBB222");
    assert_eq!(c.selected().as_deref(), Some("BBB222"));
    assert!(!c.engine().has_session("AAA111"));
    assert!(wait_until(Duration::from_secs(2), || {
        t.calls_for("BBB222").iter().any(|call| call.command_line().contains("free -m"))
    })
    .await);

    c.shutdown().await;
}

#[tokio::test]
async fn disconnecting_the_previous_device_during_a_switch_keeps_the_new_one() {
    let (t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();
    let _handle = c.start_command("logcat").await.unwrap();
    t.delay_matching("shell kill", Duration::from_millis(300));

    let (selected, disconnected) = tokio::join!(c.select("BBB222"), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        c.disconnect("AAA111").await
    });
    selected.unwrap();
    disconnected.unwrap();

    assert_eq!(c.selected().as_deref(), Some("BBB222"));
    assert_eq!(t.count_matching("disconnect AAA111"), 1);
    let devices = c.devices();
    assert!(devices.iter().any(|d| d.id == "AAA111" && !d.connected));

    c.shutdown().await;
}

#[tokio::test]
async fn disconnecting_the_selected_device_deselects_it() {
    let (_t, _shell, c) = setup(&[DEVICES_AB]);
    c.rescan().await;
    c.select("AAA111").await.unwrap();

    c.disconnect("AAA111").await.unwrap();
    assert!(c.selected().is_none());
    assert!(c.snapshot().is_none());
}
