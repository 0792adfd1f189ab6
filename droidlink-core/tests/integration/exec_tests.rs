//! Long-running command lifecycle against a simulated device shell

use std::sync::Arc;
use std::time::Duration;

use droidlink_core::testing::ScriptedTransport;
use droidlink_core::{
    CommandEvent, CommandHandle, ExecSettings, ExecutionEngine, FinishReason, Transport,
};

use super::{FakeShell, wait_until};

const DEVICE: &str = "emulator-5554";

fn setup() -> (Arc<ScriptedTransport>, FakeShell, ExecutionEngine) {
    let transport = ScriptedTransport::new().shared();
    let shell = FakeShell::default();
    shell.install(&transport);
    let settings = ExecSettings::default().with_poll_interval(Duration::from_millis(10));
    let engine = ExecutionEngine::new(Arc::clone(&transport) as Arc<dyn Transport>, settings);
    (transport, shell, engine)
}

async fn collect(handle: CommandHandle) -> Vec<CommandEvent> {
    tokio::time::timeout(Duration::from_secs(5), handle.collect())
        .await
        .expect("stream should close")
}

#[tokio::test]
async fn output_is_delivered_in_order_without_repeats() {
    let (transport, shell, engine) = setup();
    let handle = engine
        .start_long_running(DEVICE, "logcat -v time")
        .await
        .unwrap();
    assert_eq!(handle.pid(), 100);

    shell.write("first\n");
    assert!(wait_until(Duration::from_secs(2), || transport.count_matching("tail -c +7") > 0).await);
    shell.write("second\n");
    tokio::time::sleep(Duration::from_millis(40)).await;
    shell.write("third\n");
    shell.exit();

    let events = collect(handle).await;
    assert_eq!(events.first(), Some(&CommandEvent::Started { pid: 100 }));
    assert_eq!(
        events.last(),
        Some(&CommandEvent::Finished(FinishReason::Exited))
    );
    assert_eq!(CommandHandle::output_of(&events), "first\nsecond\nthird\n");
    assert!(!engine.has_session(DEVICE));
    assert_eq!(transport.count_matching("rm -f /data/local/tmp/droidlink_emulator_5554.log"), 1);
}

#[tokio::test]
async fn character_split_between_polls_arrives_intact() {
    let (transport, shell, engine) = setup();
    let handle = engine.start_long_running(DEVICE, "logcat").await.unwrap();

    // "caf" plus the lead byte of "\u{e9}", then the continuation byte
    shell.write_bytes(b"caf\xC3");
    assert!(wait_until(Duration::from_secs(2), || transport.count_matching("tail -c +5") > 0).await);
    shell.write_bytes(b"\xA9 \xE2\x82\xAC\n");
    tokio::time::sleep(Duration::from_millis(40)).await;
    shell.exit();

    let events = collect(handle).await;
    let output = CommandHandle::output_of(&events);
    assert_eq!(output, "caf\u{e9} \u{20ac}\n");
    assert!(!output.contains('\u{FFFD}'));
}

#[tokio::test]
async fn launch_command_is_detached_and_quoted() {
    let (transport, shell, engine) = setup();
    let handle = engine
        .start_long_running(DEVICE, "echo 'hello world'")
        .await
        .unwrap();
    shell.exit();
    let _ = collect(handle).await;

    let launch = transport
        .calls()
        .into_iter()
        .find(|c| c.command_line().contains("nohup"))
        .unwrap();
    assert_eq!(launch.device.as_deref(), Some(DEVICE));
    assert_eq!(
        launch.args[1],
        r"nohup sh -c 'echo '\''hello world'\''' > /data/local/tmp/droidlink_emulator_5554.log 2>&1 & echo $!"
    );
}

#[tokio::test]
async fn terminate_closes_stream_and_stops_reads() {
    let (transport, shell, engine) = setup();
    let handle = engine.start_long_running(DEVICE, "top -d 1").await.unwrap();
    let pid = handle.pid();
    shell.write("tick\n");

    assert!(engine.terminate(DEVICE, pid).await);
    assert!(!shell.is_alive(pid));

    let events = collect(handle).await;
    assert_eq!(
        events.last(),
        Some(&CommandEvent::Finished(FinishReason::Cancelled))
    );

    let reads = transport.count_matching("tail -c +");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(transport.count_matching("tail -c +"), reads);
}

#[tokio::test]
async fn terminate_is_idempotent() {
    let (_transport, shell, engine) = setup();
    let handle = engine.start_long_running(DEVICE, "sleep 60").await.unwrap();
    let pid = handle.pid();
    shell.exit();
    let _ = collect(handle).await;

    assert!(engine.terminate(DEVICE, pid).await);
    assert!(engine.terminate(DEVICE, pid).await);
}

#[tokio::test]
async fn second_start_replaces_first_session() {
    let (transport, shell, engine) = setup();
    let first = engine.start_long_running(DEVICE, "logcat").await.unwrap();
    let second = engine.start_long_running(DEVICE, "dmesg -w").await.unwrap();

    assert_eq!(first.pid(), 100);
    assert_eq!(second.pid(), 101);
    assert_eq!(engine.active_devices(), vec![DEVICE.to_string()]);
    assert_eq!(engine.active_pid(DEVICE), Some(101));
    assert!(!shell.is_alive(100));
    assert_eq!(transport.count_matching("kill 100"), 1);

    let first_events = collect(first).await;
    assert_eq!(
        first_events.last(),
        Some(&CommandEvent::Finished(FinishReason::Cancelled))
    );

    shell.exit();
    let second_events = collect(second).await;
    assert_eq!(
        second_events.last(),
        Some(&CommandEvent::Finished(FinishReason::Exited))
    );
}

#[tokio::test]
async fn concurrent_starts_leave_one_session() {
    let (_transport, _shell, engine) = setup();
    let (a, b) = tokio::join!(
        engine.start_long_running(DEVICE, "logcat"),
        engine.start_long_running(DEVICE, "logcat -b events"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(engine.active_devices().len(), 1);
    let active = engine.active_pid(DEVICE).unwrap();
    assert!(active == a.pid() || active == b.pid());
    assert_ne!(a.pid(), b.pid());
    engine.shutdown().await;
    assert!(engine.active_devices().is_empty());
}

#[tokio::test]
async fn sessions_on_different_devices_are_independent() {
    let (_transport, _shell, engine) = setup();
    let _a = engine.start_long_running("AAA", "logcat").await.unwrap();
    let _b = engine.start_long_running("BBB", "logcat").await.unwrap();
    assert_eq!(engine.active_devices(), vec!["AAA".to_string(), "BBB".to_string()]);

    assert!(engine.discard("AAA").await);
    assert_eq!(engine.active_devices(), vec!["BBB".to_string()]);
    engine.shutdown().await;
}

#[tokio::test]
async fn repeated_bridge_failures_end_the_stream() {
    let (_transport, shell, engine) = setup();
    let handle = engine.start_long_running(DEVICE, "logcat").await.unwrap();
    shell.set_unreachable(true);

    let events = collect(handle).await;
    assert!(matches!(
        events.iter().rev().nth(1),
        Some(CommandEvent::Diagnostic(_))
    ));
    assert_eq!(
        events.last(),
        Some(&CommandEvent::Finished(FinishReason::TransportLost))
    );
    assert!(!engine.has_session(DEVICE));
}

#[tokio::test]
async fn failed_terminate_reports_diagnostic() {
    let (_transport, shell, engine) = setup();
    let mut handle = engine.start_long_running(DEVICE, "logcat").await.unwrap();
    assert_eq!(handle.next_event().await, Some(CommandEvent::Started { pid: 100 }));

    shell.set_unreachable(true);
    assert!(!engine.terminate(DEVICE, 100).await);
    shell.set_unreachable(false);

    engine.discard(DEVICE).await;
    let rest = collect(handle).await;
    assert!(rest.iter().any(|e| matches!(
        e,
        CommandEvent::Diagnostic(m) if m.starts_with("Failed to terminate 100")
    )));
    assert!(rest.last().is_some_and(CommandEvent::is_terminal));
}
