//! Integration tests for the builder and the full request flow.

use std::path::PathBuf;
use std::time::Duration;

use hexbridge::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// =========================================================================
// Helpers
// =========================================================================

const STEP: Duration = Duration::from_secs(2);

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hexbridge-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

/// A device that acknowledges every frame.
async fn acking_device() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut frame = [0u8; 2];
            while stream.read_exact(&mut frame).await.is_ok() {
                if stream.write_all(b"OK\0").await.is_err() {
                    break;
                }
            }
        }
    });
    port
}

async fn wait_for_state(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    target: SessionState,
) {
    loop {
        let event = tokio::time::timeout(STEP, events.recv())
            .await
            .expect("event expected")
            .expect("channel open");
        if event == SessionEvent::State(target) {
            return;
        }
    }
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn test_load_config_from_json() {
    let path = temp_file(
        "ok.json",
        r#"{"link":{"host":"hexagon.local","port":4242},"game":{"stop_command":"!halt"}}"#,
    );
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.link.host, "hexagon.local");
    assert_eq!(cfg.link.port, 4242);
    assert_eq!(cfg.game.stop_command, "!halt");
    assert_eq!(cfg.game.default_game_time_secs, 60);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_reports_bad_json() {
    let path = temp_file("bad.json", "{ not json");
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, HexbridgeError::ConfigParse { .. }));
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_reports_missing_file() {
    let err = load_config("/nonexistent/hexbridge.json").unwrap_err();
    assert!(matches!(err, HexbridgeError::ConfigRead { .. }));
}

#[tokio::test]
async fn test_builder_rejects_missing_host() {
    let result = Hexbridge::builder().start_with_channel();
    assert!(matches!(
        result,
        Err(HexbridgeError::Config(ConfigError::MissingHost))
    ));
}

// =========================================================================
// End to end
// =========================================================================

#[tokio::test]
async fn test_round_through_facade() {
    let port = acking_device().await;
    let mut link = LinkConfig::new("127.0.0.1", port);
    link.read_timeout_ms = 100;
    link.response_timeout_ms = 500;

    let (bridge, mut events) = Hexbridge::builder()
        .link_config(link)
        .start_with_channel()
        .unwrap();
    wait_for_state(&mut events, SessionState::Ready).await;

    bridge.start_round("alice", Some(30), Some(1)).await.unwrap();
    let info = bridge.info().await.unwrap();
    assert_eq!(info.state, SessionState::GameActive);

    let err = bridge.start_round("bob", None, None).await.unwrap_err();
    assert!(matches!(
        err,
        HexbridgeError::Session(SessionError::IllegalRoundState(_))
    ));

    bridge.chat_message("alice", "!stop").await.unwrap();
    wait_for_state(&mut events, SessionState::Ready).await;

    bridge.shutdown().await.unwrap();
    assert!(bridge.info().await.is_err());
}
