//! Integration tests for TelemetryClient
//!
//! These tests run the client against a local collector and check what
//! arrives on the wire.

use std::time::Duration;

use parkgate_core::{BarrierKind, SlotNumber, TelemetryEvent, telemetry::BarrierAction};
use parkgate_network::{TelemetryClient, TelemetryClientConfig, TelemetryStats};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

fn config(addr: std::net::SocketAddr) -> TelemetryClientConfig {
    TelemetryClientConfig {
        collector_addr: addr,
        timeout: Duration::from_millis(1000),
    }
}

fn slot_event(slot: usize, occupied: bool) -> TelemetryEvent {
    TelemetryEvent::SlotOccupancy {
        timestamp: None,
        slot_number: SlotNumber::from_index(slot),
        occupied,
    }
}

/// Spawn a collector that returns every line received on one connection.
fn spawn_collector(listener: TcpListener) -> tokio::task::JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let mut received = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            received.push(line);
        }
        received
    })
}

#[tokio::test]
async fn test_events_arrive_as_json_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let collector = spawn_collector(listener);

    let (tx, rx) = mpsc::channel(8);
    let task = TelemetryClient::new(config(addr)).spawn(rx);

    tx.send(slot_event(0, true)).await.unwrap();
    tx.send(TelemetryEvent::BarrierEvent {
        timestamp: None,
        barrier_type: BarrierKind::Exit,
        event_type: BarrierAction::Lowered,
        reason: "exit_hold_elapsed".to_string(),
    })
    .await
    .unwrap();
    drop(tx);

    let stats = task.await.unwrap();
    assert_eq!(stats, TelemetryStats { sent: 2, dropped: 0 });

    let lines = collector.await.unwrap();
    assert_eq!(lines.len(), 2);
    let first: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["type"], "slot_occupancy");
    assert_eq!(first["data"]["slot_number"], 1);
    let second: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(second["data"]["reason"], "exit_hold_elapsed");
}

#[tokio::test]
async fn test_unreachable_collector_drops_events() {
    // Reserve a port, then free it so nothing listens there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, rx) = mpsc::channel(8);
    let task = TelemetryClient::new(config(addr)).spawn(rx);

    for slot in 0..3 {
        tx.send(slot_event(slot, false)).await.unwrap();
    }
    drop(tx);

    let stats = task.await.unwrap();
    assert_eq!(stats, TelemetryStats { sent: 0, dropped: 3 });
}

#[tokio::test]
async fn test_send_connects_lazily() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let collector = spawn_collector(listener);

    let mut client = TelemetryClient::new(config(addr));
    assert!(!client.is_connected());

    client.send(&slot_event(1, true)).await.unwrap();
    assert!(client.is_connected());

    client.close().await;
    assert!(!client.is_connected());

    let lines = collector.await.unwrap();
    assert_eq!(lines.len(), 1);
}
