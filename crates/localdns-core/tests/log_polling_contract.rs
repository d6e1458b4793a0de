//! Contract Test: Log Polling
//!
//! The log poller drains the buffer on a fixed interval without touching
//! session state.
//!
//! Constraints verified:
//! - Entries reach the consumer in order, each exactly once
//! - Shutdown stops the task deterministically
//! - Dropping the consumer stops the task
//! - The API key never appears in captured lines
//!
//! If this test fails, the log display either stalls or leaks.

mod common;

use common::*;
use localdns_core::logging::{LogBuffer, LogPoller};
use localdns_core::traits::HttpMethod;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing_subscriber::prelude::*;

const TICK: Duration = Duration::from_millis(10);

#[tokio::test]
async fn entries_are_delivered_once_in_order() {
    let buffer = LogBuffer::new(100);
    buffer.push("first");
    buffer.push("second");

    let mut watch = LogPoller::new(buffer.clone(), TICK).spawn();

    let first = tokio::time::timeout(Duration::from_secs(1), watch.next())
        .await
        .unwrap()
        .unwrap();
    let second = watch.next().await.unwrap();
    assert_eq!((first.sequence, first.line.as_str()), (0, "first"));
    assert_eq!((second.sequence, second.line.as_str()), (1, "second"));

    buffer.push("third");
    let third = tokio::time::timeout(Duration::from_secs(1), watch.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third.line, "third");

    // Nothing new: no duplicates arrive
    let idle = tokio::time::timeout(TICK * 5, watch.next()).await;
    assert!(idle.is_err());

    watch.stop().await;
}

#[tokio::test]
async fn shutdown_is_deterministic() {
    let buffer = LogBuffer::new(10);
    let watch = LogPoller::new(buffer, TICK).spawn();

    tokio::time::timeout(Duration::from_secs(1), watch.stop())
        .await
        .expect("poller stops promptly");
}

#[tokio::test]
async fn run_with_shutdown_returns_on_signal() {
    let buffer = LogBuffer::new(10);
    buffer.push("only");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();

    let handle = tokio::spawn(LogPoller::new(buffer, TICK).run_with_shutdown(tx, stop_rx));

    let entry = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.line, "only");

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn dropped_consumer_stops_poller() {
    let buffer = LogBuffer::new(10);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let (_stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(LogPoller::new(buffer, TICK).run_with_shutdown(tx, stop_rx));
    drop(rx);

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("poller notices the dropped consumer")
        .unwrap();
}

#[tokio::test]
async fn session_logs_are_captured_without_the_key() {
    let buffer = LogBuffer::new(1000);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(buffer.layer()));

    let transport = MockTransport::new();
    transport.respond_json(HttpMethod::Get, "organizations", organizations_body());
    let session = scoped_session(transport, false);
    session.list_organizations(false).await.unwrap();

    let mut watch = LogPoller::new(buffer.clone(), TICK).spawn();
    let mut lines = Vec::new();
    while lines.len() < buffer.len() {
        match tokio::time::timeout(Duration::from_secs(1), watch.next()).await {
            Ok(Some(entry)) => lines.push(entry.line),
            _ => break,
        }
    }
    watch.stop().await;

    assert!(lines.iter().any(|line| line.contains(" - INFO - ")
        && line.contains("Successfully fetched 2 organizations")));
    assert!(lines.iter().all(|line| !line.contains(TEST_API_KEY)));
}
