// tests/integration/concurrency_test.rs

//! Many clients at once: dispatch must stay serialized and per-connection
//! ordering must hold.

use super::test_helpers::{RecordingPlayer, TestServer};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinSet;

const CLIENTS: usize = 8;
const COMMANDS_PER_CLIENT: usize = 10;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn player_calls_never_overlap() {
    let player = Arc::new(RecordingPlayer::with_call_duration(Duration::from_millis(2)));
    let server = TestServer::start_with_player(player.clone()).await;

    let mut tasks = JoinSet::new();
    for client_id in 0..CLIENTS {
        let addr = server.addr();
        tasks.spawn(async move {
            let mut client = super::test_helpers::TestClient::connect(addr).await;
            client.authenticate().await;
            for n in 0..COMMANDS_PER_CLIENT {
                let reply = client.request(&format!(r#"PLAY "c{client_id}-{n}.mp3""#)).await;
                assert_eq!(reply, "OK");
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(player.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(player.calls().len(), CLIENTS * COMMANDS_PER_CLIENT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_connection_sees_its_own_order() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;

    let mut tasks = JoinSet::new();
    for client_id in 0..CLIENTS {
        let addr = server.addr();
        tasks.spawn(async move {
            let mut client = super::test_helpers::TestClient::connect(addr).await;
            client.authenticate().await;
            for n in 0..COMMANDS_PER_CLIENT {
                client.request(&format!(r#"PLAY "{client_id}:{n}""#)).await;
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let calls = player.calls();
    for client_id in 0..CLIENTS {
        let prefix = format!("play {client_id}:");
        let seen: Vec<usize> = calls
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(seen, (0..COMMANDS_PER_CLIENT).collect::<Vec<_>>());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn denied_clients_never_touch_the_player() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;

    let mut tasks = JoinSet::new();
    for _ in 0..CLIENTS {
        let addr = server.addr();
        tasks.spawn(async move {
            let mut client = super::test_helpers::TestClient::connect(addr).await;
            for _ in 0..COMMANDS_PER_CLIENT {
                assert_eq!(client.request("STOP").await, "NO");
                assert_eq!(client.request("GET_STATE").await, "");
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
    assert!(player.calls().is_empty());
}
