// tests/integration/protocol_test.rs

//! End-to-end tests of the request/reply protocol.

use super::test_helpers::{CATALOG_VERSION, RecordingPlayer, TestServer, catalog_document};
use remoteplay::config::{Config, DeviceConfig};
use remoteplay::core::player::VirtualPlayer;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn authenticate_play_and_get_state() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    assert_eq!(client.request(r#"AUTHENTICATE "phone" "pass""#).await, "OK");
    assert_eq!(client.request(r#"PLAY "song.mp3""#).await, "OK");

    let state = client.request("GET_STATE").await;
    assert!(state.starts_with(r#"PLAYING="yes";"#), "{state}");
    assert!(state.contains(r#"SONG="song";"#), "{state}");
}

#[tokio::test]
async fn play_reaches_the_player_with_the_filename() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;
    let mut client = server.connect().await;

    client.authenticate().await;
    assert_eq!(client.request(r#"PLAY "song.mp3""#).await, "OK");
    assert_eq!(client.request("PAUSE").await, "OK");
    assert_eq!(client.request("STOP").await, "OK");
    assert_eq!(player.calls(), vec!["play song.mp3", "pause", "stop"]);
}

#[tokio::test]
async fn unauthenticated_commands_are_denied() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;
    let mut client = server.connect().await;

    assert_eq!(client.request(r#"PLAY "song.mp3""#).await, "NO");
    assert_eq!(client.request("PAUSE").await, "NO");
    assert_eq!(client.request("UNPAUSE").await, "NO");
    assert_eq!(client.request("STOP").await, "NO");
    assert_eq!(client.request(r#"CHECK "42""#).await, "NO");
    assert_eq!(client.request("UPDATE").await, "");
    assert_eq!(client.request("GET_STATE").await, "");

    assert!(player.calls().is_empty());
    assert_eq!(server.catalog_reads(), 0);
}

#[tokio::test]
async fn wrong_credentials_leave_the_connection_unauthenticated() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;
    let mut client = server.connect().await;

    assert_eq!(client.request(r#"AUTHENTICATE "phone" "wrong""#).await, "NO");
    assert_eq!(client.request(r#"AUTHENTICATE "tablet" "pass""#).await, "NO");
    assert_eq!(client.request("STOP").await, "NO");
    assert!(player.calls().is_empty());
    assert_eq!(server.handle.authenticated_count(), 0);
}

#[tokio::test]
async fn authentication_is_per_connection() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;

    first.authenticate().await;
    assert_eq!(second.request("STOP").await, "NO");
    assert_eq!(first.request("STOP").await, "OK");
    assert_eq!(player.calls(), vec!["stop"]);
}

#[tokio::test]
async fn check_and_update_serve_the_catalog() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.authenticate().await;

    assert_eq!(
        client.request(&format!(r#"CHECK "{CATALOG_VERSION}""#)).await,
        "OK"
    );
    assert_eq!(client.request(r#"CHECK "41""#).await, "NO");
    assert_eq!(client.request(r#"CHECK "not a number""#).await, "NO");

    let payload = client.request("UPDATE").await;
    assert_eq!(payload, catalog_document(CATALOG_VERSION).replace('\n', ""));
}

#[tokio::test]
async fn get_state_template_when_stopped() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.authenticate().await;

    assert_eq!(
        client.request("GET_STATE").await,
        r#"PLAYING="no";ARTIST="";ALBUM="";SONG="";LENGTH="";POSITION="";"#
    );
}

#[tokio::test]
async fn pause_and_unpause_follow_player_state() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.authenticate().await;

    assert_eq!(client.request("PAUSE").await, "NO");
    assert_eq!(client.request(r#"PLAY "Artist/Album/Track.mp3""#).await, "OK");
    assert_eq!(client.request("PAUSE").await, "OK");

    let state = client.request("GET_STATE").await;
    assert!(state.starts_with(r#"PLAYING="no";ARTIST="Artist";ALBUM="Album";SONG="Track";"#), "{state}");

    assert_eq!(client.request("UNPAUSE").await, "OK");
    assert_eq!(client.request("UNPAUSE").await, "NO");
    assert_eq!(client.request("STOP").await, "OK");
}

#[tokio::test]
async fn invalid_lines_get_no_reply() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    client.send("HELLO").await;
    client.send("play \"lowercase.mp3\"").await;
    client.send("").await;
    client.expect_silence(Duration::from_millis(200)).await;

    // The connection is still usable afterwards.
    client.authenticate().await;
    assert_eq!(server.handle.state().stats.get_invalid_commands(), 3);
}

#[tokio::test]
async fn non_utf8_line_is_skipped_without_closing() {
    let player = Arc::new(RecordingPlayer::default());
    let server = TestServer::start_with_player(player.clone()).await;
    let mut client = server.connect().await;
    client.authenticate().await;

    client.send_bytes(b"PLAY \"caf\xe9.mp3\"\n").await;
    client.expect_silence(Duration::from_millis(200)).await;

    assert_eq!(client.request("STOP").await, "OK");
    let state = server.handle.state();
    assert_eq!(state.stats.get_invalid_commands(), 1);
    assert_eq!(state.connection_count(), 1);
    assert_eq!(state.authenticated_count(), 1);
    assert_eq!(player.calls(), vec!["stop".to_string()]);
}

#[tokio::test]
async fn restricted_device_capabilities() {
    let mut config = Config::default();
    config.devices.push(DeviceConfig {
        name: "display".into(),
        password: "wall".into(),
        capabilities: vec!["getState".into(), "checkVersion".into()],
    });
    let server = TestServer::start_with(config, Arc::new(VirtualPlayer::new())).await;
    let mut client = server.connect().await;

    assert_eq!(client.request(r#"AUTHENTICATE "display" "wall""#).await, "OK");
    assert!(client.request("GET_STATE").await.starts_with("PLAYING="));
    assert_eq!(client.request(r#"CHECK "42""#).await, "OK");
    assert_eq!(client.request(r#"PLAY "x.mp3""#).await, "NO");
    assert_eq!(client.request("UPDATE").await, "");
    assert_eq!(server.handle.state().stats.get_denied_commands(), 2);
}
