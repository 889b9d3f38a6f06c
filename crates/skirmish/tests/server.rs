//! Integration tests for the Skirmish server: real WebSocket clients
//! playing whole matches.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use skirmish::prelude::*;
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn start_server() -> String {
    let server = SkirmishServer::builder()
        .bind("127.0.0.1:0")
        .match_config(MatchConfig {
            tick_rate_hz: 20,
            ..MatchConfig::default()
        })
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("bound").to_string();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send");
}

async fn next_event(ws: &mut ClientWs) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).expect("valid json");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            other => panic!("expected an event, got {other:?}"),
        }
    }
}

async fn recv_until(ws: &mut ClientWs, name: &str) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(ws).await;
        let event_name = event["event"].as_str().expect("event name").to_string();
        seen.push(event_name.clone());
        if event_name == name {
            return seen;
        }
    }
}

/// Plays one side of a match: ready, deploy one unit next to the centre,
/// then watch until the room closes. Returns the events seen after
/// deploying.
async fn play(mut ws: ClientWs) -> Vec<String> {
    let matched = next_event(&mut ws).await;
    assert_eq!(matched["event"], "matched");
    let team = matched["data"]["team"].as_i64().expect("team");
    let stage: Value = serde_json::from_str(matched["data"]["stage"].as_str().unwrap()).unwrap();
    assert_eq!(stage["width"], 7);

    send(&mut ws, json!({"event": "deployment-ready", "data": {}})).await;
    assert_eq!(next_event(&mut ws).await["event"], "deployment-started");

    send(
        &mut ws,
        json!({
            "event": "deployment-complete",
            "data": {"entities": [["soldier", {"x": 3, "y": 3 + team, "z": 0}]]}
        }),
    )
    .await;

    let battle = next_event(&mut ws).await;
    assert_eq!(battle["event"], "battle-started");
    let stage: Value = serde_json::from_str(battle["data"]["stage"].as_str().unwrap()).unwrap();
    assert_eq!(stage["entities"].as_array().unwrap().len(), 2);

    recv_until(&mut ws, "room-closed").await
}

#[tokio::test]
async fn test_two_clients_play_a_match_to_the_end() {
    let addr = start_server().await;
    let a = connect(&addr).await;
    let b = connect(&addr).await;

    let (seen_a, seen_b) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(play(a), play(b))
    })
    .await
    .expect("match should finish");

    // Adjacent units: the first battle tick decides it.
    assert_eq!(seen_a, vec!["post-tick", "room-closed"]);
    assert_eq!(seen_b, vec!["post-tick", "room-closed"]);
}

#[tokio::test]
async fn test_malformed_event_gets_error_reply() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    let reply = tokio::time::timeout(TEST_TIMEOUT, next_event(&mut ws))
        .await
        .expect("reply");
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["code"], 400);
}

#[tokio::test]
async fn test_disconnect_closes_match_for_opponent() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    tokio::time::timeout(TEST_TIMEOUT, async {
        assert_eq!(next_event(&mut a).await["event"], "matched");
        assert_eq!(next_event(&mut b).await["event"], "matched");

        a.close(None).await.unwrap();
        let seen = recv_until(&mut b, "room-closed").await;
        assert_eq!(seen, vec!["room-closed"]);
    })
    .await
    .expect("room should close");
}
