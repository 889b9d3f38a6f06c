//! Integration tests for room actors and the room manager.

use std::time::Duration;

use skirmish_protocol::{ClientEvent, ParticipantId, ServerEvent, SessionKey, UnitSpec, Vector};
use skirmish_room::{
    GameRoom, MatchConfig, Participant, RoomError, RoomManager, RoomPhase, spawn_room,
};
use skirmish_tick::TickConfig;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn participant(id: u64) -> (Participant, UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Participant::new(ParticipantId(id), tx), rx)
}

fn fast_config() -> MatchConfig {
    MatchConfig {
        tick_rate_hz: 20,
        ..MatchConfig::default()
    }
}

fn deploy_at(x: i32, y: i32) -> ClientEvent {
    ClientEvent::DeploymentComplete {
        entities: vec![UnitSpec::new("soldier", Vector::new(x, y, 0))],
    }
}

/// Receives events until one named `name` shows up, returning everything
/// seen on the way including it.
async fn recv_until(rx: &mut UnboundedReceiver<ServerEvent>, name: &str) -> Vec<ServerEvent> {
    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = event.name() == name;
        seen.push(event);
        if done {
            return seen;
        }
    }
    panic!("channel closed before {name}, saw {seen:?}");
}

#[tokio::test(start_paused = true)]
async fn test_full_match_through_manager() {
    let mut manager = RoomManager::new(fast_config());
    let (p1, mut rx1) = participant(1);
    let (p2, mut rx2) = participant(2);

    let key = manager.create_match(p1, p2).unwrap();
    assert_eq!(manager.room_count(), 1);
    assert_eq!(manager.participant_room(ParticipantId(1)), Some(&key));
    assert_eq!(rx1.recv().await.unwrap().name(), "matched");
    assert_eq!(rx2.recv().await.unwrap().name(), "matched");

    for id in [1, 2] {
        manager
            .route_event(ParticipantId(id), ClientEvent::DeploymentReady {})
            .await
            .unwrap();
    }
    recv_until(&mut rx1, "deployment-started").await;
    recv_until(&mut rx2, "deployment-started").await;

    manager.route_event(ParticipantId(1), deploy_at(3, 3)).await.unwrap();
    manager.route_event(ParticipantId(2), deploy_at(3, 4)).await.unwrap();

    let events = recv_until(&mut rx1, "room-closed").await;
    let names: Vec<&str> = events.iter().map(ServerEvent::name).collect();
    assert_eq!(names, vec!["battle-started", "post-tick", "room-closed"]);
    recv_until(&mut rx2, "room-closed").await;

    // The actor drops the outboxes when it stops.
    assert!(rx1.recv().await.is_none());
    assert_eq!(manager.reap_finished(), vec![key]);
    assert_eq!(manager.room_count(), 0);
    assert!(manager.participant_room(ParticipantId(1)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_room_for_opponent() {
    let mut manager = RoomManager::new(fast_config());
    let (p1, rx1) = participant(1);
    let (p2, mut rx2) = participant(2);
    let key = manager.create_match(p1, p2).unwrap();

    drop(rx1);
    manager.disconnect(ParticipantId(1)).await.unwrap();

    let events = recv_until(&mut rx2, "room-closed").await;
    assert_eq!(events.last(), Some(&ServerEvent::RoomClosed {}));
    assert!(rx2.recv().await.is_none());

    assert_eq!(manager.reap_finished(), vec![key]);
    // Disconnecting again is a no-op.
    manager.disconnect(ParticipantId(2)).await.unwrap();
}

#[tokio::test]
async fn test_route_event_without_match_fails() {
    let manager = RoomManager::default();
    let result = manager
        .route_event(ParticipantId(5), ClientEvent::DeploymentReady {})
        .await;
    assert!(matches!(result, Err(RoomError::NotInRoom(ParticipantId(5)))));
}

#[tokio::test]
async fn test_participant_cannot_join_two_matches() {
    let mut manager = RoomManager::default();
    let (p1, _rx1) = participant(1);
    let (p2, _rx2) = participant(2);
    let key = manager.create_match(p1, p2).unwrap();

    let (again, _rx) = participant(2);
    let (p3, _rx3) = participant(3);
    let result = manager.create_match(again, p3);
    assert!(matches!(
        result,
        Err(RoomError::AlreadyInRoom(ParticipantId(2), k)) if k == key
    ));
    assert_eq!(manager.room_count(), 1);
}

#[tokio::test]
async fn test_room_info_reports_phase() {
    let mut manager = RoomManager::default();
    let (p1, _rx1) = participant(1);
    let (p2, _rx2) = participant(2);
    let key = manager.create_match(p1, p2).unwrap();

    let info = manager.get_room_info(&key).await.unwrap();
    assert_eq!(info.key, key);
    assert_eq!(info.phase, RoomPhase::Created);
    assert!(info.active);
    assert_eq!(info.participants, [ParticipantId(1), ParticipantId(2)]);
    assert_eq!(info.ticks, 0);

    let missing = manager.get_room_info(&SessionKey::new("M-0")).await;
    assert!(matches!(missing, Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_actor() {
    let (p1, mut rx1) = participant(1);
    let (p2, _rx2) = participant(2);
    let room = GameRoom::new(SessionKey::new("M1"), p1, p2, &MatchConfig::default()).unwrap();
    let handle = spawn_room(room, TickConfig::with_rate(10), 8);

    handle.shutdown().await.unwrap();
    recv_until(&mut rx1, "room-closed").await;
    assert!(rx1.recv().await.is_none());
    assert!(handle.is_finished());
    assert!(matches!(
        handle.get_info().await,
        Err(RoomError::Unavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_deployment_timeout_starts_battle_without_both_ready() {
    let config = MatchConfig {
        deployment_timeout: Some(Duration::from_millis(500)),
        ..fast_config()
    };
    let mut manager = RoomManager::new(config);
    let (p1, mut rx1) = participant(1);
    let (p2, _rx2) = participant(2);
    manager.create_match(p1, p2).unwrap();

    for id in [1, 2] {
        manager
            .route_event(ParticipantId(id), ClientEvent::DeploymentReady {})
            .await
            .unwrap();
    }
    recv_until(&mut rx1, "deployment-started").await;
    manager.route_event(ParticipantId(1), deploy_at(0, 0)).await.unwrap();

    // Participant 2 never deploys, so the first battle tick wipes team 1.
    let events = recv_until(&mut rx1, "room-closed").await;
    let names: Vec<&str> = events.iter().map(ServerEvent::name).collect();
    assert_eq!(names, vec!["battle-started", "post-tick", "room-closed"]);
}

#[tokio::test(start_paused = true)]
async fn test_early_deployment_does_not_stall_match() {
    let mut manager = RoomManager::new(fast_config());
    let (p1, mut rx1) = participant(1);
    let (p2, mut rx2) = participant(2);
    let key = manager.create_match(p1, p2).unwrap();

    for id in [1, 2] {
        manager
            .route_event(ParticipantId(id), ClientEvent::DeploymentReady {})
            .await
            .unwrap();
    }
    // Sent before the room has had a tick to open deployment.
    manager.route_event(ParticipantId(1), deploy_at(3, 3)).await.unwrap();

    let events = recv_until(&mut rx1, "deployment-started").await;
    let names: Vec<&str> = events.iter().map(ServerEvent::name).collect();
    assert_eq!(names, vec!["matched", "error", "deployment-started"]);
    recv_until(&mut rx2, "deployment-started").await;
    assert_eq!(
        manager.get_room_info(&key).await.unwrap().phase,
        RoomPhase::Deployment
    );

    manager.route_event(ParticipantId(1), deploy_at(3, 3)).await.unwrap();
    manager.route_event(ParticipantId(2), deploy_at(3, 4)).await.unwrap();
    recv_until(&mut rx1, "battle-started").await;
}
