//! Integration tests for the engine actor: everything goes through an
//! [`EngineHandle`] the way a transport would use it.

use holdem::{
    EngineConfig, EngineError, EngineEvent, EnginePhase, EngineResponse, GameEngine,
    ProtocolError, StateChangeNotification,
    entities::{Action, PlayerStatus},
    snapshot_to_json,
};
use std::time::Duration;

fn config() -> EngineConfig {
    EngineConfig {
        name: "integration".to_string(),
        max_players: 6,
        small_blind: 10,
        big_blind: 20,
        starting_stack: 1000,
        seed: Some(99),
        ..Default::default()
    }
}

fn join(seat: usize, name: &str) -> EngineEvent {
    EngineEvent::PlayerJoined {
        seat,
        id: seat as u64 + 100,
        name: name.to_string(),
        chips: None,
    }
}

#[tokio::test]
async fn test_join_ready_and_private_views() {
    let engine = GameEngine::new(config()).unwrap();
    let (task, handle) = engine.start_engine();

    assert_eq!(handle.request(join(0, "alice")).await.unwrap(), EngineResponse::Success);
    assert_eq!(handle.request(join(1, "bob")).await.unwrap(), EngineResponse::Success);
    assert_eq!(
        handle.request(join(1, "carol")).await.unwrap(),
        EngineResponse::SeatTaken(1)
    );
    assert_eq!(handle.request(EngineEvent::Ready).await.unwrap(), EngineResponse::Success);

    let public = handle.snapshot().await.unwrap();
    assert_eq!(public.hand_number, 1);
    assert_eq!(public.pot, 30);
    assert!(public.seats.iter().all(|seat| seat.cards.is_none()));

    let alice = handle.snapshot_for(0).await.unwrap();
    assert_eq!(alice.seat(0).unwrap().cards.as_ref().map(Vec::len), Some(2));
    assert!(alice.seat(1).unwrap().cards.is_none());

    let json = snapshot_to_json(&public).unwrap();
    assert!(json.contains("\"hand_number\":1"));

    handle.stop_engine();
    let engine = task.await.unwrap();
    assert_eq!(engine.phase(), EnginePhase::WaitForPlayerActions);
}

#[tokio::test]
async fn test_hand_played_through_handle() {
    let engine = GameEngine::new(config()).unwrap();
    let (task, handle) = engine.start_engine();
    handle.request(join(0, "alice")).await.unwrap();
    handle.request(join(1, "bob")).await.unwrap();
    handle.request(EngineEvent::Ready).await.unwrap();

    // Heads-up the button posts the small blind and acts first.
    let snapshot = handle.snapshot().await.unwrap();
    let to_act = snapshot.to_act.unwrap();
    assert_eq!(Some(to_act), snapshot.button);

    let other = 1 - to_act;
    assert_eq!(
        handle
            .request(EngineEvent::PlayerActed {
                seat: other,
                action: Action::Fold
            })
            .await
            .unwrap(),
        EngineResponse::NotYourTurn
    );
    assert_eq!(
        handle
            .request(EngineEvent::PlayerActed {
                seat: to_act,
                action: Action::Fold
            })
            .await
            .unwrap(),
        EngineResponse::Success
    );

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.hand_over);
    assert_eq!(snapshot.seat(to_act).unwrap().chips, 990);
    assert_eq!(snapshot.seat(other).unwrap().chips, 1010);
    assert_eq!(snapshot.total_chips(), 2000);

    // Acting between hands is the wrong phase; dealing again moves the button.
    assert_eq!(
        handle
            .request(EngineEvent::PlayerActed {
                seat: other,
                action: Action::Check
            })
            .await
            .unwrap(),
        EngineResponse::WrongPhase(EnginePhase::WaitForNextRound)
    );
    assert_eq!(
        handle.request(EngineEvent::StartGame).await.unwrap(),
        EngineResponse::Success
    );
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.hand_number, 2);
    assert_eq!(snapshot.button, Some(other));

    handle.stop_engine();
    task.await.unwrap();
}

#[tokio::test]
async fn test_subscribers_follow_the_room() {
    let engine = GameEngine::new(config()).unwrap();
    let (task, handle) = engine.start_engine();
    let mut updates = handle.subscribe(1, 16).unwrap();

    handle.request(join(0, "alice")).await.unwrap();
    let first = updates.recv().await.unwrap();
    assert!(matches!(first, StateChangeNotification::PlayerListChanged(_)));
    assert_eq!(first.snapshot().seats.len(), 1);

    handle.request(join(1, "bob")).await.unwrap();
    handle.request(EngineEvent::Ready).await.unwrap();
    let _ = updates.recv().await.unwrap();
    let dealt = updates.recv().await.unwrap();
    assert!(matches!(dealt, StateChangeNotification::StateChanged(_)));
    let to_act = dealt.snapshot().to_act.unwrap();

    handle
        .request(EngineEvent::PlayerActed {
            seat: to_act,
            action: Action::Fold,
        })
        .await
        .unwrap();
    let finished = updates.recv().await.unwrap();
    assert!(matches!(finished, StateChangeNotification::HandFinished(_)));

    // Rejected events aren't broadcast.
    handle.request(EngineEvent::Ready).await.unwrap();
    handle.unsubscribe(1).unwrap();
    handle.snapshot().await.unwrap();
    assert!(updates.try_recv().is_err());

    handle.stop_engine();
    task.await.unwrap();
}

#[tokio::test]
async fn test_full_queue_rejects_without_blocking() {
    let config = EngineConfig {
        queue_capacity: 1,
        ..config()
    };
    let engine = GameEngine::new(config).unwrap();
    let (task, handle) = engine.start_engine();

    // The actor hasn't been polled yet on this single-threaded runtime.
    handle.player_join(0, 1, "alice", None).unwrap();
    assert!(matches!(
        handle.player_join(1, 2, "bob", None),
        Err(EngineError::QueueFull)
    ));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.seats.len(), 1);

    handle.stop_engine();
    task.await.unwrap();
}

#[tokio::test]
async fn test_wire_actions_parsed_before_enqueue() {
    let engine = GameEngine::new(config()).unwrap();
    let (task, handle) = engine.start_engine();
    handle.request(join(0, "alice")).await.unwrap();
    handle.request(join(1, "bob")).await.unwrap();
    handle.request(EngineEvent::Ready).await.unwrap();
    let to_act = handle.snapshot().await.unwrap().to_act.unwrap();

    assert!(matches!(
        handle.player_action_wire(to_act, "shove", None),
        Err(EngineError::Protocol(ProtocolError::UnknownAction(_)))
    ));
    assert!(matches!(
        handle.player_action_wire(to_act, "raise", Some(-5)),
        Err(EngineError::Protocol(ProtocolError::InvalidAmount(-5)))
    ));
    assert_eq!(handle.snapshot().await.unwrap().to_act, Some(to_act));

    handle.player_action_wire(to_act, "Fold", None).unwrap();
    assert!(handle.snapshot().await.unwrap().hand_over);

    handle.stop_engine();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stopped_engine_rejects_events() {
    let engine = GameEngine::new(config()).unwrap();
    let (task, handle) = engine.start_engine();
    handle.request(join(0, "alice")).await.unwrap();

    handle.stop_engine();
    let engine = task.await.unwrap();
    assert_eq!(engine.table().count_seated_players(), 1);

    assert!(matches!(handle.ready(), Err(EngineError::EngineStopped)));
    assert!(matches!(
        handle.snapshot().await,
        Err(EngineError::EngineStopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_action_clock_folds_idle_player() {
    let config = EngineConfig {
        action_timeout_secs: 5,
        ..config()
    };
    let engine = GameEngine::new(config).unwrap();
    let (task, handle) = engine.start_engine();
    handle.request(join(0, "alice")).await.unwrap();
    handle.request(join(1, "bob")).await.unwrap();
    handle.request(EngineEvent::Ready).await.unwrap();
    let to_act = handle.snapshot().await.unwrap().to_act.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.to_act, Some(to_act));

    tokio::time::sleep(Duration::from_secs(4)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.hand_over);
    assert_eq!(
        snapshot.seat(to_act).unwrap().status,
        PlayerStatus::Folded
    );

    handle.stop_engine();
    task.await.unwrap();
}
