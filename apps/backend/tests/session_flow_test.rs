//! Orchestrator flows over the in-memory store.

mod support;

use backend::domain::events;
use backend::domain::session::SessionStatus;
use backend::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

use support::{column, connect_four_session, harness};

#[tokio::test]
async fn create_session_is_idempotent_per_session_id() {
    let h = harness();

    let first = h
        .sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();
    let second = h
        .sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    assert_eq!(first.session_id, second.session_id);
    assert_eq!(h.store.len(), 1);
    assert_eq!(first.status, SessionStatus::Active);
    assert_eq!(first.total_moves, 0);
    assert_eq!(first.current_player_id, "a");
}

#[tokio::test]
async fn create_session_generates_an_id_when_absent() {
    let h = harness();
    let mut new = connect_four_session("ignored", &["a", "b"], "a");
    new.session_id = None;

    let session = h.sessions.create_session(new).await.unwrap();
    assert!(!session.session_id.is_empty());
    assert!(h
        .sessions
        .get_session(&session.session_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = harness();
    let err = h
        .sessions
        .apply_move("missing", "a", column(0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Session, _)));
}

#[tokio::test]
async fn moves_alternate_turns_and_count_up() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    let session = h.sessions.apply_move("s-1", "a", column(0)).await.unwrap();
    assert_eq!(session.total_moves, 1);
    assert_eq!(session.current_player_id, "b");

    let session = h.sessions.apply_move("s-1", "b", column(1)).await.unwrap();
    assert_eq!(session.total_moves, 2);
    assert_eq!(session.current_player_id, "a");
}

#[tokio::test]
async fn wrong_turn_fails_without_mutating_stored_state() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    let err = h
        .sessions
        .apply_move("s-1", "b", column(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::WrongTurn, _)
    ));

    let stored = h.sessions.get_session("s-1").await.unwrap().unwrap();
    assert_eq!(stored.total_moves, 0);
    assert_eq!(stored.current_player_id, "a");
    assert!(h.publisher.events_for(events::MOVE_APPLIED).is_empty());
}

#[tokio::test]
async fn illegal_move_fails_without_mutating_stored_state() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    let err = h
        .sessions
        .apply_move("s-1", "a", column(9))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidMove, _)
    ));

    let stored = h.sessions.get_session("s-1").await.unwrap().unwrap();
    assert_eq!(stored.total_moves, 0);
}

#[tokio::test]
async fn connect_four_game_plays_to_a_win() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    // a stacks column 3; b answers in column 6 every time.
    for (player, col) in [("a", 3), ("b", 6), ("a", 3), ("b", 6), ("a", 3), ("b", 6)] {
        let session = h.sessions.apply_move("s-1", player, column(col)).await.unwrap();
        assert_eq!(session.status, SessionStatus::Active);
    }

    let session = h.sessions.apply_move("s-1", "a", column(3)).await.unwrap();
    assert_eq!(session.status, SessionStatus::Finished);
    assert_eq!(session.winner_id.as_deref(), Some("a"));
    assert_eq!(session.total_moves, 7);
    assert!(session.ended_at.is_some());

    // Every accepted move emitted exactly one event, plus one terminal event.
    let moves = h.publisher.events_for(events::MOVE_APPLIED);
    assert_eq!(moves.len(), 7);
    assert_eq!(moves[6]["winner_id"], "a");
    assert_eq!(moves[6]["status"], "finished");

    let ended = h.publisher.events_for(events::SESSION_ENDED);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["winner_id"], "a");
    assert_eq!(ended[0]["total_moves"], 7);
    assert!(ended[0].get("abandoned_by").is_none());
}

#[tokio::test]
async fn moves_after_the_end_conflict() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();
    for (player, col) in [
        ("a", 3),
        ("b", 6),
        ("a", 3),
        ("b", 6),
        ("a", 3),
        ("b", 6),
        ("a", 3),
    ] {
        h.sessions.apply_move("s-1", player, column(col)).await.unwrap();
    }

    let err = h
        .sessions
        .apply_move("s-1", "b", column(6))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::InvalidSessionState, _)
    ));
}

#[tokio::test]
async fn abandon_awards_the_other_participant() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    let session = h.sessions.abandon_session("s-1", "a", false).await.unwrap();
    assert_eq!(session.status, SessionStatus::Abandoned);
    assert_eq!(session.winner_id.as_deref(), Some("b"));
    assert!(session.ended_at.is_some());

    let ended = h.publisher.events_for(events::SESSION_ENDED);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["abandoned_by"], "a");
    assert_eq!(ended[0]["status"], "abandoned");
}

#[tokio::test]
async fn force_abandon_on_terminal_session_is_a_noop() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();
    let abandoned = h.sessions.abandon_session("s-1", "a", false).await.unwrap();

    // Without force: conflict. With force: unchanged record, no extra event.
    let err = h
        .sessions
        .abandon_session("s-1", "a", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::InvalidSessionState, _)
    ));

    let again = h.sessions.abandon_session("s-1", "a", true).await.unwrap();
    assert_eq!(again, abandoned);
    assert_eq!(h.publisher.events_for(events::SESSION_ENDED).len(), 1);
}

#[tokio::test]
async fn abandon_rejects_non_participants() {
    let h = harness();
    h.sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();

    let err = h
        .sessions
        .abandon_session("s-1", "stranger", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::PlayerNotInSession, _)
    ));
}

#[tokio::test]
async fn match_history_returns_finished_sessions_most_recent_first() {
    let h = harness();

    for id in ["s-1", "s-2"] {
        h.sessions
            .create_session(connect_four_session(id, &["a", "b"], "a"))
            .await
            .unwrap();
        for (player, col) in [
            ("a", 3),
            ("b", 6),
            ("a", 3),
            ("b", 6),
            ("a", 3),
            ("b", 6),
            ("a", 3),
        ] {
            h.sessions.apply_move(id, player, column(col)).await.unwrap();
        }
    }
    // Still-active session must not show up.
    h.sessions
        .create_session(connect_four_session("s-3", &["a", "c"], "a"))
        .await
        .unwrap();

    let history = h.sessions.match_history("a", 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|s| s.status == SessionStatus::Finished));
    assert!(history[0].started_at >= history[1].started_at);

    let capped = h.sessions.match_history("a", 1).await.unwrap();
    assert_eq!(capped.len(), 1);

    let none = h.sessions.match_history("c", 10).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn publish_failures_do_not_abort_committed_mutations() {
    use std::sync::Arc;

    use backend::adapters::sessions_mem::InMemorySessionStore;
    use backend::domain::rules::GameCatalog;
    use backend::services::sessions::SessionService;
    use backend::SessionStore;

    let store = Arc::new(InMemorySessionStore::new());
    let sessions = SessionService::new(
        GameCatalog::new(),
        store.clone(),
        Arc::new(support::FailingPublisher),
    );

    sessions
        .create_session(connect_four_session("s-1", &["a", "b"], "a"))
        .await
        .unwrap();
    let session = sessions.apply_move("s-1", "a", column(0)).await.unwrap();
    assert_eq!(session.total_moves, 1);

    let stored = store.find_by_id("s-1").await.unwrap().unwrap();
    assert_eq!(stored.total_moves, 1);
}
