use super::*;
use std::time::Duration;

#[test]
fn scene_state_new_is_empty() {
    let scene = SceneState::new();
    assert_eq!(scene.name, DEFAULT_SCENE_NAME);
    assert!(scene.users.is_empty());
    assert!(scene.clients.is_empty());
    assert!(scene.locks.is_empty());
    assert_eq!(scene.last_seq(), 0);
}

#[test]
fn seq_starts_at_one_and_increases() {
    let mut scene = SceneState::default();
    assert_eq!(scene.next_seq(), 1);
    assert_eq!(scene.next_seq(), 2);
    assert_eq!(scene.last_seq(), 2);
}

#[test]
fn users_are_unique_in_join_order() {
    let mut scene = SceneState::new();
    scene.add_user("b");
    scene.add_user("a");
    scene.add_user("b");
    assert_eq!(scene.users, ["b", "a"]);
}

#[test]
fn user_stays_while_another_connection_carries_it() {
    let mut scene = SceneState::new();
    let (tx, _rx) = mpsc::channel(1);
    scene.add_user("a");
    scene.clients.insert(Uuid::new_v4(), ConnectedClient { user: "a".into(), tx });
    scene.remove_user("a");
    assert_eq!(scene.users, ["a"]);

    scene.clients.clear();
    scene.remove_user("a");
    assert!(scene.users.is_empty());
}

#[test]
fn lock_liveness_follows_expiry() {
    let now = Instant::now();
    let lock = ObjectLock { user: "a".into(), client_id: Uuid::new_v4(), expires_at: now + Duration::from_secs(1) };
    assert!(lock.is_live(now));
    assert!(!lock.is_live(now + Duration::from_secs(1)));
}
