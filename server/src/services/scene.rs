//! Scene service: presence, lock arbitration, and sequenced broadcast.
//!
//! DESIGN
//! ======
//! Every mutation of a scene and the broadcast it causes happen under one
//! write lock on the scene map, so every client observes relayed messages
//! in `seq` order. Broadcast is best-effort per client: a full outbound
//! channel drops the frame for that client only.
//!
//! LOCKS
//! =====
//! A lock is granted when the object is free, when the previous lock has
//! outlived the TTL, or when the requester already holds it (which refreshes
//! the expiry). The relayed `lock` carries only the granted ids. Locks die
//! with the connection that took them.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::time::{Duration, Instant};

use protocol::{Envelope, ErrorCode, Message, ProtocolError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, ConnectedClient, ObjectLock, SceneState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid message: {0}")]
    Decode(#[from] ProtocolError),
    #[error("{0} messages are sent by the relay only")]
    ServerOnly(&'static str),
    #[error("not connected to scene {0}")]
    NotConnected(String),
}

impl ErrorCode for RelayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(e) => e.error_code(),
            Self::ServerOnly(_) => "E_SERVER_ONLY",
            Self::NotConnected(_) => "E_NOT_CONNECTED",
        }
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Attach a connection to `scene_id`, creating the scene on first use.
///
/// Returns the `meta` reply for the joining client. The `join` broadcast,
/// which the joiner also receives, is queued after it.
pub async fn join_scene(
    state: &AppState,
    scene_id: &str,
    client_id: Uuid,
    user: &str,
    tx: mpsc::Sender<Envelope>,
) -> Envelope {
    let mut scenes = state.scenes.write().await;
    let scene = scenes.entry(scene_id.to_owned()).or_default();
    scene.add_user(user);
    scene.clients.insert(client_id, ConnectedClient { user: user.to_owned(), tx });
    info!(%scene_id, %client_id, %user, clients = scene.clients.len(), "scene: client joined");

    let meta = Envelope::new(Message::Meta { name: scene.name.clone(), users: scene.users.clone() });
    broadcast_in(scene, scene_id, Message::Join { user: user.to_owned() });
    meta
}

/// Detach a connection. Its locks are released; peers see `leave` once the
/// user has no connection left, or an `unlock` of the released ids otherwise.
pub async fn part_scene(state: &AppState, scene_id: &str, client_id: Uuid) {
    let mut scenes = state.scenes.write().await;
    let Some(scene) = scenes.get_mut(scene_id) else {
        return;
    };
    let Some(client) = scene.clients.remove(&client_id) else {
        return;
    };

    let mut released: Vec<String> =
        scene.locks.iter().filter(|(_, l)| l.client_id == client_id).map(|(id, _)| id.clone()).collect();
    released.sort();
    for id in &released {
        scene.locks.remove(id);
    }
    scene.remove_user(&client.user);
    info!(%scene_id, %client_id, user = %client.user, released = released.len(), "scene: client left");

    if scene.users.iter().any(|u| *u == client.user) {
        if !released.is_empty() {
            broadcast_in(scene, scene_id, Message::Unlock { user: client.user, objects: released });
        }
    } else {
        broadcast_in(scene, scene_id, Message::Leave { user: client.user });
    }
}

// =============================================================================
// RELAY
// =============================================================================

/// Apply the relay-side effects of one client message and broadcast it.
///
/// # Errors
///
/// Returns [`RelayError::ServerOnly`] for message types only the relay may
/// originate, and [`RelayError::NotConnected`] if the client is not
/// attached to the scene.
pub async fn relay(state: &AppState, scene_id: &str, client_id: Uuid, message: Message) -> Result<u64, RelayError> {
    let ttl = state.config.lock_ttl;
    let mut scenes = state.scenes.write().await;
    let scene = scenes.get_mut(scene_id).ok_or_else(|| RelayError::NotConnected(scene_id.to_owned()))?;
    let user = scene
        .clients
        .get(&client_id)
        .map(|c| c.user.clone())
        .ok_or_else(|| RelayError::NotConnected(scene_id.to_owned()))?;

    let message = match message {
        Message::Meta { .. } | Message::Join { .. } | Message::Leave { .. } | Message::Error { .. } => {
            return Err(RelayError::ServerOnly(message.kind()));
        }
        Message::Name { value } => {
            info!(%scene_id, name = %value, "scene: renamed");
            scene.name.clone_from(&value);
            Message::Name { value }
        }
        Message::Lock { objects, .. } => {
            let granted = grant_locks(scene, &user, client_id, &objects, Instant::now(), ttl);
            debug!(%scene_id, %user, requested = objects.len(), granted = granted.len(), "scene: lock");
            Message::Lock { user, objects: granted }
        }
        Message::Unlock { objects, .. } => {
            let released = release_locks(scene, &user, &objects);
            Message::Unlock { user, objects: released }
        }
        other => other,
    };
    Ok(broadcast_in(scene, scene_id, message))
}

/// Take every free or expired lock among `ids` for `user`.
pub fn grant_locks(
    scene: &mut SceneState,
    user: &str,
    client_id: Uuid,
    ids: &[String],
    now: Instant,
    ttl: Duration,
) -> Vec<String> {
    let mut granted: Vec<String> = Vec::new();
    for id in ids {
        if granted.contains(id) {
            continue;
        }
        let free = scene.locks.get(id).is_none_or(|l| !l.is_live(now) || l.user == user);
        if free {
            scene.locks.insert(id.clone(), ObjectLock { user: user.to_owned(), client_id, expires_at: now + ttl });
            granted.push(id.clone());
        }
    }
    granted
}

/// Release the locks among `ids` that `user` holds.
pub fn release_locks(scene: &mut SceneState, user: &str, ids: &[String]) -> Vec<String> {
    let mut released = Vec::new();
    for id in ids {
        if scene.locks.get(id).is_some_and(|l| l.user == user) {
            scene.locks.remove(id);
            released.push(id.clone());
        }
    }
    released
}

/// Stamp `message` with the scene's next `seq` and queue it for every client.
fn broadcast_in(scene: &mut SceneState, scene_id: &str, message: Message) -> u64 {
    let seq = scene.next_seq();
    let envelope = Envelope::stamped(message, seq);
    for (client_id, client) in &scene.clients {
        match client.tx.try_send(envelope.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%scene_id, %client_id, seq, "scene: client channel full, frame dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%scene_id, %client_id, seq, "scene: client channel closed");
            }
        }
    }
    seq
}
