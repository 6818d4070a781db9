//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the relay configuration and a map of live scenes. Each scene
//! keeps its presence list, connected clients, object locks, and the
//! sequence counter stamped onto everything it relays. Nothing is persisted;
//! a scene lives as long as the process.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use protocol::Envelope;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::ServerConfig;

pub const DEFAULT_SCENE_NAME: &str = "New Scene";

// =============================================================================
// SCENE STATE
// =============================================================================

/// One open websocket.
pub struct ConnectedClient {
    pub user: String,
    pub tx: mpsc::Sender<Envelope>,
}

/// An object lock. Held by the connection that took it, not just the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLock {
    pub user: String,
    pub client_id: Uuid,
    pub expires_at: Instant,
}

impl ObjectLock {
    #[must_use]
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct SceneState {
    pub name: String,
    /// Users present, in join order, without duplicates.
    pub users: Vec<String>,
    pub clients: HashMap<Uuid, ConnectedClient>,
    pub locks: HashMap<String, ObjectLock>,
    seq: u64,
}

impl SceneState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_SCENE_NAME.to_owned(),
            users: Vec::new(),
            clients: HashMap::new(),
            locks: HashMap::new(),
            seq: 0,
        }
    }

    /// Next relay sequence number. The first message of a scene gets 1.
    pub fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.seq
    }

    pub fn add_user(&mut self, user: &str) {
        if !self.users.iter().any(|u| u == user) {
            self.users.push(user.to_owned());
        }
    }

    /// Drop `user` from presence unless another connection still carries it.
    pub fn remove_user(&mut self, user: &str) {
        if !self.clients.values().any(|c| c.user == user) {
            self.users.retain(|u| u != user);
        }
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; the scene map is
/// Arc-wrapped and the config is `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub scenes: Arc<RwLock<HashMap<String, SceneState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config, scenes: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
