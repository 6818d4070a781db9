//! Connection state machine, outbound queue and inbound dispatch.
//!
//! DESIGN
//! ======
//! The executor never touches a socket. `send_command` decides whether a
//! message goes out now (`SendOutcome::Sent`, which the host forwards to the
//! transport) or waits in a FIFO queue until `on_open`. Inbound text goes
//! through `handle_text`, which reports what it did as an [`Outcome`] so the
//! host and tests can observe suppression without inspecting the scene.
//!
//! LIFECYCLE
//! =========
//! `Connecting` → `on_open` → `Open` (queue flushed in order) → `on_close` →
//! `Closed` (queue discarded). Reconnecting is the host's call:
//! `on_connecting` moves back to `Connecting` and later sends queue again.

#[cfg(test)]
#[path = "executor_test.rs"]
mod executor_test;

use std::collections::VecDeque;

use mesh::{EditableGroup, ErrorCode, Mode, Scene};
use protocol::{Envelope, Message, ProtocolError};
use tracing::{debug, info, warn};

use crate::config::{ExecutorConfig, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

/// What `send_command` did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Ready to write now.
    Sent(Envelope),
    /// Held until the connection opens.
    Queued,
    /// Read-only executors emit nothing.
    Dropped,
}

/// What an inbound message did to the local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Echo of a local edit that was applied when it was made.
    Suppressed,
    /// Malformed, unknown, or failed to apply.
    Ignored,
}

/// One received chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub user: String,
    pub text: String,
    pub seq: Option<u64>,
}

pub struct Executor {
    pub(crate) config: ExecutorConfig,
    pub(crate) scene: Scene,
    pub(crate) mode: Mode,
    /// Objects the relay has confirmed as locked by the local user.
    pub(crate) selection: EditableGroup,
    pub(crate) chat: VecDeque<ChatLine>,
    state: ConnectionState,
    pending: VecDeque<Envelope>,
}

impl Executor {
    #[must_use]
    pub fn new(config: ExecutorConfig, scene: Scene) -> Self {
        Self {
            config,
            scene,
            mode: Mode::default(),
            selection: EditableGroup::new(),
            chat: VecDeque::new(),
            state: ConnectionState::Connecting,
            pending: VecDeque::new(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.config.role
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Local edits go straight to the scene; emit them afterwards.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut Mode {
        &mut self.mode
    }

    #[must_use]
    pub fn selection(&self) -> &EditableGroup {
        &self.selection
    }

    #[must_use]
    pub fn chat(&self) -> &VecDeque<ChatLine> {
        &self.chat
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_own(&self, user: &str) -> bool {
        user == self.config.user_id
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Send now if open, otherwise queue. No deduplication, no bound.
    pub fn send_command(&mut self, message: Message) -> SendOutcome {
        if self.config.role == Role::Read {
            debug!(kind = message.kind(), "executor: read-only, command dropped");
            return SendOutcome::Dropped;
        }
        let envelope = Envelope::new(message);
        if self.state == ConnectionState::Open {
            SendOutcome::Sent(envelope)
        } else {
            debug!(kind = envelope.message.kind(), queued = self.pending.len() + 1, "executor: command queued");
            self.pending.push_back(envelope);
            SendOutcome::Queued
        }
    }

    /// Mark the connection open and hand back the queue in send order.
    pub fn on_open(&mut self) -> Vec<Envelope> {
        self.state = ConnectionState::Open;
        let flushed: Vec<Envelope> = self.pending.drain(..).collect();
        info!(flushed = flushed.len(), "executor: connection open");
        flushed
    }

    /// Mark the connection closed and discard the queue. Returns how many
    /// commands were discarded.
    pub fn on_close(&mut self) -> usize {
        self.state = ConnectionState::Closed;
        let discarded = self.pending.len();
        self.pending.clear();
        info!(discarded, "executor: connection closed");
        discarded
    }

    /// Start over after a close; commands queue until the next `on_open`.
    pub fn on_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Decode and apply one text frame from the relay.
    pub fn handle_text(&mut self, text: &str) -> Outcome {
        match protocol::decode(text) {
            Ok(envelope) => self.handle(envelope),
            Err(e @ (ProtocolError::UnknownType(_) | ProtocolError::UnknownTool(_))) => {
                warn!(code = e.error_code(), error = %e, "executor: unsupported message ignored");
                Outcome::Ignored
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "executor: malformed message dropped");
                Outcome::Ignored
            }
        }
    }

    /// Apply one decoded message.
    pub fn handle(&mut self, envelope: Envelope) -> Outcome {
        let Envelope { seq, message } = envelope;
        let kind = message.kind();
        let result = match message {
            Message::Chat { user, text } => Ok(self.apply_chat(user, text, seq)),
            Message::Create { object } => self.apply_create(object, seq),
            Message::Lock { user, objects } => Ok(self.apply_lock(&user, &objects, seq)),
            Message::Unlock { user, objects } => Ok(self.apply_unlock(&user, &objects)),
            Message::Leave { user } => Ok(self.apply_leave(&user)),
            Message::Join { user } => {
                self.scene.add_user(&user);
                Ok(Outcome::Applied)
            }
            Message::Name { value } => {
                self.scene.name = value;
                Ok(Outcome::Applied)
            }
            Message::Meta { name, users } => {
                self.scene.name = name;
                self.scene.set_users(users);
                Ok(Outcome::Applied)
            }
            Message::Edit(edit) => self.apply_edit(edit),
            Message::Error { message } => {
                warn!(%message, "executor: relay rejected a message");
                Ok(Outcome::Ignored)
            }
        };
        match result {
            Ok(outcome) => {
                debug!(kind, ?seq, ?outcome, "executor: handled");
                outcome
            }
            Err(e) => {
                warn!(kind, ?seq, code = e.error_code(), error = %e, "executor: message not applied");
                Outcome::Ignored
            }
        }
    }

    fn apply_chat(&mut self, user: String, text: String, seq: Option<u64>) -> Outcome {
        if self.config.chat_capacity == 0 {
            return Outcome::Ignored;
        }
        while self.chat.len() >= self.config.chat_capacity {
            self.chat.pop_front();
        }
        self.chat.push_back(ChatLine { user, text, seq });
        Outcome::Applied
    }
}
