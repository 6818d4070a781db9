/// Default number of chat lines an executor keeps.
pub const DEFAULT_CHAT_CAPACITY: usize = 200;

/// Whether an executor may emit commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    /// Emits commands and applies remote ones.
    #[default]
    Write,
    /// Applies remote commands only; outbound commands are dropped.
    Read,
}

/// Host-supplied executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Local user; edits carrying this id are not re-applied.
    pub user_id: String,
    pub role: Role,
    /// Sequence number for a `create` that arrives without one, as when a
    /// peer is driven without a relay.
    pub seq_base: u64,
    pub chat_capacity: usize,
}

impl ExecutorConfig {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::Write, seq_base: 0, chat_capacity: DEFAULT_CHAT_CAPACITY }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_seq_base(mut self, seq_base: u64) -> Self {
        self.seq_base = seq_base;
        self
    }
}
