//! Privileged ("system") actions and the policy that allows them

use std::fmt;
use std::str::FromStr;

use crate::{Collector, ContractError};

/// Closed set of system actions triggered through the `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Reset the statistics of one counter
    ClearCounter,
    /// Ask the runtime to reclaim memory
    Gc,
    /// Invalidate every live session
    InvalidateSessions,
    /// Invalidate the session named by `sessionId`
    InvalidateSession,
    /// Write a heap dump to the storage directory
    HeapDump,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::ClearCounter,
        Action::Gc,
        Action::InvalidateSessions,
        Action::InvalidateSession,
        Action::HeapDump,
    ];

    /// Request parameter token
    pub fn token(&self) -> &'static str {
        match self {
            Self::ClearCounter => "clear_counter",
            Self::Gc => "gc",
            Self::InvalidateSessions => "invalidate_sessions",
            Self::InvalidateSession => "invalidate_session",
            Self::HeapDump => "heap_dump",
        }
    }
}

impl FromStr for Action {
    type Err = ContractError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.token().eq_ignore_ascii_case(name))
            .ok_or_else(|| ContractError::UnknownAction {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Executes a resolved action and describes the outcome
pub trait ActionExecutor: Send + Sync {
    /// Run `action`; the returned message is shown on the next render
    ///
    /// # Errors
    /// Returns an error if the action cannot be carried out
    fn execute(
        &self,
        action: Action,
        collector: &dyn Collector,
        counter_name: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String, ContractError>;
}

/// Deployment decision on whether system actions are allowed at all
pub trait ActionPolicy: Send + Sync {
    fn system_actions_enabled(&self) -> bool;
}

/// Policy fixed at startup from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticActionPolicy {
    pub enabled: bool,
}

impl StaticActionPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl ActionPolicy for StaticActionPolicy {
    fn system_actions_enabled(&self) -> bool {
        self.enabled
    }
}
