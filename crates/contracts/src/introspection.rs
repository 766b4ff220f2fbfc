//! Process, heap and session introspection interfaces

use crate::{
    ContractError, HeapHistogram, ProcessInformations, SessionInformations, ThreadInformations,
};

/// Runtime/OS introspection utilities
pub trait Introspection: Send + Sync {
    /// Heap histogram of the running process
    ///
    /// # Errors
    /// Returns [`ContractError::Introspection`] when collection fails
    fn heap_histogram(&self) -> Result<HeapHistogram, ContractError>;

    /// OS process list
    ///
    /// # Errors
    /// Returns [`ContractError::Introspection`] when collection fails
    fn processes(&self) -> Result<Vec<ProcessInformations>, ContractError>;

    /// Threads currently serving requests
    fn threads(&self) -> Vec<ThreadInformations>;
}

/// Live user session registry
pub trait SessionRegistry: Send + Sync {
    fn all_sessions(&self) -> Vec<SessionInformations>;

    fn session(&self, id: &str) -> Option<SessionInformations>;

    /// Invalidate every session, returning how many were dropped
    fn invalidate_all(&self) -> usize;

    /// Invalidate one session; `false` if it did not exist
    fn invalidate(&self, id: &str) -> bool;
}
