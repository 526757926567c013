//! State Management Traits
//!
//! Snapshot and restore for components whose state must survive a restart.

/// Core trait for stateful components that can be persisted
pub trait Stateful {
    /// Error type for failed operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, Self::Error>;

    /// Replace the current state with a snapshot
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), Self::Error>;
}
