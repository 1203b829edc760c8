//! In-memory adapters for tests and embedded use.

pub mod coordinator;

pub use coordinator::InMemorySweepCoordinator;
