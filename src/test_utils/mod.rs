//! Test helpers shared by unit and integration tests.
//!
//! Compiled for unit tests and, through the `test-util` feature, for the
//! integration tests under `tests/`.

pub mod memory_transport;

pub use memory_transport::MemoryTransport;
