//! In-memory storage implementation.
//!
//! Backs the `memory` storage type and every test that needs a store.
//! Failure injection flags let tests exercise error propagation and the
//! partial fan-out window.

mod store;

pub use store::MockStore;
