//! Shared storage integration tests.
//!
//! Tests the Store interface against all implementations. Each
//! implementation's test binary imports these functions and runs them.

pub mod store_tests;
