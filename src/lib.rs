//! tagtrail - event and tag tracking over a single-table store
//!
//! Accounts own members and time-stamped events; events carry free-form
//! tags. Every entity lives in one partition/sort-key table, with a manual
//! Tag/EventTag index that makes events searchable by tag and date.

pub mod composite_id;
pub mod config;
pub mod fanout;
pub mod gateway;
pub mod identity;
pub mod keys;
pub mod models;
pub mod query;
pub mod services;
pub mod slug;
pub mod storage;
pub mod utils;
pub mod validation;
