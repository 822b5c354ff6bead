//! Data layer module
//!
//! Volatile local mirror of remote chat state:
//! - Users, direct conversations, messages
//! - Remote server records

mod models;
mod store;

pub use models::*;
pub use store::{MemoryStore, Store, StoreError};
