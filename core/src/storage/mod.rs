//! Durable-storage contract for lock rows.
//!
//! The registry never blocks on storage: mutations are dispatched through
//! [`LockStore`] and forgotten. [`MemoryStore`] applies them synchronously
//! (tests, CLI); [`SpoolStore`] forwards them to a background writer task.

mod error;
mod row;
mod spool;
mod store;

pub use error::StoreError;
pub use row::{LockRow, SharedRow, StoreSnapshot};
pub use spool::SpoolStore;
pub use store::{LockStore, MemoryStore, StoreOp};
