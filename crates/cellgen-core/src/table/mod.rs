//! In-memory table host (UI-agnostic).
//!
//! [`Table`] plays the host platform's part: it owns fields and rows,
//! keeps a reverse dependency map, and calls into the computed field types
//! when fields are created or reconfigured and when rows change.

mod ops;
mod state;
mod store;

pub use state::Table;
pub use store::{MemoryStore, Rows};
