//! Observable client state
//!
//! Stores publish snapshots through `tokio::sync::watch`; callers read
//! them with `snapshot()` or react to changes via `subscribe()`.

mod message;
mod projects;

#[cfg(test)]
pub(crate) mod testing;

pub use message::{
    ClearPolicy, DEFAULT_MESSAGE_DURATION, Message, MessageKind, MessageStore,
    duration_from_millis,
};
pub use projects::{ProjectStore, ProjectsState};
