//! Feed refresh listener and its event types.

/// Feed payloads and broadcast outcomes.
pub mod events;
/// Listener task, batch decoding, and producer handle.
pub mod listener;
