//! Scholaris event bus and notification infrastructure.
//!
//! In-process publish/subscribe hub for form lifecycle events:
//!
//! - [`EventBus`] — fan-out hub backed by `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope.
//!
//! Delivery to external channels (mail, in-app notification rows, webhooks)
//! is owned by subscriber services outside this crate; publishing never
//! blocks on them.

pub mod bus;

pub use bus::{event_types, EventBus, PlatformEvent};
