#![allow(clippy::new_without_default)]
//! Core types for the Trellis widget toolkit.

/// Core builder and configuration.
pub mod builder;
/// Context handed to widget hooks.
pub mod context;
/// Message queueing, compression and delivery.
pub mod dispatch;
/// Debug dump utilities.
pub mod dump;
/// Core error types.
pub mod error;
/// Host document model.
pub mod host;
/// Node ID types.
pub mod id;
/// Lifecycle state machine and message processing.
pub mod lifecycle;
/// Lifecycle protocol messages.
pub mod message;
/// Node data stored in the arena.
pub mod node;
/// Notification signals.
pub mod signal;
/// Shared node name types.
pub mod state;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// The widget arena and structural operations.
pub mod world;

pub use builder::{Config, CoreBuilder};
pub use context::Context;
pub use id::{TypedId, WidgetId};
pub use world::Core;
