//! Trellis: a widget hierarchy toolkit.
//!
//! Trellis keeps a tree of widgets, each owning an element in a host
//! [`Document`], consistent under reparenting, show/hide,
//! attach/detach and disposal. All state changes are driven by messages: a
//! synchronous [`Core::send`] for causally ordered effects and a deferred,
//! compressible [`Core::post`] that is delivered on the next [`Core::flush`].
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Core`] - The widget arena and dispatch engine
//! - [`Widget`] - The trait implemented by all widgets
//! - [`Message`] - The lifecycle protocol message type
//!
//! # Module Organization
//!
//! - [`geom`] - Offset geometry
//! - [`layout`] - Layout delegates
//! - [`widget`] - The widget hook trait

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod geom;
pub mod layout;
pub mod widget;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
pub use core::{
    Config, Context, Core, CoreBuilder, TypedId, WidgetId,
    dispatch::{
        ChannelScheduler, Compressor, FlushRequest, HookId, ManualScheduler, MessageHook,
        Scheduler,
    },
    dump::dump,
    host::{Document, ElementId},
    lifecycle::LifeState,
    node::Node,
    message::{ChildMessage, CustomMessage, Message, MessageKind, ResizeMessage},
    signal::ConnectionId,
};
pub use core::{dispatch, error, host, message, state};

pub use layout::Layout;
pub use widget::{CloseOutcome, Widget};
