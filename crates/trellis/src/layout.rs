//! Layout delegates.
//!
//! A layout is an optional, single-use delegate owned by a widget. It sees
//! every message delivered to its widget before the widget's own hooks run,
//! and takes over propagation of geometry messages: a widget with a layout
//! does not broadcast `resize` to its children, its layout is expected to
//! size them. A layout is set once and lives until its widget is disposed.

use std::any::Any;

use crate::{Context, error::Result, message::Message};

/// A layout delegate.
pub trait Layout: Any {
    /// Called once when the layout is assigned to a widget. `ctx` is bound to
    /// that widget.
    fn init(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// Called for every message delivered to the owning widget, before the
    /// widget's hook.
    fn process_parent_message(&mut self, _ctx: &mut dyn Context, _msg: &Message) -> Result<()> {
        Ok(())
    }
}
