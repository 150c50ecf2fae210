//! Widget trait and close outcome types.

use std::any::{Any, type_name};

use crate::{
    Context,
    core::dispatch::{Compressor, default_compress},
    error::Result,
    message::{ChildMessage, CustomMessage, ResizeMessage},
    state::NodeName,
};

/// What to do after a `close-request` has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Remove the widget from its parent, or detach it if it is an attached
    /// root.
    Close,
    /// Leave the widget where it is.
    Keep,
}

/// Widgets are the behavior attached to nodes in the Core arena.
///
/// The framework owns all lifecycle state: by the time an `on_after_*` hook
/// runs the widget's flags are already updated, and `on_before_*` hooks run
/// while the old state still holds. Hooks on a widget are never re-entered;
/// a widget that wants to message itself from a hook should `post`.
pub trait Widget: Any {
    /// Name used for traces and debug dumps.
    fn name(&self) -> NodeName {
        let name = type_name::<Self>();
        let short = name.rsplit("::").next().unwrap_or(name);
        NodeName::convert(short)
    }

    /// Tag for the host element created for this widget.
    fn tag(&self) -> &str {
        "div"
    }

    /// Compression policy for messages posted to this widget.
    ///
    /// Read once when the widget is added, so it also applies to posts the
    /// widget makes to itself from its own hooks.
    fn compressor(&self) -> Compressor {
        default_compress
    }

    /// The widget's subtree was attached to a live host.
    fn on_after_attach(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// The widget's subtree is about to be detached.
    fn on_before_detach(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// The widget became visible.
    fn on_after_show(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// The widget is about to become invisible.
    fn on_before_hide(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// The widget was resized.
    fn on_resize(&mut self, _ctx: &mut dyn Context, _msg: &ResizeMessage) -> Result<()> {
        Ok(())
    }

    /// Posted update request.
    fn on_update_request(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// Posted layout request.
    fn on_layout_request(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// Posted fit request.
    fn on_fit_request(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// The widget was asked to close.
    fn on_close_request(&mut self, _ctx: &mut dyn Context) -> Result<CloseOutcome> {
        Ok(CloseOutcome::Close)
    }

    /// The widget's parent changed.
    fn on_parent_changed(&mut self, _ctx: &mut dyn Context) -> Result<()> {
        Ok(())
    }

    /// A child was added. Its element is already in place.
    fn on_child_added(&mut self, _ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        Ok(())
    }

    /// A child was removed. Its element has already been taken out.
    fn on_child_removed(&mut self, _ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        Ok(())
    }

    /// A child moved among its siblings.
    fn on_child_moved(&mut self, _ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        Ok(())
    }

    /// A child was unhidden.
    fn on_child_shown(&mut self, _ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        Ok(())
    }

    /// A child was hidden.
    fn on_child_hidden(&mut self, _ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        Ok(())
    }

    /// An application-defined message.
    fn on_message(&mut self, _ctx: &mut dyn Context, _msg: &CustomMessage) -> Result<()> {
        Ok(())
    }

    /// Called once when disposal starts, before any structural teardown.
    fn on_dispose(&mut self, _ctx: &mut dyn Context) {}
}

/// Convert widgets into boxed trait objects.
impl<W> From<W> for Box<dyn Widget>
where
    W: Widget + 'static,
{
    fn from(widget: W) -> Self {
        Box::new(widget)
    }
}
