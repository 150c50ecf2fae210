//! The lifecycle state machine and the per-message processing table.
//!
//! A widget's attachment and visibility are a single [`LifeState`], changed
//! only by the lifecycle messages. The caller-settable `hidden` flag lives
//! beside it: a widget that is attached but hidden, or attached under an
//! invisible parent, is [`LifeState::AttachedHidden`].

use crate::{
    core::{id::WidgetId, message::MessageKind, world::Core},
    message::{ChildMessage, Message, ResizeMessage},
    widget::CloseOutcome,
};

/// Derived lifecycle state of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifeState {
    /// Not part of an attached tree.
    #[default]
    Detached,
    /// Attached, but hidden itself or below an invisible ancestor.
    AttachedHidden,
    /// Attached and visible.
    AttachedVisible,
    /// Disposed. Terminal.
    Disposed,
}

/// A state change requested by a lifecycle message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// `after-attach`; `visible` is computed from the hidden flag and parent.
    Attach {
        /// Whether the widget becomes visible.
        visible: bool,
    },
    /// `before-detach`.
    Detach,
    /// `after-show`.
    Show,
    /// `before-hide`.
    Hide,
    /// `dispose()`.
    Dispose,
}

impl LifeState {
    /// Return true if attached to a live host.
    pub fn is_attached(self) -> bool {
        matches!(self, Self::AttachedHidden | Self::AttachedVisible)
    }

    /// Return true if visible.
    pub fn is_visible(self) -> bool {
        self == Self::AttachedVisible
    }

    /// Return true if disposed.
    pub fn is_disposed(self) -> bool {
        self == Self::Disposed
    }

    /// The transition table. `None` marks an illegal transition.
    pub(crate) fn apply(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Disposed, _) => None,
            (_, Transition::Dispose) => Some(Self::Disposed),
            (Self::Detached, Transition::Attach { visible: true }) => Some(Self::AttachedVisible),
            (Self::Detached, Transition::Attach { visible: false }) => Some(Self::AttachedHidden),
            (Self::AttachedHidden | Self::AttachedVisible, Transition::Detach) => {
                Some(Self::Detached)
            }
            (Self::AttachedHidden, Transition::Show) => Some(Self::AttachedVisible),
            (Self::AttachedVisible, Transition::Hide) => Some(Self::AttachedHidden),
            _ => None,
        }
    }

    /// Return true if a widget in this state processes messages of `kind`.
    ///
    /// Lifecycle messages are only accepted where their transition is legal.
    /// A disposed widget only takes part in its own teardown.
    pub(crate) fn accepts(self, kind: MessageKind) -> bool {
        match (self, kind) {
            (
                Self::Disposed,
                MessageKind::BeforeDetach | MessageKind::BeforeHide | MessageKind::ChildRemoved,
            ) => true,
            (Self::Disposed, _) => false,
            (s, MessageKind::AfterAttach) => s == Self::Detached,
            (s, MessageKind::BeforeDetach) => s.is_attached(),
            (s, MessageKind::AfterShow) => s == Self::AttachedHidden,
            (s, MessageKind::BeforeHide) => s == Self::AttachedVisible,
            _ => true,
        }
    }
}

/// Which children a lifecycle message fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FanOut {
    /// Every child.
    All,
    /// Children that are not explicitly hidden.
    Unhidden,
}

/// Process a message delivered to `id`: update state, notify the layout, run
/// the widget hook and propagate.
pub(crate) fn process_message(core: &mut Core, id: WidgetId, msg: &Message) {
    let Some(state) = core.nodes.get(id).map(|n| n.state) else {
        return;
    };
    if !state.accepts(msg.kind()) {
        if state.is_disposed() {
            tracing::trace!(widget = ?id, message = msg.name(), "dropped: widget disposed");
        } else {
            tracing::warn!(widget = ?id, ?state, message = msg.name(), "dropped: illegal in state");
        }
        return;
    }

    match msg {
        Message::AfterAttach => {
            let visible = core.computed_visibility(id);
            core.transition(id, Transition::Attach { visible });
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_after_attach(ctx));
            fan_out(core, id, msg, FanOut::All);
        }
        Message::BeforeDetach => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_before_detach(ctx));
            fan_out(core, id, msg, FanOut::All);
            core.transition(id, Transition::Detach);
        }
        Message::AfterShow => {
            core.transition(id, Transition::Show);
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_after_show(ctx));
            fan_out(core, id, msg, FanOut::Unhidden);
        }
        Message::BeforeHide => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_before_hide(ctx));
            fan_out(core, id, msg, FanOut::Unhidden);
            core.transition(id, Transition::Hide);
        }
        Message::Resize(resize) => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_resize(ctx, resize));
            broadcast_unknown_size(core, id);
        }
        Message::UpdateRequest => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_update_request(ctx));
            broadcast_unknown_size(core, id);
        }
        Message::LayoutRequest => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_layout_request(ctx));
        }
        Message::FitRequest => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_fit_request(ctx));
        }
        Message::CloseRequest => {
            core.notify_layout(id, msg);
            if core.invoke(id, msg, |w, ctx| w.on_close_request(ctx)) == Some(CloseOutcome::Close) {
                close(core, id, msg);
            }
        }
        Message::ParentChanged => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_parent_changed(ctx));
        }
        Message::ChildAdded(child) => {
            core.notify_layout(id, msg);
            child_added(core, id, child);
            core.invoke(id, msg, |w, ctx| w.on_child_added(ctx, child));
        }
        Message::ChildRemoved(child) => {
            core.notify_layout(id, msg);
            child_removed(core, id, child);
            core.invoke(id, msg, |w, ctx| w.on_child_removed(ctx, child));
        }
        Message::ChildMoved(child) => {
            core.notify_layout(id, msg);
            core.place_child_element(id, child.child);
            core.invoke(id, msg, |w, ctx| w.on_child_moved(ctx, child));
        }
        Message::ChildShown(child) => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_child_shown(ctx, child));
        }
        Message::ChildHidden(child) => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_child_hidden(ctx, child));
        }
        Message::Custom(custom) => {
            core.notify_layout(id, msg);
            core.invoke(id, msg, |w, ctx| w.on_message(ctx, custom));
        }
    }
}

/// Send `msg` to the children of `id`.
fn fan_out(core: &mut Core, id: WidgetId, msg: &Message, which: FanOut) {
    for child in core.children(id).to_vec() {
        if which == FanOut::Unhidden && core.is_hidden(child) {
            continue;
        }
        // Children added by a hook mid-propagation already got this message.
        if !core.state(child).accepts(msg.kind()) {
            tracing::debug!(widget = ?child, message = msg.name(), "fan-out: already propagated");
            continue;
        }
        core.deliver(child, msg);
    }
}

/// Children of a widget without a layout get an unknown-size resize.
fn broadcast_unknown_size(core: &mut Core, id: WidgetId) {
    if core.node(id).is_some_and(|n| n.has_layout) {
        return;
    }
    fan_out(core, id, &Message::Resize(ResizeMessage::UNKNOWN), FanOut::All);
}

/// Default `child-added` handling: place the element, attach if needed.
fn child_added(core: &mut Core, id: WidgetId, msg: &ChildMessage) {
    if core.parent(msg.child) != Some(id) {
        return;
    }
    core.place_child_element(id, msg.child);
    if core.is_attached(id) {
        core.deliver(msg.child, &Message::AfterAttach);
    }
}

/// Default `child-removed` handling: detach if needed, take the element out.
fn child_removed(core: &mut Core, id: WidgetId, msg: &ChildMessage) {
    if core.parent(msg.child) == Some(id) {
        return;
    }
    // A child disposing itself is already `Disposed` but still takes part in
    // its own teardown, so only the parent's state decides.
    if core.is_attached(id) {
        core.deliver(msg.child, &Message::BeforeDetach);
    }
    core.take_child_element(id, msg.child);
}

/// Default `close-request` handling.
fn close(core: &mut Core, id: WidgetId, msg: &Message) {
    let result = if core.parent(id).is_some() {
        core.set_parent(id, None)
    } else if core.is_attached(id) {
        core.detach(id)
    } else {
        Ok(())
    };
    if let Err(e) = result {
        core.report(id, msg, &e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use LifeState::*;
        assert_eq!(
            Detached.apply(Transition::Attach { visible: true }),
            Some(AttachedVisible)
        );
        assert_eq!(
            Detached.apply(Transition::Attach { visible: false }),
            Some(AttachedHidden)
        );
        assert_eq!(AttachedHidden.apply(Transition::Show), Some(AttachedVisible));
        assert_eq!(AttachedVisible.apply(Transition::Hide), Some(AttachedHidden));
        assert_eq!(AttachedVisible.apply(Transition::Detach), Some(Detached));
        assert_eq!(AttachedHidden.apply(Transition::Detach), Some(Detached));
        assert_eq!(Detached.apply(Transition::Dispose), Some(Disposed));
        assert_eq!(AttachedVisible.apply(Transition::Dispose), Some(Disposed));

        assert_eq!(Detached.apply(Transition::Show), None);
        assert_eq!(Detached.apply(Transition::Detach), None);
        assert_eq!(AttachedVisible.apply(Transition::Attach { visible: true }), None);
        assert_eq!(AttachedVisible.apply(Transition::Show), None);
        assert_eq!(Disposed.apply(Transition::Attach { visible: true }), None);
        assert_eq!(Disposed.apply(Transition::Dispose), None);
    }

    #[test]
    fn visibility_implies_attachment() {
        for state in [
            LifeState::Detached,
            LifeState::AttachedHidden,
            LifeState::AttachedVisible,
            LifeState::Disposed,
        ] {
            if state.is_visible() {
                assert!(state.is_attached());
            }
            if state.is_disposed() {
                assert!(!state.is_attached());
            }
        }
    }

    #[test]
    fn disposed_only_accepts_teardown() {
        let s = LifeState::Disposed;
        assert!(s.accepts(MessageKind::BeforeDetach));
        assert!(s.accepts(MessageKind::ChildRemoved));
        assert!(!s.accepts(MessageKind::AfterAttach));
        assert!(!s.accepts(MessageKind::UpdateRequest));
        assert!(!s.accepts(MessageKind::ParentChanged));
    }

    #[test]
    fn lifecycle_messages_need_legal_state() {
        assert!(LifeState::Detached.accepts(MessageKind::AfterAttach));
        assert!(!LifeState::AttachedVisible.accepts(MessageKind::AfterAttach));
        assert!(!LifeState::Detached.accepts(MessageKind::BeforeDetach));
        assert!(!LifeState::Detached.accepts(MessageKind::AfterShow));
        assert!(!LifeState::AttachedHidden.accepts(MessageKind::BeforeHide));
        assert!(LifeState::Detached.accepts(MessageKind::Resize));
    }
}
