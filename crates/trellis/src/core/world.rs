use std::{any::Any, collections::HashSet, mem};

use slotmap::SlotMap;

use crate::{
    core::{
        builder::{Config, CoreBuilder},
        context::{Context, CoreContext},
        dispatch::{Dispatcher, ExceptionHandler, HookId, MessageHook, Posted, Scheduler},
        host::{Document, ElementId},
        id::{TypedId, WidgetId},
        lifecycle::{self, LifeState, Transition},
        node::Node,
        signal::ConnectionId,
    },
    error::{Error, Result},
    geom::Rect,
    layout::Layout,
    message::{ChildMessage, Message, ResizeMessage},
    widget::Widget,
};

/// The widget arena and message dispatch engine.
///
/// All tree mutation goes through `Core`. Operations validate their
/// preconditions first and then drive the lifecycle protocol with synchronous
/// sends, so by the time an operation returns every affected widget has
/// received its notifications.
pub struct Core {
    /// Node storage arena.
    pub(crate) nodes: SlotMap<WidgetId, Node>,
    /// Host document.
    document: Document,
    /// Pending posted messages.
    dispatcher: Dispatcher,
    /// Sink for hook errors.
    exception_handler: ExceptionHandler,
    /// Static configuration.
    config: Config,
    /// Nesting depth of message deliveries.
    depth: usize,
}

impl Core {
    /// Create a core with default configuration and a manual scheduler.
    pub fn new() -> Self {
        CoreBuilder::new().build()
    }

    /// Start building a core.
    pub fn builder() -> CoreBuilder {
        CoreBuilder::new()
    }

    /// Assemble a core from its parts.
    pub(crate) fn from_parts(
        config: Config,
        document: Document,
        scheduler: Box<dyn Scheduler>,
        exception_handler: ExceptionHandler,
    ) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            document,
            dispatcher: Dispatcher::new(scheduler),
            exception_handler,
            config,
            depth: 0,
        }
    }

    /// Return the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the host document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Return the host document mutably.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Return a reference to a node by id.
    pub fn node(&self, id: impl Into<WidgetId>) -> Option<&Node> {
        self.nodes.get(id.into())
    }

    /// Return the ids of all live widgets.
    pub fn widgets(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.nodes.keys()
    }

    /// Return the ids of all widgets without a parent.
    pub fn roots(&self) -> Vec<WidgetId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Add a widget to the arena. It starts detached, unparented and visible
    /// in intent (not hidden).
    pub fn add<W>(&mut self, widget: W) -> TypedId<W>
    where
        W: Widget + 'static,
    {
        TypedId::new(self.add_boxed(Box::new(widget)))
    }

    /// Add a boxed widget to the arena.
    pub fn add_boxed(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        let element = self.document.create_element(widget.tag());
        self.document.add_class(element, &self.config.widget_class);
        let id = self.nodes.insert(Node::new(widget, element));
        tracing::trace!(widget = ?id, name = %self.nodes[id].name, "created");
        id
    }

    /// Borrow a widget as its concrete type.
    pub fn widget<W: Widget>(&self, id: impl Into<WidgetId>) -> Option<&W> {
        let widget = self.nodes.get(id.into())?.widget.as_deref()?;
        (widget as &dyn Any).downcast_ref::<W>()
    }

    /// Mutably borrow a widget as its concrete type.
    pub fn widget_mut<W: Widget>(&mut self, id: impl Into<WidgetId>) -> Option<&mut W> {
        let widget = self.nodes.get_mut(id.into())?.widget.as_deref_mut()?;
        (widget as &mut dyn Any).downcast_mut::<W>()
    }

    /// Borrow a widget's layout as its concrete type.
    pub fn layout<L: Layout>(&self, id: impl Into<WidgetId>) -> Option<&L> {
        let layout = self.nodes.get(id.into())?.layout.as_deref()?;
        (layout as &dyn Any).downcast_ref::<L>()
    }

    /// Return the host element of a widget.
    pub fn element(&self, id: impl Into<WidgetId>) -> Option<ElementId> {
        self.nodes.get(id.into()).map(|n| n.element)
    }

    /// Return the parent of a widget.
    pub fn parent(&self, id: impl Into<WidgetId>) -> Option<WidgetId> {
        self.nodes.get(id.into()).and_then(|n| n.parent)
    }

    /// Return the children of a widget in order.
    pub fn children(&self, id: impl Into<WidgetId>) -> &[WidgetId] {
        self.nodes
            .get(id.into())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// Return the position of `child` among the children of `parent`.
    pub fn child_index(&self, parent: impl Into<WidgetId>, child: impl Into<WidgetId>) -> Option<usize> {
        let child = child.into();
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Return the lifecycle state. Widgets no longer in the arena are
    /// reported as disposed.
    pub fn state(&self, id: impl Into<WidgetId>) -> LifeState {
        self.nodes
            .get(id.into())
            .map_or(LifeState::Disposed, |n| n.state)
    }

    /// Is the widget attached?
    pub fn is_attached(&self, id: impl Into<WidgetId>) -> bool {
        self.state(id).is_attached()
    }

    /// Is the widget visible?
    pub fn is_visible(&self, id: impl Into<WidgetId>) -> bool {
        self.state(id).is_visible()
    }

    /// Is the widget explicitly hidden?
    pub fn is_hidden(&self, id: impl Into<WidgetId>) -> bool {
        self.nodes.get(id.into()).is_some_and(|n| n.hidden)
    }

    /// Is the widget disposed?
    pub fn is_disposed(&self, id: impl Into<WidgetId>) -> bool {
        self.state(id).is_disposed()
    }

    /// Return true if `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: impl Into<WidgetId>, id: impl Into<WidgetId>) -> bool {
        let ancestor = ancestor.into();
        let mut current = Some(id.into());
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.parent(node_id);
        }
        false
    }

    /// Return the cached offset geometry of a widget.
    pub fn geometry(&self, id: impl Into<WidgetId>) -> Option<Rect> {
        self.nodes.get(id.into()).and_then(|n| n.geometry)
    }

    /// Return the number of messages waiting for the next flush.
    pub fn pending_messages(&self) -> usize {
        self.dispatcher.len()
    }

    /// Look up a widget that must not be disposed.
    fn live(&self, id: WidgetId) -> Result<&Node> {
        match self.nodes.get(id) {
            Some(node) if !node.state.is_disposed() => Ok(node),
            _ => Err(Error::Disposed(id)),
        }
    }

    /// Mutable variant of [`Self::live`].
    fn live_mut(&mut self, id: WidgetId) -> Result<&mut Node> {
        match self.nodes.get_mut(id) {
            Some(node) if !node.state.is_disposed() => Ok(node),
            _ => Err(Error::Disposed(id)),
        }
    }

    /// Deliver a message synchronously.
    ///
    /// Sending to a disposed widget is a no-op.
    pub fn send(&mut self, id: impl Into<WidgetId>, msg: &Message) {
        self.deliver(id.into(), msg);
    }

    /// Queue a message for the next flush.
    ///
    /// The widget's [`Widget::compressor`] sees the messages already
    /// pending for it and may drop the new one.
    pub fn post(&mut self, id: impl Into<WidgetId>, msg: Message) {
        let id = id.into();
        let compressed = {
            let Some(node) = self.nodes.get(id) else {
                tracing::trace!(widget = ?id, message = msg.name(), "post to missing widget");
                return;
            };
            if node.state.is_disposed() {
                tracing::trace!(widget = ?id, message = msg.name(), "post to disposed widget");
                return;
            }
            let pending = self.dispatcher.pending_for(id);
            (node.compress)(&msg, &pending)
        };
        if compressed {
            tracing::trace!(widget = ?id, message = msg.name(), "compressed");
            return;
        }
        tracing::trace!(widget = ?id, message = msg.name(), "posted");
        self.dispatcher.enqueue(id, msg);
    }

    /// Deliver every message posted before this call, in post order.
    ///
    /// Messages posted while flushing are left for the next flush. Returns
    /// the number of messages delivered.
    pub fn flush(&mut self) -> usize {
        let queue = self.dispatcher.take_queue();
        if queue.is_empty() {
            return 0;
        }
        tracing::debug!(pending = queue.len(), "flush");
        let mut delivered = 0;
        for Posted { handler, msg } in queue {
            if self.is_disposed(handler) {
                tracing::trace!(widget = ?handler, message = msg.name(), "dropped: disposed");
                continue;
            }
            self.deliver(handler, &msg);
            delivered += 1;
        }
        delivered
    }

    /// Post an `update-request`.
    pub fn update(&mut self, id: impl Into<WidgetId>) {
        self.post(id, Message::UpdateRequest);
    }

    /// Post a `layout-request`.
    pub fn request_layout(&mut self, id: impl Into<WidgetId>) {
        self.post(id, Message::LayoutRequest);
    }

    /// Post a `fit-request`.
    pub fn fit(&mut self, id: impl Into<WidgetId>) {
        self.post(id, Message::FitRequest);
    }

    /// Send a `close-request`.
    pub fn close(&mut self, id: impl Into<WidgetId>) {
        self.send(id, &Message::CloseRequest);
    }

    /// Route a message through the widget's hooks and process it.
    pub(crate) fn deliver(&mut self, id: WidgetId, msg: &Message) {
        let Some(node) = self.nodes.get_mut(id) else {
            tracing::trace!(widget = ?id, message = msg.name(), "send to missing widget");
            return;
        };
        for (_, hook) in node.hooks.iter_mut().rev() {
            if !hook.message_hook(id, msg) {
                tracing::trace!(widget = ?id, message = msg.name(), "vetoed by hook");
                return;
            }
        }
        tracing::trace!(widget = ?id, name = %node.name, message = msg.name(), "deliver");
        self.depth += 1;
        lifecycle::process_message(self, id, msg);
        self.depth -= 1;
        if self.depth == 0 {
            self.debug_assert_tree_invariants();
        }
    }

    /// Hand a hook error to the exception handler.
    pub(crate) fn report(&mut self, id: WidgetId, msg: &Message, err: &Error) {
        (self.exception_handler)(id, msg, err);
    }

    /// Take a mutable reference to a widget for a single call.
    pub(crate) fn with_widget_mut<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut Self) -> R,
    ) -> Result<R> {
        let node = self.nodes.get_mut(id).ok_or(Error::Disposed(id))?;
        let mut widget = node.widget.take().ok_or(Error::ReentrantDispatch(id))?;
        let out = f(&mut *widget, self);
        // The widget may have been disposed by its own hook.
        if let Some(node) = self.nodes.get_mut(id)
            && node.widget.is_none()
        {
            node.widget = Some(widget);
        }
        Ok(out)
    }

    /// Run a widget hook with a bound context, reporting failures.
    ///
    /// A widget whose hook is already running does not get a nested hook
    /// call.
    pub(crate) fn invoke<R>(
        &mut self,
        id: WidgetId,
        msg: &Message,
        f: impl FnOnce(&mut dyn Widget, &mut dyn Context) -> Result<R>,
    ) -> Option<R> {
        let result = self.with_widget_mut(id, |widget, core| {
            let mut ctx = CoreContext::new(core, id);
            f(widget, &mut ctx)
        });
        match result {
            Ok(Ok(value)) => Some(value),
            // The widget's own hook is further up the stack. The framework
            // side of the message has already run.
            Err(Error::ReentrantDispatch(_)) => {
                tracing::debug!(widget = ?id, message = msg.name(), "hook skipped: re-entrant");
                None
            }
            Ok(Err(e)) | Err(e) => {
                self.report(id, msg, &e);
                None
            }
        }
    }

    /// Take the layout out of its slot for a single call.
    fn with_layout_mut(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Layout, &mut dyn Context) -> Result<()>,
    ) -> Result<()> {
        let Some(mut layout) = self.nodes.get_mut(id).and_then(|n| n.layout.take()) else {
            return Ok(());
        };
        let result = {
            let mut ctx = CoreContext::new(self, id);
            f(&mut *layout, &mut ctx)
        };
        if let Some(node) = self.nodes.get_mut(id)
            && node.layout.is_none()
        {
            node.layout = Some(layout);
        }
        result
    }

    /// Give the layout, if any, its look at a message.
    pub(crate) fn notify_layout(&mut self, id: WidgetId, msg: &Message) {
        if let Err(e) = self.with_layout_mut(id, |layout, ctx| layout.process_parent_message(ctx, msg)) {
            self.report(id, msg, &e);
        }
    }

    /// Apply a lifecycle transition.
    pub(crate) fn transition(&mut self, id: WidgetId, transition: Transition) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        match node.state.apply(transition) {
            Some(next) => node.state = next,
            None if node.state.is_disposed() => {}
            None => tracing::warn!(widget = ?id, state = ?node.state, ?transition, "illegal transition"),
        }
    }

    /// Whether a widget being attached should be visible.
    pub(crate) fn computed_visibility(&self, id: WidgetId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        !node.hidden && node.parent.is_none_or(|p| self.is_visible(p))
    }

    /// Put a child's element at its position inside the parent's element.
    pub(crate) fn place_child_element(&mut self, parent: WidgetId, child: WidgetId) {
        let (Some(p), Some(c)) = (self.nodes.get(parent), self.nodes.get(child)) else {
            return;
        };
        let (parent_el, child_el) = (p.element, c.element);
        let Some(pos) = p.children.iter().position(|id| *id == child) else {
            return;
        };
        let before = p.children[pos + 1..]
            .iter()
            .filter_map(|s| self.nodes.get(*s).map(|n| n.element))
            .find(|el| {
                self.document
                    .element(*el)
                    .is_some_and(|e| e.parent() == Some(parent_el))
            });
        self.document.insert_before(parent_el, child_el, before);
    }

    /// Take a child's element out of the parent's element.
    pub(crate) fn take_child_element(&mut self, parent: WidgetId, child: WidgetId) {
        let (Some(p), Some(c)) = (self.nodes.get(parent), self.nodes.get(child)) else {
            return;
        };
        let (parent_el, child_el) = (p.element, c.element);
        if self
            .document
            .element(child_el)
            .is_some_and(|e| e.parent() == Some(parent_el))
        {
            self.document.remove(child_el);
        }
    }

    /// Attach a root widget's element to a live host and send `after-attach`.
    pub fn attach(&mut self, id: impl Into<WidgetId>, host: ElementId) -> Result<()> {
        let id = id.into();
        let node = self.live(id)?;
        if node.parent.is_some() {
            return Err(Error::NotRoot(id));
        }
        if node.state.is_attached() {
            return Err(Error::AlreadyAttached(id));
        }
        if !self.document.is_live(host) {
            return Err(Error::HostNotLive(host));
        }
        let element = node.element;
        tracing::debug!(widget = ?id, ?host, "attach");
        self.document.append_child(host, element);
        self.deliver(id, &Message::AfterAttach);
        Ok(())
    }

    /// Send `before-detach` to an attached root widget and take its element
    /// out of the host.
    pub fn detach(&mut self, id: impl Into<WidgetId>) -> Result<()> {
        let id = id.into();
        let node = self.live(id)?;
        if node.parent.is_some() {
            return Err(Error::NotRoot(id));
        }
        if !node.state.is_attached() {
            return Err(Error::NotAttached(id));
        }
        let element = node.element;
        tracing::debug!(widget = ?id, "detach");
        self.deliver(id, &Message::BeforeDetach);
        self.document.remove(element);
        Ok(())
    }

    /// Set or clear a widget's parent. A new parent receives the widget as
    /// its last child; setting the current parent again does nothing.
    pub fn set_parent(
        &mut self,
        child: impl Into<WidgetId>,
        parent: Option<WidgetId>,
    ) -> Result<()> {
        let child = child.into();
        if self.live(child)?.parent == parent {
            return Ok(());
        }
        self.reparent(child, parent, usize::MAX)
    }

    /// Append `child` to `parent`.
    pub fn add_child(&mut self, parent: impl Into<WidgetId>, child: impl Into<WidgetId>) -> Result<()> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Insert `child` into `parent` at `index`, clamped to the valid range.
    /// If `child` is already a child of `parent` it is moved instead.
    pub fn insert_child(
        &mut self,
        parent: impl Into<WidgetId>,
        index: usize,
        child: impl Into<WidgetId>,
    ) -> Result<()> {
        self.reparent(child.into(), Some(parent.into()), index)
    }

    /// Move the child at `from` to position `to`, clamped to the valid range.
    pub fn move_child(&mut self, parent: impl Into<WidgetId>, from: usize, to: usize) -> Result<()> {
        let parent = parent.into();
        let child = *self
            .live(parent)?
            .children
            .get(from)
            .ok_or(Error::IndexOutOfRange {
                parent,
                index: from,
            })?;
        self.move_within(parent, child, to)
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: impl Into<WidgetId>, child: impl Into<WidgetId>) -> Result<()> {
        let (parent, child) = (parent.into(), child.into());
        self.live(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(Error::NotAChild { parent, child });
        }
        self.reparent(child, None, 0)
    }

    /// Remove and return the child at `index`.
    pub fn remove_child_at(&mut self, parent: impl Into<WidgetId>, index: usize) -> Result<WidgetId> {
        let parent = parent.into();
        let child = *self
            .live(parent)?
            .children
            .get(index)
            .ok_or(Error::IndexOutOfRange { parent, index })?;
        self.reparent(child, None, 0)?;
        Ok(child)
    }

    /// The single reparenting step behind every container operation.
    fn reparent(&mut self, child: WidgetId, parent: Option<WidgetId>, index: usize) -> Result<()> {
        let node = self.live(child)?;
        let old = node.parent;
        let attached_root = old.is_none() && node.state.is_attached();
        if let Some(p) = parent {
            self.live(p)?;
            if self.contains(child, p) {
                return Err(Error::WouldCreateCycle { parent: p, child });
            }
            if attached_root {
                return Err(Error::AttachedRoot(child));
            }
        }

        if old == parent {
            return match parent {
                Some(p) => self.move_within(p, child, index),
                None => Ok(()),
            };
        }

        tracing::debug!(widget = ?child, from = ?old, to = ?parent, "reparent");
        self.unlink(child);
        if let Some(p) = parent {
            self.link(p, child, index);
        }
        self.deliver(child, &Message::ParentChanged);
        Ok(())
    }

    /// Remove a widget from its parent's children and notify the parent.
    fn unlink(&mut self, child: WidgetId) {
        let Some(old) = self.parent(child) else {
            return;
        };
        let previous = self.child_index(old, child);
        if let Some(node) = self.nodes.get_mut(old) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        self.deliver(
            old,
            &Message::ChildRemoved(ChildMessage::with_indices(child, previous, None)),
        );
    }

    /// Insert a widget into a parent's children and notify the parent.
    fn link(&mut self, parent: WidgetId, child: WidgetId, index: usize) {
        let Some(node) = self.nodes.get_mut(parent) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.deliver(
            parent,
            &Message::ChildAdded(ChildMessage::with_indices(child, None, Some(index))),
        );
    }

    /// Move a child within its parent and send `child-moved`.
    fn move_within(&mut self, parent: WidgetId, child: WidgetId, to: usize) -> Result<()> {
        let node = self.live_mut(parent)?;
        let from = node
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(Error::NotAChild { parent, child })?;
        let to = to.min(node.children.len() - 1);
        if from == to {
            return Ok(());
        }
        node.children.remove(from);
        node.children.insert(to, child);
        tracing::debug!(?parent, widget = ?child, from, to, "move");
        self.deliver(
            parent,
            &Message::ChildMoved(ChildMessage::with_indices(child, Some(from), Some(to))),
        );
        Ok(())
    }

    /// Set a widget's hidden flag. Returns true if the flag changed.
    ///
    /// A widget in a visible context gets `before-hide` before the flag is
    /// set, or `after-show` after it is cleared. Its parent then receives
    /// `child-hidden` or `child-shown`.
    pub fn set_hidden(&mut self, id: impl Into<WidgetId>, hidden: bool) -> Result<bool> {
        let id = id.into();
        let node = self.live(id)?;
        if node.hidden == hidden {
            return Ok(false);
        }
        let in_visible_context =
            node.state.is_attached() && node.parent.is_none_or(|p| self.is_visible(p));
        let element = node.element;
        tracing::debug!(widget = ?id, hidden, "set hidden");

        if hidden {
            if in_visible_context {
                self.deliver(id, &Message::BeforeHide);
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.hidden = true;
            }
            self.document.add_class(element, &self.config.hidden_class);
        } else {
            if let Some(node) = self.nodes.get_mut(id) {
                node.hidden = false;
            }
            self.document.remove_class(element, &self.config.hidden_class);
            if in_visible_context {
                self.deliver(id, &Message::AfterShow);
            }
        }

        if let Some(parent) = self.parent(id) {
            let msg = ChildMessage::new(id);
            let msg = if hidden {
                Message::ChildHidden(msg)
            } else {
                Message::ChildShown(msg)
            };
            self.deliver(parent, &msg);
        }
        Ok(true)
    }

    /// Hide a widget. Returns true if the flag changed.
    pub fn hide(&mut self, id: impl Into<WidgetId>) -> Result<bool> {
        self.set_hidden(id, true)
    }

    /// Show a widget. Returns true if the flag changed.
    pub fn show(&mut self, id: impl Into<WidgetId>) -> Result<bool> {
        self.set_hidden(id, false)
    }

    /// Give a widget its layout. A layout can be set once.
    pub fn set_layout(&mut self, id: impl Into<WidgetId>, layout: Box<dyn Layout>) -> Result<()> {
        let id = id.into();
        if self.live(id)?.has_layout {
            return Err(Error::LayoutAlreadySet(id));
        }
        let mut layout = layout;
        {
            let mut ctx = CoreContext::new(self, id);
            layout.init(&mut ctx)?;
        }
        let node = self.live_mut(id)?;
        if node.has_layout {
            return Err(Error::LayoutAlreadySet(id));
        }
        node.layout = Some(layout);
        node.has_layout = true;
        tracing::debug!(widget = ?id, "layout set");
        Ok(())
    }

    /// Set a widget's offset geometry, sending `resize` when the size
    /// changes.
    pub fn set_geometry(&mut self, id: impl Into<WidgetId>, rect: Rect) -> Result<()> {
        let id = id.into();
        let previous = self.live_mut(id)?.geometry.replace(rect);
        if previous.is_none_or(|p| p.size_differs(&rect)) {
            self.deliver(id, &Message::Resize(ResizeMessage::new(rect.w, rect.h)));
        }
        Ok(())
    }

    /// Install a message hook. Hooks run most recently installed first.
    pub fn install_message_hook(
        &mut self,
        id: impl Into<WidgetId>,
        hook: impl MessageHook + 'static,
    ) -> Result<HookId> {
        let id = id.into();
        self.live(id)?;
        let hook_id = self.dispatcher.next_hook_id();
        self.live_mut(id)?.hooks.push((hook_id, Box::new(hook)));
        Ok(hook_id)
    }

    /// Remove a message hook. Returns true if it was installed.
    pub fn remove_message_hook(&mut self, id: impl Into<WidgetId>, hook: HookId) -> bool {
        let Some(node) = self.nodes.get_mut(id.into()) else {
            return false;
        };
        let before = node.hooks.len();
        node.hooks.retain(|(h, _)| *h != hook);
        node.hooks.len() != before
    }

    /// Connect to a widget's `disposed` notification.
    pub fn on_disposed(
        &mut self,
        id: impl Into<WidgetId>,
        slot: impl FnMut(&WidgetId) + 'static,
    ) -> Result<ConnectionId> {
        Ok(self.live_mut(id.into())?.disposed.connect(slot))
    }

    /// Disconnect from a widget's `disposed` notification.
    pub fn disconnect_disposed(&mut self, id: impl Into<WidgetId>, conn: ConnectionId) -> bool {
        self.nodes
            .get_mut(id.into())
            .is_some_and(|n| n.disposed.disconnect(conn))
    }

    /// Dispose a widget and its subtree. Disposing twice is a no-op.
    ///
    /// The `disposed` notification fires first. The widget then leaves its
    /// parent (or its host, if it is an attached root), its children are
    /// unparented and disposed in order, and finally its pending messages,
    /// hooks, subscriptions, geometry and element are released.
    pub fn dispose(&mut self, id: impl Into<WidgetId>) {
        let id = id.into();
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let Some(next) = node.state.apply(Transition::Dispose) else {
            return;
        };
        let was_attached = node.state.is_attached();
        node.state = next;
        let mut disposed = mem::take(&mut node.disposed);
        tracing::debug!(widget = ?id, name = %node.name, "dispose");
        disposed.emit(&id);
        drop(disposed);

        let hook = self.with_widget_mut(id, |widget, core| {
            let mut ctx = CoreContext::new(core, id);
            widget.on_dispose(&mut ctx);
        });
        if let Err(e) = hook {
            tracing::trace!(widget = ?id, "dispose hook skipped: {e}");
        }

        if self.parent(id).is_some() {
            self.unlink(id);
        } else if was_attached {
            self.deliver(id, &Message::BeforeDetach);
            if let Some(element) = self.element(id) {
                self.document.remove(element);
            }
        }

        let children = self
            .nodes
            .get_mut(id)
            .map(|n| mem::take(&mut n.children))
            .unwrap_or_default();
        for child in &children {
            if let Some(node) = self.nodes.get_mut(*child) {
                node.parent = None;
            }
        }
        for child in children {
            self.dispose(child);
        }

        let dropped = self.dispatcher.clear_handler(id);
        if let Some(node) = self.nodes.remove(id) {
            self.document.destroy(node.element);
        }
        tracing::trace!(widget = ?id, dropped, "released");
        if self.depth == 0 {
            self.debug_assert_tree_invariants();
        }
    }

    /// Check every tree invariant, returning a description of the first
    /// violation.
    ///
    /// Invariants only hold between operations, not while messages are
    /// being dispatched.
    pub fn check_invariants(&self) -> Result<()> {
        self.check_links()?;
        for (id, node) in self.nodes.iter() {
            if node.state.is_disposed() {
                return Err(Error::Internal(format!("disposed widget {id:?} still in arena")));
            }
            let expect_visible = match node.parent {
                Some(parent) => {
                    let parent_state = self.state(parent);
                    if node.state.is_attached() != parent_state.is_attached() {
                        return Err(Error::Internal(format!(
                            "{id:?} attachment differs from parent {parent:?}"
                        )));
                    }
                    node.state.is_attached() && !node.hidden && parent_state.is_visible()
                }
                None => {
                    if node.state.is_attached() && !self.document.is_live(node.element) {
                        return Err(Error::Internal(format!(
                            "attached root {id:?} is not in the live document"
                        )));
                    }
                    node.state.is_attached() && !node.hidden
                }
            };
            if node.state.is_visible() != expect_visible {
                return Err(Error::Internal(format!(
                    "{id:?} visibility is {}, expected {expect_visible}",
                    node.state.is_visible()
                )));
            }
        }
        Ok(())
    }

    /// Check parent/child linkage and acyclicity.
    fn check_links(&self) -> Result<()> {
        for (id, node) in self.nodes.iter() {
            let mut seen = HashSet::with_capacity(node.children.len());
            for child in &node.children {
                if !seen.insert(*child) {
                    return Err(Error::Internal(format!("duplicate child {child:?} under {id:?}")));
                }
                if self.parent(*child) != Some(id) {
                    return Err(Error::Internal(format!(
                        "child {child:?} parent mismatch under {id:?}"
                    )));
                }
            }
            if let Some(parent) = node.parent {
                let count = self.children(parent).iter().filter(|c| **c == id).count();
                if count != 1 {
                    return Err(Error::Internal(format!(
                        "parent {parent:?} lists {id:?} {count} times"
                    )));
                }
            }
            let mut chain = HashSet::new();
            let mut current = Some(id);
            while let Some(node_id) = current {
                if !chain.insert(node_id) {
                    return Err(Error::Internal(format!("cycle detected from {id:?}")));
                }
                current = self.parent(node_id);
            }
        }
        Ok(())
    }

    /// Assert structural invariants on the tree in debug builds.
    #[cfg(debug_assertions)]
    fn debug_assert_tree_invariants(&self) {
        if let Err(e) = self.check_links() {
            debug_assert!(false, "tree invariant violated: {e}");
        }
    }

    /// Release builds skip the tree check.
    #[cfg(not(debug_assertions))]
    fn debug_assert_tree_invariants(&self) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{harness::Harness, probe::Probe};

    #[test]
    fn add_creates_detached_widget() {
        let mut h = Harness::new();
        let id = h.probe("a");
        assert_eq!(h.core.state(id), LifeState::Detached);
        assert_eq!(h.core.parent(id), None);
        assert!(h.core.children(id).is_empty());
        assert!(!h.core.is_hidden(id));
        let el = h.core.element(id).unwrap();
        assert_eq!(h.core.document().element(el).unwrap().tag(), "div");
        assert!(h.core.document().has_class(el, "trellis-widget"));
        assert!(h.log.is_empty());
    }

    #[test]
    fn typed_access() {
        let mut core = Core::new();
        let log = crate::testing::log::MessageLog::new();
        let id = core.add(Probe::named(&log, "typed"));
        assert_eq!(
            core.widget::<Probe>(id).map(|p| p.name().to_string()),
            Some("typed".to_string())
        );
        assert!(core.widget_mut::<Probe>(id).is_some());
        core.dispose(id);
        assert!(core.widget::<Probe>(id).is_none());
    }

    #[test]
    fn attach_checks_preconditions() -> Result<()> {
        let mut h = Harness::new();
        let (root, kids) = h.tree("root", &["kid"])?;
        let orphan = h.core.document_mut().create_element("div");

        assert_eq!(h.core.attach(kids[0], h.host), Err(Error::NotRoot(kids[0])));
        assert_eq!(h.core.attach(root, orphan), Err(Error::HostNotLive(orphan)));
        assert_eq!(h.core.detach(root), Err(Error::NotAttached(root)));
        h.attach(root)?;
        assert_eq!(h.attach(root), Err(Error::AlreadyAttached(root)));
        assert_eq!(h.core.detach(kids[0]), Err(Error::NotRoot(kids[0])));
        h.core.check_invariants()
    }

    #[test]
    fn reparent_rejects_cycles() -> Result<()> {
        let mut h = Harness::new();
        let a = h.probe("a");
        let b = h.probe("b");
        h.core.add_child(a, b)?;
        assert_eq!(
            h.core.set_parent(a, Some(b)),
            Err(Error::WouldCreateCycle { parent: b, child: a })
        );
        assert_eq!(
            h.core.set_parent(a, Some(a)),
            Err(Error::WouldCreateCycle { parent: a, child: a })
        );
        assert_eq!(h.core.parent(a), None);
        assert_eq!(h.core.children(a), &[b]);
        Ok(())
    }

    #[test]
    fn attached_root_cannot_be_parented() -> Result<()> {
        let mut h = Harness::new();
        let a = h.probe("a");
        let b = h.probe("b");
        h.attach(a)?;
        assert_eq!(h.core.set_parent(a, Some(b)), Err(Error::AttachedRoot(a)));
        h.core.detach(a)?;
        h.core.set_parent(a, Some(b))?;
        assert_eq!(h.core.parent(a), Some(b));
        Ok(())
    }

    #[test]
    fn reparent_notifies_both_parents() -> Result<()> {
        let mut h = Harness::new();
        let (p1, kids) = h.tree("p1", &["x", "c"])?;
        let p2 = h.probe("p2");
        let c = kids[1];
        h.log.clear();

        h.core.set_parent(c, Some(p2))?;
        assert_eq!(h.names(p1), vec!["child-removed"]);
        assert_eq!(h.names(p2), vec!["child-added"]);
        assert_eq!(h.names(c), vec!["parent-changed"]);
        assert_eq!(h.core.children(p1), &[kids[0]]);
        assert_eq!(h.core.children(p2), &[c]);

        let p2_el = h.core.element(p2).unwrap();
        let c_el = h.core.element(c).unwrap();
        assert_eq!(h.core.document().element(c_el).unwrap().parent(), Some(p2_el));
        Ok(())
    }

    #[test]
    fn same_parent_is_a_noop() -> Result<()> {
        let mut h = Harness::new();
        let (p, kids) = h.tree("p", &["c"])?;
        h.log.clear();
        h.core.set_parent(kids[0], Some(p))?;
        h.core.set_parent(p, None)?;
        assert!(h.log.is_empty());
        Ok(())
    }

    #[test]
    fn insert_and_move_children() -> Result<()> {
        let mut h = Harness::new();
        let (p, kids) = h.tree("p", &["a", "b"])?;
        let c = h.probe("c");
        h.core.insert_child(p, 0, c)?;
        assert_eq!(h.core.children(p), &[c, kids[0], kids[1]]);

        h.log.clear();
        h.core.move_child(p, 0, 99)?;
        assert_eq!(h.core.children(p), &[kids[0], kids[1], c]);
        assert_eq!(h.names(p), vec!["child-moved"]);

        // Element order follows widget order.
        let p_el = h.core.element(p).unwrap();
        let order: Vec<ElementId> = h
            .core
            .children(p)
            .iter()
            .filter_map(|id| h.core.element(*id))
            .collect();
        assert_eq!(h.core.document().element(p_el).unwrap().children(), order.as_slice());

        h.core.insert_child(p, 1, c)?;
        assert_eq!(h.core.children(p), &[kids[0], c, kids[1]]);
        assert_eq!(h.core.child_index(p, c), Some(1));
        Ok(())
    }

    #[test]
    fn remove_child_errors() -> Result<()> {
        let mut h = Harness::new();
        let (p, kids) = h.tree("p", &["a"])?;
        let stray = h.probe("stray");
        assert_eq!(
            h.core.remove_child(p, stray),
            Err(Error::NotAChild { parent: p, child: stray })
        );
        assert_eq!(
            h.core.remove_child_at(p, 3),
            Err(Error::IndexOutOfRange { parent: p, index: 3 })
        );
        assert_eq!(h.core.remove_child_at(p, 0)?, kids[0]);
        assert!(h.core.children(p).is_empty());
        Ok(())
    }

    #[test]
    fn hide_and_show_update_marker_class() -> Result<()> {
        let mut h = Harness::new();
        let id = h.probe("a");
        let el = h.core.element(id).unwrap();

        assert!(h.core.hide(id)?);
        assert!(!h.core.hide(id)?);
        assert!(h.core.document().has_class(el, "trellis-mod-hidden"));
        assert!(h.core.show(id)?);
        assert!(!h.core.document().has_class(el, "trellis-mod-hidden"));
        // Detached widgets get no visibility messages.
        assert!(h.log.is_empty());
        Ok(())
    }

    #[test]
    fn geometry_resize() -> Result<()> {
        let mut h = Harness::new();
        let id = h.probe("a");
        h.core.set_geometry(id, Rect::new(0, 0, 10, 5))?;
        h.core.set_geometry(id, Rect::new(3, 4, 10, 5))?;
        h.core.set_geometry(id, Rect::new(3, 4, 11, 5))?;
        assert_eq!(h.log.count(id, "resize"), 2);
        assert_eq!(h.core.geometry(id), Some(Rect::new(3, 4, 11, 5)));
        Ok(())
    }

    #[test]
    fn layout_set_once() -> Result<()> {
        let mut h = Harness::new();
        let id = h.probe("a");
        h.recording_layout(id)?;
        assert_eq!(h.names(id), vec!["layout:init"]);
        assert_eq!(h.recording_layout(id), Err(Error::LayoutAlreadySet(id)));
        assert!(h.core.node(id).unwrap().has_layout());
        Ok(())
    }

    #[test]
    fn operations_on_disposed_widget_fail() {
        let mut h = Harness::new();
        let a = h.probe("a");
        let b = h.probe("b");
        h.core.dispose(a);
        assert_eq!(h.core.attach(a, h.host), Err(Error::Disposed(a)));
        assert_eq!(h.core.add_child(b, a), Err(Error::Disposed(a)));
        assert_eq!(h.core.add_child(a, b), Err(Error::Disposed(a)));
        assert_eq!(h.core.hide(a), Err(Error::Disposed(a)));
        assert!(h.core.install_message_hook(a, |_: WidgetId, _: &Message| true).is_err());
        assert!(h.core.is_disposed(a));
        assert_eq!(h.core.state(a), LifeState::Disposed);
    }

    #[test]
    fn hook_errors_reach_exception_handler() -> Result<()> {
        let mut h = Harness::new();
        let id = h.add_probe(
            Probe::named(&h.log.clone(), "bad").fail_on(crate::message::MessageKind::AfterAttach),
        );
        h.attach(id)?;
        // The failure is reported but the state change stands.
        assert!(h.core.is_visible(id));
        let errors = h.errors.borrow();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, id);
        assert_eq!(errors[0].1, "after-attach");
        Ok(())
    }

    #[test]
    fn message_hooks_run_newest_first_and_veto() -> Result<()> {
        let mut h = Harness::new();
        let id = h.probe("a");
        let order = crate::testing::log::MessageLog::new();
        let first = order.clone();
        h.core.install_message_hook(id, move |w: WidgetId, _: &Message| {
            first.record(w, "first");
            true
        })?;
        let second = order.clone();
        let veto = h.core.install_message_hook(id, move |w: WidgetId, m: &Message| {
            second.record(w, "second");
            !matches!(m, Message::UpdateRequest)
        })?;

        h.core.send(id, &Message::UpdateRequest);
        assert_eq!(order.names(), vec!["second"]);
        assert!(h.names(id).is_empty());

        order.clear();
        assert!(h.core.remove_message_hook(id, veto));
        assert!(!h.core.remove_message_hook(id, veto));
        h.core.send(id, &Message::UpdateRequest);
        assert_eq!(order.names(), vec!["first"]);
        assert_eq!(h.names(id), vec!["update-request"]);
        Ok(())
    }

    #[test]
    fn dump_names_children() -> Result<()> {
        let mut h = Harness::new();
        let (root, _) = h.tree("root", &["left", "right"])?;
        let out = crate::dump(&h.core, root)?;
        assert!(out.contains("root"));
        assert!(out.contains("left"));
        assert!(out.contains("right"));
        Ok(())
    }
}
