use crate::{
    core::{host::Document, id::WidgetId, world::Core},
    error::Result,
    geom::Rect,
    message::Message,
    widget::Widget,
};

/// Context available to widget and layout hooks.
///
/// The context is bound to the widget whose hook is running. Everything a
/// hook does to the tree goes through the same operations as external code,
/// with the same checks and notifications.
pub trait Context {
    /// The widget whose hook is running.
    fn node_id(&self) -> WidgetId;

    /// Return the parent of a widget.
    fn parent_of(&self, id: WidgetId) -> Option<WidgetId>;

    /// Return the parent of the current widget.
    fn parent(&self) -> Option<WidgetId> {
        self.parent_of(self.node_id())
    }

    /// Children of a specific widget in order.
    fn children_of(&self, id: WidgetId) -> Vec<WidgetId>;

    /// Children of the current widget in order.
    fn children(&self) -> Vec<WidgetId> {
        self.children_of(self.node_id())
    }

    /// Is the widget attached?
    fn is_attached(&self, id: WidgetId) -> bool;

    /// Is the widget visible?
    fn is_visible(&self, id: WidgetId) -> bool;

    /// Is the widget explicitly hidden?
    fn is_hidden(&self, id: WidgetId) -> bool;

    /// Is the widget disposed?
    fn is_disposed(&self, id: WidgetId) -> bool;

    /// Cached offset geometry of a widget.
    fn geometry(&self, id: WidgetId) -> Option<Rect>;

    /// The host document.
    fn document(&self) -> &Document;

    /// The host document, mutably. Use this for presentation classes only;
    /// element structure belongs to the toolkit.
    fn document_mut(&mut self) -> &mut Document;

    /// Deliver a message synchronously.
    fn send(&mut self, target: WidgetId, msg: &Message);

    /// Queue a message for the next flush.
    fn post(&mut self, target: WidgetId, msg: Message);

    /// Post an `update-request`.
    fn update(&mut self, target: WidgetId) {
        self.post(target, Message::UpdateRequest);
    }

    /// Post a `layout-request`.
    fn request_layout(&mut self, target: WidgetId) {
        self.post(target, Message::LayoutRequest);
    }

    /// Post a `fit-request`.
    fn fit(&mut self, target: WidgetId) {
        self.post(target, Message::FitRequest);
    }

    /// Send a `close-request`.
    fn close(&mut self, target: WidgetId) {
        self.send(target, &Message::CloseRequest);
    }

    /// Add a new, detached widget to the arena.
    fn add(&mut self, widget: Box<dyn Widget>) -> WidgetId;

    /// Set or clear a widget's parent.
    fn set_parent(&mut self, child: WidgetId, parent: Option<WidgetId>) -> Result<()>;

    /// Insert `child` into `parent` at `index`, moving it if it is already a
    /// child.
    fn insert_child(&mut self, parent: WidgetId, index: usize, child: WidgetId) -> Result<()>;

    /// Append `child` to `parent`.
    fn add_child(&mut self, parent: WidgetId, child: WidgetId) -> Result<()> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Move the child at `from` to position `to` within `parent`.
    fn move_child(&mut self, parent: WidgetId, from: usize, to: usize) -> Result<()>;

    /// Remove `child` from `parent`.
    fn remove_child(&mut self, parent: WidgetId, child: WidgetId) -> Result<()>;

    /// Remove and return the child at `index`.
    fn remove_child_at(&mut self, parent: WidgetId, index: usize) -> Result<WidgetId>;

    /// Set a widget's hidden flag. Returns true if it changed.
    fn set_hidden(&mut self, id: WidgetId, hidden: bool) -> Result<bool>;

    /// Set a widget's offset geometry.
    fn set_geometry(&mut self, id: WidgetId, rect: Rect) -> Result<()>;

    /// Dispose a widget and its subtree.
    fn dispose(&mut self, id: WidgetId);
}

/// A [`Context`] backed by the [`Core`].
pub(crate) struct CoreContext<'a> {
    /// The core being operated on.
    core: &'a mut Core,
    /// The widget whose hook is running.
    node_id: WidgetId,
}

impl<'a> CoreContext<'a> {
    /// Bind a context to a widget.
    pub(crate) fn new(core: &'a mut Core, node_id: WidgetId) -> Self {
        Self { core, node_id }
    }
}

impl Context for CoreContext<'_> {
    fn node_id(&self) -> WidgetId {
        self.node_id
    }

    fn parent_of(&self, id: WidgetId) -> Option<WidgetId> {
        self.core.parent(id)
    }

    fn children_of(&self, id: WidgetId) -> Vec<WidgetId> {
        self.core.children(id).to_vec()
    }

    fn is_attached(&self, id: WidgetId) -> bool {
        self.core.is_attached(id)
    }

    fn is_visible(&self, id: WidgetId) -> bool {
        self.core.is_visible(id)
    }

    fn is_hidden(&self, id: WidgetId) -> bool {
        self.core.is_hidden(id)
    }

    fn is_disposed(&self, id: WidgetId) -> bool {
        self.core.is_disposed(id)
    }

    fn geometry(&self, id: WidgetId) -> Option<Rect> {
        self.core.geometry(id)
    }

    fn document(&self) -> &Document {
        self.core.document()
    }

    fn document_mut(&mut self) -> &mut Document {
        self.core.document_mut()
    }

    fn send(&mut self, target: WidgetId, msg: &Message) {
        self.core.send(target, msg);
    }

    fn post(&mut self, target: WidgetId, msg: Message) {
        self.core.post(target, msg);
    }

    fn add(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        self.core.add_boxed(widget)
    }

    fn set_parent(&mut self, child: WidgetId, parent: Option<WidgetId>) -> Result<()> {
        self.core.set_parent(child, parent)
    }

    fn insert_child(&mut self, parent: WidgetId, index: usize, child: WidgetId) -> Result<()> {
        self.core.insert_child(parent, index, child)
    }

    fn move_child(&mut self, parent: WidgetId, from: usize, to: usize) -> Result<()> {
        self.core.move_child(parent, from, to)
    }

    fn remove_child(&mut self, parent: WidgetId, child: WidgetId) -> Result<()> {
        self.core.remove_child(parent, child)
    }

    fn remove_child_at(&mut self, parent: WidgetId, index: usize) -> Result<WidgetId> {
        self.core.remove_child_at(parent, index)
    }

    fn set_hidden(&mut self, id: WidgetId, hidden: bool) -> Result<bool> {
        self.core.set_hidden(id, hidden)
    }

    fn set_geometry(&mut self, id: WidgetId, rect: Rect) -> Result<()> {
        self.core.set_geometry(id, rect)
    }

    fn dispose(&mut self, id: WidgetId) {
        self.core.dispose(id);
    }
}
