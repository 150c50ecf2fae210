use crate::{
    core::{
        dispatch::{Compressor, HookId, MessageHook},
        host::ElementId,
        id::WidgetId,
        lifecycle::LifeState,
        signal::Signal,
    },
    geom::Rect,
    layout::Layout,
    state::NodeName,
    widget::Widget,
};

/// Core node data stored in the arena.
pub struct Node {
    /// Widget behavior and state. Empty while one of its hooks is running.
    pub(crate) widget: Option<Box<dyn Widget>>,
    /// Layout delegate. Empty while it is being notified.
    pub(crate) layout: Option<Box<dyn Layout>>,
    /// Whether a layout has ever been assigned.
    pub(crate) has_layout: bool,

    /// Parent in the arena tree.
    pub(crate) parent: Option<WidgetId>,
    /// Children in the arena tree.
    pub(crate) children: Vec<WidgetId>,

    /// Derived lifecycle state.
    pub(crate) state: LifeState,
    /// The one caller-settable flag.
    pub(crate) hidden: bool,

    /// Host element owned by this widget.
    pub(crate) element: ElementId,
    /// Cached offset geometry.
    pub(crate) geometry: Option<Rect>,
    /// Widget name for traces and dumps.
    pub(crate) name: NodeName,
    /// The widget's compression policy.
    pub(crate) compress: Compressor,

    /// Emitted once when disposal starts.
    pub(crate) disposed: Signal<WidgetId>,
    /// Installed message hooks, oldest first.
    pub(crate) hooks: Vec<(HookId, Box<dyn MessageHook>)>,
}

impl Node {
    /// Construct a detached node.
    pub(crate) fn new(widget: Box<dyn Widget>, element: ElementId) -> Self {
        let name = widget.name();
        let compress = widget.compressor();
        Self {
            widget: Some(widget),
            layout: None,
            has_layout: false,
            parent: None,
            children: Vec::new(),
            state: LifeState::Detached,
            hidden: false,
            element,
            geometry: None,
            name,
            compress,
            disposed: Signal::default(),
            hooks: Vec::new(),
        }
    }

    /// Return the node's widget name.
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Return the node's parent, if any.
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Return the node's children.
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Return the lifecycle state.
    pub fn state(&self) -> LifeState {
        self.state
    }

    /// Return true if the node is explicitly hidden.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Return the host element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Return the cached offset geometry.
    pub fn geometry(&self) -> Option<Rect> {
        self.geometry
    }

    /// Return true if a layout has been assigned.
    pub fn has_layout(&self) -> bool {
        self.has_layout
    }
}
