use std::{any::Any, borrow::Cow, fmt, rc::Rc};

use crate::core::id::WidgetId;

/// The type tag of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// The widget's subtree was attached to a live host.
    AfterAttach,
    /// The widget's subtree is about to be detached from its host.
    BeforeDetach,
    /// The widget became visible.
    AfterShow,
    /// The widget is about to become invisible.
    BeforeHide,
    /// The widget's size changed.
    Resize,
    /// The widget should update its presentation.
    UpdateRequest,
    /// The widget should recompute the layout of its children.
    LayoutRequest,
    /// The widget should recompute its size constraints.
    FitRequest,
    /// The widget has been asked to close.
    CloseRequest,
    /// The widget's parent changed.
    ParentChanged,
    /// A child was added.
    ChildAdded,
    /// A child was removed.
    ChildRemoved,
    /// A child changed position among its siblings.
    ChildMoved,
    /// A child became unhidden.
    ChildShown,
    /// A child became hidden.
    ChildHidden,
    /// An application-defined message.
    Custom,
}

impl MessageKind {
    /// The protocol name of this kind, e.g. `"after-attach"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::AfterAttach => "after-attach",
            Self::BeforeDetach => "before-detach",
            Self::AfterShow => "after-show",
            Self::BeforeHide => "before-hide",
            Self::Resize => "resize",
            Self::UpdateRequest => "update-request",
            Self::LayoutRequest => "layout-request",
            Self::FitRequest => "fit-request",
            Self::CloseRequest => "close-request",
            Self::ParentChanged => "parent-changed",
            Self::ChildAdded => "child-added",
            Self::ChildRemoved => "child-removed",
            Self::ChildMoved => "child-moved",
            Self::ChildShown => "child-shown",
            Self::ChildHidden => "child-hidden",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload for messages about a specific child of the receiving widget.
///
/// Indices are `None` when unknown or not applicable: `child-added` carries
/// only a current index, `child-removed` only a previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildMessage {
    /// The child the message concerns.
    pub child: WidgetId,
    /// Index of the child before the change.
    pub previous_index: Option<usize>,
    /// Index of the child after the change.
    pub current_index: Option<usize>,
}

impl ChildMessage {
    /// A child message with no index information.
    pub fn new(child: WidgetId) -> Self {
        Self {
            child,
            previous_index: None,
            current_index: None,
        }
    }

    /// A child message with explicit indices.
    pub fn with_indices(
        child: WidgetId,
        previous_index: Option<usize>,
        current_index: Option<usize>,
    ) -> Self {
        Self {
            child,
            previous_index,
            current_index,
        }
    }
}

/// Payload for `resize`. `None` dimensions are unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeMessage {
    /// New width, if known.
    pub width: Option<u32>,
    /// New height, if known.
    pub height: Option<u32>,
}

impl ResizeMessage {
    /// The shared "size unknown" resize, broadcast by a parent that can't
    /// cheaply know its children's new sizes.
    pub const UNKNOWN: Self = Self {
        width: None,
        height: None,
    };

    /// A resize with a known size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Return true if neither dimension is known.
    pub fn is_unknown(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// An application-defined message.
///
/// Compressible custom messages collapse like the built-in requests: if one
/// with the same name is already pending for a widget, later posts are
/// dropped and only the first payload is ever delivered.
#[derive(Clone)]
pub struct CustomMessage {
    /// Message name, compared for compression.
    pub name: Cow<'static, str>,
    /// Whether pending duplicates collapse into one delivery.
    pub compressible: bool,
    /// Opaque payload.
    pub payload: Option<Rc<dyn Any>>,
}

impl CustomMessage {
    /// A non-compressible custom message without payload.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            compressible: false,
            payload: None,
        }
    }

    /// Mark the message as compressible.
    pub fn compressible(mut self) -> Self {
        self.compressible = true;
        self
    }

    /// Attach a payload.
    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    /// Borrow the payload as a concrete type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for CustomMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMessage")
            .field("name", &self.name)
            .field("compressible", &self.compressible)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// A message of the lifecycle protocol.
///
/// Messages are immutable values; the payload shapes are part of the variant.
#[derive(Debug, Clone)]
pub enum Message {
    /// See [`MessageKind::AfterAttach`].
    AfterAttach,
    /// See [`MessageKind::BeforeDetach`].
    BeforeDetach,
    /// See [`MessageKind::AfterShow`].
    AfterShow,
    /// See [`MessageKind::BeforeHide`].
    BeforeHide,
    /// See [`MessageKind::Resize`].
    Resize(ResizeMessage),
    /// See [`MessageKind::UpdateRequest`].
    UpdateRequest,
    /// See [`MessageKind::LayoutRequest`].
    LayoutRequest,
    /// See [`MessageKind::FitRequest`].
    FitRequest,
    /// See [`MessageKind::CloseRequest`].
    CloseRequest,
    /// See [`MessageKind::ParentChanged`].
    ParentChanged,
    /// See [`MessageKind::ChildAdded`].
    ChildAdded(ChildMessage),
    /// See [`MessageKind::ChildRemoved`].
    ChildRemoved(ChildMessage),
    /// See [`MessageKind::ChildMoved`].
    ChildMoved(ChildMessage),
    /// See [`MessageKind::ChildShown`].
    ChildShown(ChildMessage),
    /// See [`MessageKind::ChildHidden`].
    ChildHidden(ChildMessage),
    /// See [`MessageKind::Custom`].
    Custom(CustomMessage),
}

impl Message {
    /// Shorthand for a custom message.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(CustomMessage::new(name))
    }

    /// The type tag of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::AfterAttach => MessageKind::AfterAttach,
            Self::BeforeDetach => MessageKind::BeforeDetach,
            Self::AfterShow => MessageKind::AfterShow,
            Self::BeforeHide => MessageKind::BeforeHide,
            Self::Resize(_) => MessageKind::Resize,
            Self::UpdateRequest => MessageKind::UpdateRequest,
            Self::LayoutRequest => MessageKind::LayoutRequest,
            Self::FitRequest => MessageKind::FitRequest,
            Self::CloseRequest => MessageKind::CloseRequest,
            Self::ParentChanged => MessageKind::ParentChanged,
            Self::ChildAdded(_) => MessageKind::ChildAdded,
            Self::ChildRemoved(_) => MessageKind::ChildRemoved,
            Self::ChildMoved(_) => MessageKind::ChildMoved,
            Self::ChildShown(_) => MessageKind::ChildShown,
            Self::ChildHidden(_) => MessageKind::ChildHidden,
            Self::Custom(_) => MessageKind::Custom,
        }
    }

    /// The message's name: the protocol name for built-in kinds, the custom
    /// name otherwise.
    pub fn name(&self) -> &str {
        match self {
            Self::Custom(m) => &m.name,
            _ => self.kind().name(),
        }
    }

    /// Return true if pending duplicates of this message collapse into one
    /// delivery. Compressible messages carry no payload of their own.
    pub fn is_compressible(&self) -> bool {
        match self {
            Self::UpdateRequest | Self::LayoutRequest | Self::FitRequest | Self::CloseRequest => {
                true
            }
            Self::Custom(m) => m.compressible,
            _ => false,
        }
    }

    /// Return true if `other` is the same compressible message.
    pub fn compresses_with(&self, other: &Self) -> bool {
        self.is_compressible() && self.kind() == other.kind() && self.name() == other.name()
    }

    /// The child payload, for child messages.
    pub fn child(&self) -> Option<&ChildMessage> {
        match self {
            Self::ChildAdded(m)
            | Self::ChildRemoved(m)
            | Self::ChildMoved(m)
            | Self::ChildShown(m)
            | Self::ChildHidden(m) => Some(m),
            _ => None,
        }
    }
}
