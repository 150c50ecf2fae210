use std::result::Result as StdResult;

use thiserror::Error;

use crate::core::{host::ElementId, id::WidgetId};

/// Result type for trellis operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Every structural operation validates its preconditions before mutating the
/// tree, so an error always leaves the tree in its pre-call state.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// The widget has been disposed, or its id is stale.
    #[error("widget is disposed: {0:?}")]
    Disposed(WidgetId),
    /// Parenting would make a widget its own ancestor.
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent.
        parent: WidgetId,
        /// Widget being parented.
        child: WidgetId,
    },
    /// Attach and detach only operate on root widgets.
    #[error("widget has a parent: {0:?}")]
    NotRoot(WidgetId),
    /// The widget is already attached to a host.
    #[error("widget is already attached: {0:?}")]
    AlreadyAttached(WidgetId),
    /// The widget is not attached to a host.
    #[error("widget is not attached: {0:?}")]
    NotAttached(WidgetId),
    /// The host element is not part of the live document.
    #[error("host is not attached to the document: {0:?}")]
    HostNotLive(ElementId),
    /// An attached root must be detached before it can be parented.
    #[error("widget is attached as a root: {0:?}")]
    AttachedRoot(WidgetId),
    /// A widget's layout can only be set once.
    #[error("layout already set: {0:?}")]
    LayoutAlreadySet(WidgetId),
    /// The widget is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent that was queried.
        parent: WidgetId,
        /// Widget that was expected to be a child.
        child: WidgetId,
    },
    /// A child index was out of range.
    #[error("child index {index} out of range for {parent:?}")]
    IndexOutOfRange {
        /// Parent that was queried.
        parent: WidgetId,
        /// Requested index.
        index: usize,
    },
    /// A hook was invoked on a widget whose hook is already running.
    #[error("re-entrant dispatch to {0:?}")]
    ReentrantDispatch(WidgetId),
    /// Invalid input error.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}
