use std::{cell::RefCell, rc::Rc};

use crate::{WidgetId, core::dispatch::MessageHook, message::Message};

/// A shared, append-only record of `(widget, label)` pairs.
///
/// Clones share the same storage, so one handle can live in a test while
/// others are moved into widgets, layouts and hooks.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    /// Recorded entries in order.
    entries: Rc<RefCell<Vec<(WidgetId, String)>>>,
}

impl MessageLog {
    /// Construct an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, id: WidgetId, label: impl Into<String>) {
        self.entries.borrow_mut().push((id, label.into()));
    }

    /// A message hook that records every message delivered to its widget
    /// and never vetoes.
    pub fn hook(&self) -> impl MessageHook + 'static {
        let log = self.clone();
        move |id: WidgetId, msg: &Message| {
            log.record(id, msg.name());
            true
        }
    }

    /// Every entry in order.
    pub fn entries(&self) -> Vec<(WidgetId, String)> {
        self.entries.borrow().clone()
    }

    /// Labels recorded for one widget, in order.
    pub fn names_for(&self, id: WidgetId) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(w, _)| *w == id)
            .map(|(_, l)| l.clone())
            .collect()
    }

    /// Every label, in order, regardless of widget.
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(_, l)| l.clone()).collect()
    }

    /// Count entries for `id` with `label`.
    pub fn count(&self, id: WidgetId, label: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(w, l)| *w == id && l == label)
            .count()
    }

    /// Return true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
