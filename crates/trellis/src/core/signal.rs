use std::fmt;

/// Identifies a connected slot so it can be disconnected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// A callback connected to a signal.
type Slot<T> = Box<dyn FnMut(&T)>;

/// A single-threaded notification signal.
///
/// Slots run in connection order.
pub struct Signal<T> {
    /// Connected slots.
    slots: Vec<(ConnectionId, Slot<T>)>,
    /// Next connection id.
    next: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next: 0,
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl<T> Signal<T> {
    /// Connect a slot.
    pub fn connect(&mut self, slot: impl FnMut(&T) + 'static) -> ConnectionId {
        let id = ConnectionId(self.next);
        self.next += 1;
        self.slots.push((id, Box::new(slot)));
        id
    }

    /// Disconnect a slot. Returns true if it was connected.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    /// Call every slot with `args`.
    pub fn emit(&mut self, args: &T) {
        for (_, slot) in &mut self.slots {
            slot(args);
        }
    }
}
