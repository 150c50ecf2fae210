//! Deferred message delivery.
//!
//! [`Core::post`](crate::Core::post) appends to a single pending queue owned by
//! the [`Dispatcher`]. The first post after a flush asks the [`Scheduler`] for a
//! flush; the host's run loop answers by calling
//! [`Core::flush`](crate::Core::flush) once per tick. A flush swaps the queue
//! out before delivering, so messages posted during delivery wait for the next
//! tick.

use std::{
    cell::Cell,
    collections::VecDeque,
    fmt, mem,
    rc::Rc,
    sync::mpsc,
};

use crate::core::{error::Error, id::WidgetId, message::Message};

/// Receives requests to run a flush on the next scheduling tick.
///
/// The dispatcher calls [`Scheduler::schedule_flush`] at most once between
/// two flushes.
pub trait Scheduler {
    /// Arrange for [`Core::flush`](crate::Core::flush) to be called soon.
    fn schedule_flush(&mut self);
}

/// A scheduler that only counts requests. Tests and embedders that own their
/// loop flush explicitly.
///
/// Clones share the same counter, so a test can keep one handle and give
/// another to the builder.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    /// Number of flush requests not yet taken.
    requests: Rc<Cell<usize>>,
}

impl ManualScheduler {
    /// Construct a scheduler with no outstanding requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of outstanding flush requests.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    /// Return and reset the number of outstanding flush requests.
    pub fn take(&self) -> usize {
        self.requests.replace(0)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_flush(&mut self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Marker sent by [`ChannelScheduler`] when a flush is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushRequest;

/// A scheduler that wakes a run loop through a channel.
#[derive(Debug)]
pub struct ChannelScheduler {
    /// Sender half of the run loop channel.
    tx: mpsc::Sender<FlushRequest>,
}

impl ChannelScheduler {
    /// Construct a scheduler sending on `tx`.
    pub fn new(tx: mpsc::Sender<FlushRequest>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ChannelScheduler {
    fn schedule_flush(&mut self) {
        if self.tx.send(FlushRequest).is_err() {
            tracing::debug!("flush request dropped: run loop has gone away");
        }
    }
}

/// Intercepts messages before a widget processes them.
///
/// Hooks see both sent and posted messages. Returning `false` stops delivery:
/// later hooks and the widget itself never see the message. Vetoing
/// lifecycle messages leaves the widget's state untouched, so it is best
/// reserved for requests and custom messages.
pub trait MessageHook {
    /// Inspect a message addressed to `handler`.
    fn message_hook(&mut self, handler: WidgetId, msg: &Message) -> bool;
}

impl<F> MessageHook for F
where
    F: FnMut(WidgetId, &Message) -> bool,
{
    fn message_hook(&mut self, handler: WidgetId, msg: &Message) -> bool {
        self(handler, msg)
    }
}

/// Identifies an installed message hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Called when a widget hook returns an error during delivery.
pub type ExceptionHandler = Box<dyn FnMut(WidgetId, &Message, &Error)>;

/// The default exception handler: log and carry on.
pub fn log_exception(handler: WidgetId, msg: &Message, err: &Error) {
    tracing::error!(?handler, message = msg.name(), "message handler failed: {err}");
}

/// A compression policy: given a newly posted message and the messages
/// already pending for the same handler, return `true` to drop it.
pub type Compressor = fn(&Message, &[&Message]) -> bool;

/// The default compression policy: drop a compressible message when an
/// equivalent one is already pending for the same handler.
pub fn default_compress(msg: &Message, pending: &[&Message]) -> bool {
    msg.is_compressible() && pending.iter().any(|p| msg.compresses_with(p))
}

/// A queued message.
#[derive(Debug)]
pub(crate) struct Posted {
    /// Receiving widget.
    pub(crate) handler: WidgetId,
    /// The message.
    pub(crate) msg: Message,
}

/// The pending queue and its scheduling state.
pub(crate) struct Dispatcher {
    /// Messages waiting for the next flush, in post order.
    queue: VecDeque<Posted>,
    /// Whether a flush has been requested since the last one ran.
    scheduled: bool,
    /// Flush request sink.
    scheduler: Box<dyn Scheduler>,
    /// Next message hook id.
    next_hook: u64,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queue", &self.queue)
            .field("scheduled", &self.scheduled)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Construct an empty dispatcher.
    pub(crate) fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            queue: VecDeque::new(),
            scheduled: false,
            scheduler,
            next_hook: 0,
        }
    }

    /// Messages pending for `handler`, oldest first.
    pub(crate) fn pending_for(&self, handler: WidgetId) -> Vec<&Message> {
        self.queue
            .iter()
            .filter(|p| p.handler == handler)
            .map(|p| &p.msg)
            .collect()
    }

    /// Return the number of queued messages.
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queue a message, requesting a flush if none is outstanding.
    pub(crate) fn enqueue(&mut self, handler: WidgetId, msg: Message) {
        self.queue.push_back(Posted { handler, msg });
        if !self.scheduled {
            self.scheduled = true;
            self.scheduler.schedule_flush();
        }
    }

    /// Swap out the pending queue for an empty one.
    pub(crate) fn take_queue(&mut self) -> VecDeque<Posted> {
        self.scheduled = false;
        mem::take(&mut self.queue)
    }

    /// Drop every pending message for `handler`.
    pub(crate) fn clear_handler(&mut self, handler: WidgetId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|p| p.handler != handler);
        before - self.queue.len()
    }

    /// Allocate a message hook id.
    pub(crate) fn next_hook_id(&mut self) -> HookId {
        let id = HookId(self.next_hook);
        self.next_hook += 1;
        id
    }
}
