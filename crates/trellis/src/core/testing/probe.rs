use super::log::MessageLog;
use crate::{
    Context, Layout, Widget,
    error::{Error, Result},
    message::{ChildMessage, CustomMessage, Message, MessageKind, ResizeMessage},
    state::NodeName,
    widget::CloseOutcome,
};

/// A widget that records every hook invocation in a [`MessageLog`].
///
/// Entries are labelled with the message name, so a probe's record is the
/// sequence of messages it actually processed. Disposal is recorded as
/// `"dispose"`.
#[derive(Debug)]
pub struct Probe {
    /// Shared record.
    log: MessageLog,
    /// Reported widget name.
    name: NodeName,
    /// Answer to `close-request`.
    close: CloseOutcome,
    /// Message kind whose hook fails.
    fail: Option<MessageKind>,
}

impl Probe {
    /// Construct a probe recording into `log`.
    pub fn new(log: &MessageLog) -> Self {
        Self::named(log, "probe")
    }

    /// Construct a probe with a specific name.
    pub fn named(log: &MessageLog, name: &str) -> Self {
        Self {
            log: log.clone(),
            name: NodeName::convert(name),
            close: CloseOutcome::Close,
            fail: None,
        }
    }

    /// Refuse `close-request`.
    pub fn keep_on_close(mut self) -> Self {
        self.close = CloseOutcome::Keep;
        self
    }

    /// Make the hook for `kind` return an error after recording.
    pub fn fail_on(mut self, kind: MessageKind) -> Self {
        self.fail = Some(kind);
        self
    }

    /// Record a hook call, failing if configured to.
    fn record(&self, ctx: &dyn Context, kind: MessageKind) -> Result<()> {
        self.log.record(ctx.node_id(), kind.name());
        if self.fail == Some(kind) {
            return Err(Error::Invalid(format!("{} failed on {kind}", self.name)));
        }
        Ok(())
    }
}

impl Widget for Probe {
    fn name(&self) -> NodeName {
        self.name.clone()
    }

    fn on_after_attach(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::AfterAttach)
    }

    fn on_before_detach(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::BeforeDetach)
    }

    fn on_after_show(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::AfterShow)
    }

    fn on_before_hide(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::BeforeHide)
    }

    fn on_resize(&mut self, ctx: &mut dyn Context, _msg: &ResizeMessage) -> Result<()> {
        self.record(ctx, MessageKind::Resize)
    }

    fn on_update_request(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::UpdateRequest)
    }

    fn on_layout_request(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::LayoutRequest)
    }

    fn on_fit_request(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::FitRequest)
    }

    fn on_close_request(&mut self, ctx: &mut dyn Context) -> Result<CloseOutcome> {
        self.record(ctx, MessageKind::CloseRequest)?;
        Ok(self.close)
    }

    fn on_parent_changed(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.record(ctx, MessageKind::ParentChanged)
    }

    fn on_child_added(&mut self, ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        self.record(ctx, MessageKind::ChildAdded)
    }

    fn on_child_removed(&mut self, ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        self.record(ctx, MessageKind::ChildRemoved)
    }

    fn on_child_moved(&mut self, ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        self.record(ctx, MessageKind::ChildMoved)
    }

    fn on_child_shown(&mut self, ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        self.record(ctx, MessageKind::ChildShown)
    }

    fn on_child_hidden(&mut self, ctx: &mut dyn Context, _msg: &ChildMessage) -> Result<()> {
        self.record(ctx, MessageKind::ChildHidden)
    }

    fn on_message(&mut self, ctx: &mut dyn Context, msg: &CustomMessage) -> Result<()> {
        self.log.record(ctx.node_id(), &*msg.name);
        if self.fail == Some(MessageKind::Custom) {
            return Err(Error::Invalid(format!("{} failed on {}", self.name, msg.name)));
        }
        Ok(())
    }

    fn on_dispose(&mut self, ctx: &mut dyn Context) {
        self.log.record(ctx.node_id(), "dispose");
    }
}

/// A layout that records `init` and every message it sees, prefixed with
/// `"layout:"`.
#[derive(Debug, Clone)]
pub struct RecordingLayout {
    /// Shared record.
    log: MessageLog,
}

impl RecordingLayout {
    /// Construct a layout recording into `log`.
    pub fn new(log: &MessageLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Layout for RecordingLayout {
    fn init(&mut self, ctx: &mut dyn Context) -> Result<()> {
        self.log.record(ctx.node_id(), "layout:init");
        Ok(())
    }

    fn process_parent_message(&mut self, ctx: &mut dyn Context, msg: &Message) -> Result<()> {
        self.log.record(ctx.node_id(), format!("layout:{}", msg.name()));
        Ok(())
    }
}
