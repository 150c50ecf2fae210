use std::{cell::RefCell, rc::Rc};

use super::{
    init_tracing,
    log::MessageLog,
    probe::{Probe, RecordingLayout},
};
use crate::{
    Core, ElementId, ManualScheduler, WidgetId,
    error::{Error, Result},
};

/// A core wired for tests: a manual scheduler, a live host element under the
/// document body, a shared [`MessageLog`] and a captured list of hook errors.
pub struct Harness {
    /// The core under test.
    pub core: Core,
    /// Handle on the core's scheduler.
    pub scheduler: ManualScheduler,
    /// A live host element for attaching roots.
    pub host: ElementId,
    /// Record shared by every probe the harness creates.
    pub log: MessageLog,
    /// Errors passed to the exception handler, in order.
    pub errors: Rc<RefCell<Vec<(WidgetId, String, Error)>>>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Construct a harness.
    pub fn new() -> Self {
        init_tracing();
        let scheduler = ManualScheduler::new();
        let errors: Rc<RefCell<Vec<(WidgetId, String, Error)>>> = Rc::default();
        let sink = Rc::clone(&errors);
        let mut core = Core::builder()
            .scheduler(scheduler.clone())
            .exception_handler(move |id, msg, err| {
                sink.borrow_mut().push((id, msg.name().to_string(), err.clone()));
            })
            .build();
        let body = core.document().body();
        let host = core.document_mut().create_element("main");
        core.document_mut().append_child(body, host);
        Self {
            core,
            scheduler,
            host,
            log: MessageLog::new(),
            errors,
        }
    }

    /// Add a probe recording into the harness log.
    pub fn probe(&mut self, name: &str) -> WidgetId {
        self.core.add(Probe::named(&self.log, name)).id()
    }

    /// Add an already configured probe.
    pub fn add_probe(&mut self, probe: Probe) -> WidgetId {
        self.core.add(probe).id()
    }

    /// Give a widget a recording layout sharing the harness log.
    pub fn recording_layout(&mut self, id: WidgetId) -> Result<()> {
        self.core
            .set_layout(id, Box::new(RecordingLayout::new(&self.log)))
    }

    /// Build a parent with children in order, returning `(parent, children)`.
    pub fn tree(&mut self, parent: &str, children: &[&str]) -> Result<(WidgetId, Vec<WidgetId>)> {
        let root = self.probe(parent);
        let mut ids = Vec::with_capacity(children.len());
        for name in children {
            let child = self.probe(name);
            self.core.add_child(root, child)?;
            ids.push(child);
        }
        Ok((root, ids))
    }

    /// Attach a root widget to the harness host.
    pub fn attach(&mut self, id: WidgetId) -> Result<()> {
        self.core.attach(id, self.host)
    }

    /// Labels recorded for one widget.
    pub fn names(&self, id: WidgetId) -> Vec<String> {
        self.log.names_for(id)
    }

    /// Number of errors seen by the exception handler.
    pub fn error_count(&self) -> usize {
        self.errors.borrow().len()
    }
}
