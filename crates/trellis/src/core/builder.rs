use crate::{
    core::{
        dispatch::{ExceptionHandler, ManualScheduler, Scheduler, log_exception},
        host::Document,
        id::WidgetId,
        world::Core,
    },
    error::Error,
    message::Message,
};

/// Static configuration for a [`Core`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Marker class added to every widget element.
    pub widget_class: String,
    /// Marker class present on elements of hidden widgets.
    pub hidden_class: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            widget_class: "trellis-widget".into(),
            hidden_class: "trellis-mod-hidden".into(),
        }
    }
}

/// Fluent builder for a [`Core`].
pub struct CoreBuilder {
    /// Configuration being assembled.
    config: Config,
    /// Flush request sink.
    scheduler: Option<Box<dyn Scheduler>>,
    /// Hook error sink.
    exception_handler: Option<ExceptionHandler>,
    /// Host document.
    document: Option<Document>,
}

impl Default for CoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            scheduler: None,
            exception_handler: None,
            document: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the scheduler that receives flush requests.
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Set the handler for errors returned by widget and layout hooks.
    pub fn exception_handler(
        mut self,
        handler: impl FnMut(WidgetId, &Message, &Error) + 'static,
    ) -> Self {
        self.exception_handler = Some(Box::new(handler));
        self
    }

    /// Set the widget marker class.
    pub fn widget_class(mut self, class: impl Into<String>) -> Self {
        self.config.widget_class = class.into();
        self
    }

    /// Set the hidden marker class.
    pub fn hidden_class(mut self, class: impl Into<String>) -> Self {
        self.config.hidden_class = class.into();
        self
    }

    /// Use an existing host document.
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Build the core.
    pub fn build(self) -> Core {
        Core::from_parts(
            self.config,
            self.document.unwrap_or_default(),
            self.scheduler
                .unwrap_or_else(|| Box::new(ManualScheduler::new())),
            self.exception_handler
                .unwrap_or_else(|| Box::new(log_exception)),
        )
    }
}
